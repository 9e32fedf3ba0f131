//! Song library data model.
//!
//! A [`Library`] holds songs; each [`Song`] holds one or more [`Version`]s of
//! its lyrics. Which song and version the user is looking at is a separate
//! [`Selection`] value, resolved against the library on demand.
//!
//! Mutation goes through [`store::LibraryStore`], which keeps every song at
//! one version or more and persists the library after each change.

pub mod lookup;
pub mod storage;
pub mod store;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::library::{FIRST_VERSION_NAME, VERSION_NAME_PREFIX};
use crate::error::{Error, Result};
use crate::types::{SongId, VersionId};

/// One draft of a song's lyrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    id: VersionId,
    name: String,
    lyrics: String,
    created_at: i64,
}

impl Version {
    /// Build a version. `created_at` is epoch milliseconds.
    pub fn new(
        id: VersionId,
        name: impl Into<String>,
        lyrics: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            lyrics: lyrics.into(),
            created_at,
        }
    }

    /// Immutable identifier.
    pub const fn id(&self) -> &VersionId {
        &self.id
    }

    /// Display label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lyric text, verbatim.
    pub fn lyrics(&self) -> &str {
        &self.lyrics
    }

    /// Creation stamp; the ordering key for "most recent version".
    pub const fn created_at(&self) -> i64 {
        self.created_at
    }
}

/// A titled collection of lyric versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    id: SongId,
    title: String,
    versions: Vec<Version>,
    updated_at: i64,
}

impl Song {
    /// Assemble a song from existing parts, e.g. when importing.
    ///
    /// Fails if `versions` is empty or repeats a version id.
    pub fn from_parts(
        id: SongId,
        title: impl Into<String>,
        versions: Vec<Version>,
        updated_at: i64,
    ) -> Result<Self> {
        if versions.is_empty() {
            return Err(Error::invalid("a song needs at least one version"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = versions.iter().find(|v| !seen.insert(&v.id)) {
            return Err(Error::invalid(format!("duplicate version id {}", dup.id)));
        }
        Ok(Self {
            id,
            title: title.into(),
            versions,
            updated_at,
        })
    }

    /// Immutable identifier.
    pub const fn id(&self) -> &SongId {
        &self.id
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Versions in insertion order. Never empty.
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Stamp of the last change to the song or any of its versions.
    pub const fn updated_at(&self) -> i64 {
        self.updated_at
    }

    /// Look up a version by id.
    pub fn version(&self, id: &VersionId) -> Option<&Version> {
        self.versions.iter().find(|v| &v.id == id)
    }

    /// The version with the greatest `created_at`; the earliest in list order wins ties.
    pub fn latest_version(&self) -> Option<&Version> {
        self.versions
            .iter()
            .reduce(|best, v| if v.created_at > best.created_at { v } else { best })
    }

    /// Resolve a possibly stale version id, falling back to the latest version.
    pub fn resolve_version(&self, id: Option<&VersionId>) -> Option<&Version> {
        id.and_then(|id| self.version(id))
            .or_else(|| self.latest_version())
    }

    fn version_mut(&mut self, id: &VersionId) -> Result<&mut Version> {
        self.versions
            .iter_mut()
            .find(|v| &v.id == id)
            .ok_or_else(|| Error::version_not_found(id))
    }

    fn fresh_version_id(&self) -> VersionId {
        loop {
            let id = VersionId::generate();
            if self.version(&id).is_none() {
                return id;
            }
        }
    }

    pub(crate) fn new_with_first_version(id: SongId, title: &str, stamp: i64) -> Self {
        let first = Version::new(VersionId::generate(), FIRST_VERSION_NAME, "", stamp);
        Self {
            id,
            title: title.to_string(),
            versions: vec![first],
            updated_at: stamp,
        }
    }

    pub(crate) fn rename(&mut self, title: &str, stamp: i64) -> Result<()> {
        let title = non_blank(title, "song title")?;
        self.title = title.to_string();
        self.updated_at = stamp;
        Ok(())
    }

    pub(crate) fn set_lyrics(&mut self, id: &VersionId, text: String, stamp: i64) -> Result<()> {
        self.version_mut(id)?.lyrics = text;
        self.updated_at = stamp;
        Ok(())
    }

    /// Append a version seeded from `seed` (or the latest version) and return its id.
    pub(crate) fn add_version(&mut self, seed: Option<&VersionId>, stamp: i64) -> VersionId {
        let lyrics = self
            .resolve_version(seed)
            .map(|v| v.lyrics.clone())
            .unwrap_or_default();
        let id = self.fresh_version_id();
        let name = format!("{VERSION_NAME_PREFIX} {}", self.versions.len() + 1);
        self.versions.push(Version::new(id.clone(), name, lyrics, stamp));
        self.updated_at = stamp;
        id
    }

    pub(crate) fn rename_version(&mut self, id: &VersionId, name: &str, stamp: i64) -> Result<()> {
        // Resolve first so a missing id reports NotFound even for a blank name.
        self.version_mut(id)?;
        let name = non_blank(name, "version name")?;
        self.version_mut(id)?.name = name.to_string();
        self.updated_at = stamp;
        Ok(())
    }

    /// Remove a version, returning the id of the first one left.
    pub(crate) fn delete_version(&mut self, id: &VersionId, stamp: i64) -> Result<VersionId> {
        let idx = self
            .versions
            .iter()
            .position(|v| &v.id == id)
            .ok_or_else(|| Error::version_not_found(id))?;
        if self.versions.len() <= 1 {
            return Err(Error::invalid("cannot delete the only version of a song"));
        }
        self.versions.remove(idx);
        self.updated_at = stamp;
        Ok(self.versions[0].id.clone())
    }

    /// Fix structural problems in data read from storage. Returns true if anything changed.
    fn repair(&mut self) -> bool {
        let before = self.versions.len();
        let mut seen = HashSet::new();
        self.versions.retain(|v| seen.insert(v.id.clone()));
        let mut changed = self.versions.len() != before;

        if self.versions.is_empty() {
            self.versions.push(Version::new(
                VersionId::generate(),
                FIRST_VERSION_NAME,
                "",
                self.updated_at,
            ));
            changed = true;
        }
        changed
    }
}

fn non_blank<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid(format!("{what} must not be blank")));
    }
    Ok(trimmed)
}

/// The whole persisted collection of songs, in iteration order (newest insert first).
///
/// Serializes as a bare JSON array of songs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Library {
    songs: Vec<Song>,
}

impl Library {
    /// Create an empty library.
    pub const fn new() -> Self {
        Self { songs: Vec::new() }
    }

    /// Build a library from songs, rejecting duplicate song ids.
    pub fn from_songs(songs: Vec<Song>) -> Result<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = songs.iter().find(|s| !seen.insert(&s.id)) {
            return Err(Error::invalid(format!("duplicate song id {}", dup.id)));
        }
        Ok(Self { songs })
    }

    /// Songs in storage order.
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Songs sorted by `updated_at`, most recently touched first.
    pub fn songs_by_recent(&self) -> Vec<&Song> {
        let mut songs: Vec<&Song> = self.songs.iter().collect();
        songs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        songs
    }

    /// Look up a song by id.
    pub fn song(&self, id: &SongId) -> Option<&Song> {
        self.songs.iter().find(|s| &s.id == id)
    }

    /// Check whether a song id is present.
    pub fn contains(&self, id: &SongId) -> bool {
        self.song(id).is_some()
    }

    /// Get the number of songs.
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Check if the library has no songs.
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Resolve a selection to the song and version it currently denotes.
    ///
    /// A stale or unset version falls back to the song's latest version; an
    /// unset or missing song resolves to nothing.
    pub fn resolve(&self, selection: &Selection) -> Option<(&Song, &Version)> {
        let song = self.song(selection.song_id.as_ref()?)?;
        let version = song.resolve_version(selection.version_id.as_ref())?;
        Some((song, version))
    }

    /// Largest stamp stored anywhere in the library.
    pub fn max_stamp(&self) -> i64 {
        self.songs
            .iter()
            .flat_map(|s| {
                std::iter::once(s.updated_at).chain(s.versions.iter().map(|v| v.created_at))
            })
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn song_mut(&mut self, id: &SongId) -> Result<&mut Song> {
        self.songs
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::song_not_found(id))
    }

    pub(crate) fn insert_front(&mut self, song: Song) {
        self.songs.insert(0, song);
    }

    pub(crate) fn remove(&mut self, id: &SongId) -> Result<Song> {
        let idx = self
            .songs
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| Error::song_not_found(id))?;
        Ok(self.songs.remove(idx))
    }

    /// Drop duplicate song ids and give version-less songs a first version.
    /// Returns the number of songs that were touched.
    pub(crate) fn repair(&mut self) -> usize {
        let before = self.songs.len();
        let mut seen = HashSet::new();
        self.songs.retain(|s| seen.insert(s.id.clone()));
        let dropped = before - self.songs.len();
        let fixed = self.songs.iter_mut().map(Song::repair).filter(|changed| *changed).count();
        dropped + fixed
    }
}

/// Which song and version the user is working on.
///
/// Either id may be stale (pointing at something deleted) or unset; see
/// [`Library::resolve`] for how that is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Active song, if any.
    pub song_id: Option<SongId>,
    /// Active version within the active song, if any.
    pub version_id: Option<VersionId>,
}

impl Selection {
    /// Nothing selected.
    pub const fn none() -> Self {
        Self { song_id: None, version_id: None }
    }

    /// Select a specific song and version.
    pub const fn of(song_id: SongId, version_id: VersionId) -> Self {
        Self {
            song_id: Some(song_id),
            version_id: Some(version_id),
        }
    }

    /// Select a song, letting the version fall back to its latest.
    pub const fn song(song_id: SongId) -> Self {
        Self { song_id: Some(song_id), version_id: None }
    }

    /// True if `id` is the selected song.
    pub fn is_song(&self, id: &SongId) -> bool {
        self.song_id.as_ref() == Some(id)
    }
}
