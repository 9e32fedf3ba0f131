//! The library store: every mutation of songs and versions.
//!
//! Operations either succeed completely or return an error with the library
//! untouched. After each successful mutation the whole library is written to
//! storage. A failed write is logged and leaves the store marked unsaved; the
//! in-memory change stands and [`LibraryStore::flush`] retries it.
//!
//! The store holds no selection of its own. Operations that move the
//! selection take the current [`Selection`] and return the next one.

use chrono::Utc;

use super::storage::Storage;
use super::{non_blank, Library, Selection, Song};
use crate::constants::library::DEFAULT_SONG_TITLE;
use crate::error::{Error, Result};
use crate::types::{SongId, VersionId};

/// Owns the in-memory library and the storage it is persisted to.
#[derive(Debug)]
pub struct LibraryStore<S: Storage> {
    storage: S,
    key: String,
    library: Library,
    last_stamp: i64,
    revision: Option<u64>,
    unsaved: bool,
}

impl<S: Storage> LibraryStore<S> {
    /// Open a store, reading whatever library is stored under `key`.
    ///
    /// Missing or unreadable data yields an empty library.
    pub fn open(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let library = read_library(&storage, &key);
        let revision = storage.revision(&key);
        let last_stamp = library.max_stamp();
        tracing::info!("Opened library '{key}' with {} songs", library.len());
        Self {
            storage,
            key,
            library,
            last_stamp,
            revision,
            unsaved: false,
        }
    }

    /// The current library.
    pub const fn library(&self) -> &Library {
        &self.library
    }

    /// The backing storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the backing storage, bypassing the store.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// True if the last snapshot write failed and has not been retried successfully.
    pub const fn is_unsaved(&self) -> bool {
        self.unsaved
    }

    /// Create "New Song" with a single empty "Verse 1", placed first in
    /// storage order, and select it.
    pub fn create_song(&mut self) -> Selection {
        self.insert_new_song(DEFAULT_SONG_TITLE)
    }

    /// Like [`Self::create_song`], but titled. A blank title is refused
    /// before anything is created.
    pub fn create_titled_song(&mut self, title: &str) -> Result<Selection> {
        let title = non_blank(title, "song title")?;
        Ok(self.insert_new_song(title))
    }

    fn insert_new_song(&mut self, title: &str) -> Selection {
        let stamp = self.next_stamp();
        let id = loop {
            let id = SongId::generate();
            if !self.library.contains(&id) {
                break id;
            }
        };
        let song = Song::new_with_first_version(id, title, stamp);
        let selection = Selection {
            song_id: Some(song.id().clone()),
            version_id: song.versions().first().map(|v| v.id().clone()),
        };
        tracing::debug!("Created song {}", song.id());
        self.library.insert_front(song);
        self.commit();
        selection
    }

    /// Select a song and its most recently created version.
    pub fn select_song(&self, song_id: &SongId) -> Result<Selection> {
        let song = self
            .library
            .song(song_id)
            .ok_or_else(|| Error::song_not_found(song_id))?;
        Ok(Selection {
            song_id: Some(song_id.clone()),
            version_id: song.latest_version().map(|v| v.id().clone()),
        })
    }

    /// Select a specific version of a song.
    pub fn select_version(&self, song_id: &SongId, version_id: &VersionId) -> Result<Selection> {
        let song = self
            .library
            .song(song_id)
            .ok_or_else(|| Error::song_not_found(song_id))?;
        song.version(version_id)
            .ok_or_else(|| Error::version_not_found(version_id))?;
        Ok(Selection::of(song_id.clone(), version_id.clone()))
    }

    /// Change a song's title. Blank titles are refused.
    pub fn rename_song(&mut self, song_id: &SongId, title: &str) -> Result<()> {
        self.mutate_song(song_id, |song, stamp| song.rename(title, stamp))
    }

    /// Remove a song and all its versions, clearing the selection if it pointed there.
    pub fn delete_song(&mut self, song_id: &SongId, selection: &Selection) -> Result<Selection> {
        let removed = self.library.remove(song_id)?;
        tracing::debug!("Deleted song {} ({} versions)", removed.id(), removed.versions().len());
        self.commit();
        if selection.is_song(song_id) {
            Ok(Selection::none())
        } else {
            Ok(selection.clone())
        }
    }

    /// Replace a version's lyrics verbatim.
    pub fn set_lyrics(
        &mut self,
        song_id: &SongId,
        version_id: &VersionId,
        text: impl Into<String>,
    ) -> Result<()> {
        let text = text.into();
        self.mutate_song(song_id, |song, stamp| song.set_lyrics(version_id, text, stamp))
    }

    /// Branch a new version from the active one and select it.
    ///
    /// The lyrics are copied from the version `selection` resolves to when it
    /// points at this song, otherwise from the song's latest version.
    pub fn add_version(&mut self, song_id: &SongId, selection: &Selection) -> Result<Selection> {
        let seed = selection
            .is_song(song_id)
            .then(|| selection.version_id.clone())
            .flatten();
        let version_id =
            self.mutate_song(song_id, |song, stamp| Ok(song.add_version(seed.as_ref(), stamp)))?;
        Ok(Selection::of(song_id.clone(), version_id))
    }

    /// Change a version's name. Blank names are refused.
    pub fn rename_version(
        &mut self,
        song_id: &SongId,
        version_id: &VersionId,
        name: &str,
    ) -> Result<()> {
        self.mutate_song(song_id, |song, stamp| song.rename_version(version_id, name, stamp))
    }

    /// Remove a version. Refused if it is the song's only version.
    ///
    /// If the removed version was the selected one, selection moves to the
    /// first remaining version in list order.
    pub fn delete_version(
        &mut self,
        song_id: &SongId,
        version_id: &VersionId,
        selection: &Selection,
    ) -> Result<Selection> {
        let first_left =
            self.mutate_song(song_id, |song, stamp| song.delete_version(version_id, stamp))?;
        let was_active =
            selection.is_song(song_id) && selection.version_id.as_ref() == Some(version_id);
        if was_active {
            Ok(Selection::of(song_id.clone(), first_left))
        } else {
            Ok(selection.clone())
        }
    }

    /// Write the library again if a previous write failed.
    pub fn flush(&mut self) -> Result<()> {
        if self.unsaved {
            self.write_snapshot()?;
            self.unsaved = false;
        }
        Ok(())
    }

    /// Replace the in-memory library with what storage holds now.
    ///
    /// Last writer wins: unsaved local changes are discarded.
    pub fn reload(&mut self) {
        self.library = read_library(&self.storage, &self.key);
        self.revision = self.storage.revision(&self.key);
        self.last_stamp = self.last_stamp.max(self.library.max_stamp());
        self.unsaved = false;
        tracing::info!("Reloaded library '{}' with {} songs", self.key, self.library.len());
    }

    /// Reload if storage was written by someone else since we last read or wrote it.
    pub fn reload_if_changed(&mut self) -> bool {
        if self.storage.revision(&self.key) == self.revision {
            return false;
        }
        self.reload();
        true
    }

    fn mutate_song<T>(
        &mut self,
        song_id: &SongId,
        f: impl FnOnce(&mut Song, i64) -> Result<T>,
    ) -> Result<T> {
        let stamp = self.candidate_stamp();
        let song = self.library.song_mut(song_id)?;
        let out = f(song, stamp)?;
        self.last_stamp = stamp;
        tracing::debug!("Updated song {song_id}");
        self.commit();
        Ok(out)
    }

    /// Epoch milliseconds, forced strictly past every stamp already handed out.
    fn candidate_stamp(&self) -> i64 {
        Utc::now().timestamp_millis().max(self.last_stamp.saturating_add(1))
    }

    fn next_stamp(&mut self) -> i64 {
        self.last_stamp = self.candidate_stamp();
        self.last_stamp
    }

    fn commit(&mut self) {
        match self.write_snapshot() {
            Ok(()) => self.unsaved = false,
            Err(e) => {
                tracing::warn!("Failed to save library '{}': {e}", self.key);
                self.unsaved = true;
            }
        }
    }

    fn write_snapshot(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.library)?;
        self.storage.put(&self.key, &json)?;
        self.revision = self.storage.revision(&self.key);
        Ok(())
    }
}

fn read_library<S: Storage>(storage: &S, key: &str) -> Library {
    let text = match storage.get(key) {
        Ok(Some(text)) => text,
        Ok(None) => return Library::new(),
        Err(e) => {
            tracing::warn!("Failed to read library '{key}', starting empty: {e}");
            return Library::new();
        }
    };

    let mut library = match serde_json::from_str::<Library>(&text) {
        Ok(library) => library,
        Err(e) => {
            let err = Error::parse(key, e.to_string());
            tracing::warn!("Stored library is not valid, starting empty: {err}");
            return Library::new();
        }
    };

    let repaired = library.repair();
    if repaired > 0 {
        tracing::warn!("Repaired {repaired} malformed songs in library '{key}'");
    }
    library
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::constants::library::{FIRST_VERSION_NAME, STORAGE_KEY};
    use crate::library::storage::MemoryStorage;
    use crate::library::Version;

    fn store() -> LibraryStore<MemoryStorage> {
        LibraryStore::open(MemoryStorage::new(), STORAGE_KEY)
    }

    fn ids(selection: &Selection) -> (SongId, VersionId) {
        (
            selection.song_id.clone().unwrap(),
            selection.version_id.clone().unwrap(),
        )
    }

    fn stored(store: &LibraryStore<MemoryStorage>) -> Library {
        serde_json::from_str(store.storage().raw(STORAGE_KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_create_song_defaults() {
        let mut store = store();
        let sel = store.create_song();
        let (song_id, version_id) = ids(&sel);

        let song = store.library().song(&song_id).unwrap();
        assert_eq!(song.title(), "New Song");
        assert_eq!(song.versions().len(), 1);
        assert_eq!(song.versions()[0].id(), &version_id);
        assert_eq!(song.versions()[0].name(), FIRST_VERSION_NAME);
        assert_eq!(song.versions()[0].lyrics(), "");
        assert_eq!(&stored(&store), store.library());
    }

    #[test]
    fn test_create_titled_song() {
        let mut store = store();
        let (song_id, _) = ids(&store.create_titled_song("  Night Drive ").unwrap());
        assert_eq!(store.library().song(&song_id).unwrap().title(), "Night Drive");
        assert_eq!(&stored(&store), store.library());
    }

    #[test]
    fn test_create_titled_song_blank_creates_nothing() {
        let mut store = store();
        let err = store.create_titled_song("   ").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(store.library().is_empty());
        assert!(store.storage().raw(STORAGE_KEY).is_none());
    }

    #[test]
    fn test_stamps_at_max_do_not_overflow() {
        let versions = vec![Version::new(VersionId::new("v"), "Verse 1", "", i64::MAX)];
        let song = Song::from_parts(SongId::new("s"), "S", versions, i64::MAX).unwrap();
        let json = serde_json::to_string(&Library::from_songs(vec![song]).unwrap()).unwrap();
        let mut store = LibraryStore::open(MemoryStorage::new().with_value(STORAGE_KEY, json), STORAGE_KEY);
        let song_id = SongId::new("s");

        store.rename_song(&song_id, "Still Here").unwrap();
        store.add_version(&song_id, &Selection::none()).unwrap();

        let song = store.library().song(&song_id).unwrap();
        assert_eq!(song.title(), "Still Here");
        assert_eq!(song.versions().len(), 2);
        assert_eq!(song.updated_at(), i64::MAX);
    }

    #[test]
    fn test_create_song_inserts_at_front() {
        let mut store = store();
        let first = store.create_song();
        let second = store.create_song();

        let songs = store.library().songs();
        assert_eq!(Some(songs[0].id()), second.song_id.as_ref());
        assert_eq!(Some(songs[1].id()), first.song_id.as_ref());
    }

    #[test]
    fn test_select_song_picks_latest_version() {
        let versions = vec![
            Version::new(VersionId::new("a"), "A", "", 100),
            Version::new(VersionId::new("b"), "B", "", 300),
            Version::new(VersionId::new("c"), "C", "", 200),
        ];
        let song = Song::from_parts(SongId::new("s"), "S", versions, 300).unwrap();
        let json = serde_json::to_string(&Library::from_songs(vec![song]).unwrap()).unwrap();
        let store = LibraryStore::open(MemoryStorage::new().with_value(STORAGE_KEY, json), STORAGE_KEY);

        let sel = store.select_song(&SongId::new("s")).unwrap();
        assert_eq!(sel.version_id, Some(VersionId::new("b")));
        let again = store.select_song(&SongId::new("s")).unwrap();
        assert_eq!(again, sel);
    }

    #[test]
    fn test_select_missing_song_is_not_found() {
        let store = store();
        let err = store.select_song(&SongId::new("nope")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_rename_song_trims_and_touches() {
        let mut store = store();
        let (song_id, _) = ids(&store.create_song());
        let before = store.library().song(&song_id).unwrap().updated_at();

        store.rename_song(&song_id, "  Midnight Train  ").unwrap();

        let song = store.library().song(&song_id).unwrap();
        assert_eq!(song.title(), "Midnight Train");
        assert!(song.updated_at() > before);
    }

    #[test]
    fn test_blank_renames_change_nothing() {
        let mut store = store();
        let (song_id, version_id) = ids(&store.create_song());
        let snapshot = store.library().clone();

        let err = store.rename_song(&song_id, "   ").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = store.rename_version(&song_id, &version_id, "\t\n").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        assert_eq!(store.library(), &snapshot);
    }

    #[test]
    fn test_rename_missing_ids() {
        let mut store = store();
        let (song_id, _) = ids(&store.create_song());

        assert!(store.rename_song(&SongId::new("x"), "T").unwrap_err().is_not_found());
        assert!(store
            .rename_version(&song_id, &VersionId::new("x"), "")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_delete_song_clears_active_selection() {
        let mut store = store();
        let other = store.create_song();
        let active = store.create_song();
        let (active_song, _) = ids(&active);

        let after = store.delete_song(&active_song, &active).unwrap();
        assert_eq!(after, Selection::none());
        assert!(!store.library().contains(&active_song));

        let (other_song, _) = ids(&other);
        let kept = store.delete_song(&other_song, &Selection::none()).unwrap();
        assert_eq!(kept, Selection::none());
        assert!(store.library().is_empty());
        assert!(stored(&store).is_empty());
    }

    #[test]
    fn test_delete_inactive_song_keeps_selection() {
        let mut store = store();
        let other = store.create_song();
        let active = store.create_song();
        let (other_song, _) = ids(&other);

        let after = store.delete_song(&other_song, &active).unwrap();
        assert_eq!(after, active);
    }

    #[test]
    fn test_set_lyrics_verbatim() {
        let mut store = store();
        let (song_id, version_id) = ids(&store.create_song());
        let text = "  first line \n\n second line\t";

        store.set_lyrics(&song_id, &version_id, text).unwrap();

        let song = store.library().song(&song_id).unwrap();
        assert_eq!(song.version(&version_id).unwrap().lyrics(), text);
        assert!(store.set_lyrics(&song_id, &VersionId::new("x"), "a").unwrap_err().is_not_found());
        assert!(store.set_lyrics(&SongId::new("x"), &version_id, "a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_add_version_copies_active_lyrics() {
        let mut store = store();
        let sel = store.create_song();
        let (song_id, v1) = ids(&sel);
        store.set_lyrics(&song_id, &v1, "hold the line").unwrap();

        let sel2 = store.add_version(&song_id, &sel).unwrap();
        let (_, v2) = ids(&sel2);
        store.set_lyrics(&song_id, &v2, "changed").unwrap();

        // Branch from the first version while the second is newer.
        let from_v1 = Selection::of(song_id.clone(), v1);
        let sel3 = store.add_version(&song_id, &from_v1).unwrap();
        let (_, v3) = ids(&sel3);

        let song = store.library().song(&song_id).unwrap();
        let names: Vec<_> = song.versions().iter().map(Version::name).collect();
        assert_eq!(names, vec!["Verse 1", "Version 2", "Version 3"]);
        assert_eq!(song.version(&v3).unwrap().lyrics(), "hold the line");
        assert!(song.version(&v3).unwrap().created_at() > song.version(&v2).unwrap().created_at());
    }

    #[test]
    fn test_add_version_with_foreign_selection_uses_latest() {
        let mut store = store();
        let first = store.create_song();
        let (song_id, v1) = ids(&first);
        store.set_lyrics(&song_id, &v1, "only draft").unwrap();
        let elsewhere = store.create_song();

        let sel = store.add_version(&song_id, &elsewhere).unwrap();
        let (_, new_id) = ids(&sel);
        let song = store.library().song(&song_id).unwrap();
        assert_eq!(song.version(&new_id).unwrap().lyrics(), "only draft");
        assert!(store.add_version(&SongId::new("x"), &sel).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_only_version_is_refused() {
        let mut store = store();
        let sel = store.create_song();
        let (song_id, version_id) = ids(&sel);
        let snapshot = store.library().clone();

        let err = store.delete_version(&song_id, &version_id, &sel).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(store.library(), &snapshot);
    }

    #[test]
    fn test_delete_active_version_moves_to_first_remaining() {
        let mut store = store();
        let sel = store.create_song();
        let (song_id, v1) = ids(&sel);
        let sel2 = store.add_version(&song_id, &sel).unwrap();
        let sel3 = store.add_version(&song_id, &sel2).unwrap();
        let (_, v3) = ids(&sel3);

        let after = store.delete_version(&song_id, &v3, &sel3).unwrap();
        assert_eq!(after, Selection::of(song_id.clone(), v1));
        assert_eq!(store.library().song(&song_id).unwrap().versions().len(), 2);
    }

    #[test]
    fn test_delete_inactive_version_keeps_selection() {
        let mut store = store();
        let sel = store.create_song();
        let (song_id, v1) = ids(&sel);
        let sel2 = store.add_version(&song_id, &sel).unwrap();

        let after = store.delete_version(&song_id, &v1, &sel2).unwrap();
        assert_eq!(after, sel2);
        assert!(store
            .delete_version(&song_id, &VersionId::new("x"), &after)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_every_mutation_touches_updated_at() {
        let mut store = store();
        let sel = store.create_song();
        let (song_id, v1) = ids(&sel);
        let mut last = store.library().song(&song_id).unwrap().updated_at();
        let mut check = |store: &LibraryStore<MemoryStorage>| {
            let now = store.library().song(&song_id).unwrap().updated_at();
            assert!(now > last);
            last = now;
        };

        store.set_lyrics(&song_id, &v1, "x").unwrap();
        check(&store);
        let sel2 = store.add_version(&song_id, &sel).unwrap();
        check(&store);
        store.rename_version(&song_id, &v1, "Intro").unwrap();
        check(&store);
        store.delete_version(&song_id, &v1, &sel2).unwrap();
        check(&store);
        store.rename_song(&song_id, "Done").unwrap();
        check(&store);
    }

    #[test]
    fn test_corrupt_storage_opens_empty() {
        let storage = MemoryStorage::new().with_value(STORAGE_KEY, "{not json");
        let store = LibraryStore::open(storage, STORAGE_KEY);
        assert!(store.library().is_empty());
    }

    #[test]
    fn test_failed_write_keeps_change_and_flush_retries() {
        let mut store = store();
        let (song_id, _) = ids(&store.create_song());
        store.storage_mut().set_fail_writes(true);

        store.rename_song(&song_id, "Unsaved").unwrap();
        assert!(store.is_unsaved());
        assert_eq!(store.library().song(&song_id).unwrap().title(), "Unsaved");
        assert!(store.flush().is_err());

        store.storage_mut().set_fail_writes(false);
        store.flush().unwrap();
        assert!(!store.is_unsaved());
        assert_eq!(stored(&store).song(&song_id).unwrap().title(), "Unsaved");
    }

    #[test]
    fn test_reload_if_changed_replaces_library() {
        let mut store = store();
        store.create_song();
        assert!(!store.reload_if_changed());

        store.storage_mut().put(STORAGE_KEY, "[]").unwrap();
        assert!(store.reload_if_changed());
        assert!(store.library().is_empty());
        assert!(!store.reload_if_changed());
    }
}
