//! Resolve user-typed references to songs and versions.
//!
//! A reference is tried as an exact id first, then as a title (or version
//! name), and for songs finally as a fuzzy title match.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use super::{Library, Song, Version};
use crate::constants::search::MIN_TITLE_SCORE;
use crate::error::{Error, Result};
use crate::types::{SongId, VersionId};

impl Library {
    /// Find a song by id or title query.
    pub fn find_song(&self, query: &str) -> Result<&Song> {
        if let Some(song) = self.song(&SongId::new(query)) {
            return Ok(song);
        }

        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() {
            return Err(Error::song_not_found(query));
        }

        // Most recently touched songs win among equally good title matches.
        let songs = self.songs_by_recent();

        if let Some(song) = songs
            .iter()
            .copied()
            .find(|s| s.title().to_lowercase() == query_lower)
        {
            return Ok(song);
        }
        if let Some(song) = songs
            .iter()
            .copied()
            .find(|s| s.title().to_lowercase().contains(&query_lower))
        {
            return Ok(song);
        }

        let matcher = SkimMatcherV2::default();
        songs
            .into_iter()
            .filter_map(|song| {
                let score = matcher.fuzzy_match(&song.title().to_lowercase(), &query_lower)?;
                (score >= MIN_TITLE_SCORE).then_some((score, song))
            })
            // max_by_key keeps the last maximum; reverse so the most recent song wins ties
            .rev()
            .max_by_key(|(score, _)| *score)
            .map(|(_, song)| song)
            .ok_or_else(|| Error::song_not_found(query))
    }
}

impl Song {
    /// Find a version by id, or by name ignoring case.
    pub fn find_version(&self, query: &str) -> Result<&Version> {
        if let Some(version) = self.version(&VersionId::new(query)) {
            return Ok(version);
        }
        let wanted = query.trim().to_lowercase();
        self.versions()
            .iter()
            .find(|v| v.name().to_lowercase() == wanted)
            .ok_or_else(|| Error::version_not_found(query))
    }
}
