//! Application constants.
//!
//! Centralizes default names, storage keys and analyzer tuning values.

/// Library defaults and persistence keys.
pub mod library {
    /// Storage key the whole library snapshot lives under.
    pub const STORAGE_KEY: &str = "lyric-pad-songs";

    /// Title given to freshly created songs.
    pub const DEFAULT_SONG_TITLE: &str = "New Song";

    /// Name of the version every new song starts with.
    pub const FIRST_VERSION_NAME: &str = "Verse 1";

    /// Prefix for versions added after the first; followed by the new count.
    pub const VERSION_NAME_PREFIX: &str = "Version";

    /// Name of the data directory under the platform data dir.
    pub const APP_DIR_NAME: &str = "lyricpad";
}

/// Lyric analyzer tuning.
pub mod analysis {
    /// Number of tokens in a repeated-phrase window.
    pub const PHRASE_LENGTH: usize = 3;

    /// Maximum number of repeated phrases reported.
    pub const MAX_REPEATED_PHRASES: usize = 5;

    /// Keywords counted as positive tone.
    pub const POSITIVE_WORDS: &[&str] = &[
        "love", "happy", "joy", "beautiful", "sun", "light", "hope", "dream", "good", "great",
    ];

    /// Keywords counted as negative tone.
    pub const NEGATIVE_WORDS: &[&str] = &[
        "hate", "sad", "pain", "dark", "lost", "fear", "bad", "cry", "storm", "end",
    ];
}

/// Song lookup by title.
pub mod search {
    /// Minimum fuzzy score for a title query to match a song.
    pub const MIN_TITLE_SCORE: i64 = 50;
}

/// Terminal output.
pub mod output {
    /// Width of the line-length bars drawn by `analyze`.
    pub const BAR_WIDTH: usize = 40;
}
