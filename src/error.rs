//! Application error types.
//!
//! Library operations report recoverable conditions (missing ids, rejected
//! names) through this type; nothing here is fatal to the process.

use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// What kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A song in the library.
    Song,
    /// A version within a song.
    Version,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Song => f.write_str("song"),
            Self::Version => f.write_str("version"),
        }
    }
}

/// Application error types with specific context for actionable debugging
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced song or version id does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Which collection was searched.
        kind: EntityKind,
        /// The id (or query) that failed to resolve.
        id: String,
    },

    /// The request was well-formed but refused (blank name, last version, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error with path context
    #[error("IO error at {path:?}: {source}")]
    Io {
        /// The underlying IO error.
        source: std::io::Error,
        /// File path where the error occurred, if known.
        path: Option<std::path::PathBuf>,
    },

    /// Configuration error with guidance
    #[error("Configuration error: {message}. {hint}")]
    Config {
        /// Description of the configuration problem.
        message: String,
        /// Actionable guidance for fixing the issue.
        hint: &'static str,
    },

    /// Stored snapshot could not be decoded
    #[error("Parse error in stored library '{key}': {message}")]
    Parse {
        /// Storage key of the snapshot.
        key: String,
        /// Description of the parse failure.
        message: String,
    },

    /// Snapshot could not be serialized or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic message error (escape hatch)
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an IO error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<std::path::PathBuf>>) -> Self {
        Self::Io { source, path: path.into() }
    }

    /// Song lookup failed.
    pub fn song_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound { kind: EntityKind::Song, id: id.to_string() }
    }

    /// Version lookup failed.
    pub fn version_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound { kind: EntityKind::Version, id: id.to_string() }
    }

    /// Create an invalid-argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a config error with actionable hint
    pub fn config(message: impl Into<String>, hint: &'static str) -> Self {
        Self::Config { message: message.into(), hint }
    }

    /// Create a parse error for the snapshot stored under `key`
    pub fn parse(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse { key: key.into(), message: message.into() }
    }

    /// True for the recoverable "id does not resolve" condition.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io { source: e, path: None }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(format!("serialization failed: {e}"))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Msg(s)
    }
}
