//! Application configuration.
//!
//! Handles loading configuration from environment variables and .env files.

use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

use crate::constants::library::{APP_DIR_NAME, STORAGE_KEY};
use crate::error::{Error, Result};

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The application name
    app_name: String,
    /// The application version
    app_version: String,
    /// Directory holding the library snapshot
    pub data_dir: PathBuf,
    /// Storage key (file stem) the library is saved under
    pub storage_key: String,
}

impl Config {
    /// Get the application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Get the application version.
    #[must_use]
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Override the data directory (e.g. from a command-line flag).
    #[must_use]
    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.data_dir = expand_path(&dir.to_string_lossy());
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: default_data_dir(),
            storage_key: STORAGE_KEY.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        dotenv().ok();

        let mut config = Self::default();

        if let Ok(dir) = env::var("LYRICPAD_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = expand_path(&dir);
            }
        }

        if let Ok(key) = env::var("LYRICPAD_STORAGE_KEY") {
            config.storage_key = validate_storage_key(&key)?;
        }

        Ok(config)
    }
}

/// Platform data directory for the app, or a dot-directory in the working
/// directory when the platform has none.
fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(format!(".{APP_DIR_NAME}")),
        |d| d.join(APP_DIR_NAME),
    )
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).to_string())
}

/// Storage keys become file names, so keep them to a safe character set.
fn validate_storage_key(key: &str) -> Result<String> {
    let key = key.trim();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !key.starts_with('.');
    if valid {
        Ok(key.to_string())
    } else {
        Err(Error::config(
            format!("invalid LYRICPAD_STORAGE_KEY {key:?}"),
            "Use letters, digits, '-', '_' or '.', not starting with '.'",
        ))
    }
}
