//! Command-line interface definitions.
//!
//! Song arguments accept an id or a title; version arguments accept an id or
//! a version name. See [`crate::library::lookup`].

pub mod commands;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::cleaner::CleanAction;

pub use commands::{execute, run};

/// Lyric notebook: songs, versions, cleanup and analysis.
#[derive(Debug, Parser)]
#[command(name = "lyricpad", version, about)]
pub struct Cli {
    /// Directory holding the library file (overrides LYRICPAD_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new song with an empty first verse
    New {
        /// Title to give the song instead of "New Song"
        #[arg(long)]
        title: Option<String>,
    },

    /// List songs, most recently edited first
    List,

    /// Print a version's lyrics
    Show {
        /// Song id or title
        song: String,
        /// Version id or name (defaults to the newest version)
        #[arg(long)]
        version: Option<String>,
    },

    /// Rename a song
    Rename {
        /// Song id or title
        song: String,
        /// New title
        title: String,
    },

    /// Delete a song and all its versions
    Delete {
        /// Song id or title
        song: String,
    },

    /// Replace a version's lyrics with the contents of a file or stdin
    Lyrics {
        /// Song id or title
        song: String,
        /// Version id or name (defaults to the newest version)
        #[arg(long)]
        version: Option<String>,
        /// Read lyrics from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Manage a song's versions
    #[command(subcommand)]
    Version(VersionCommand),

    /// Print word, phrase, line and tone statistics
    Analyze {
        /// Song id or title
        song: String,
        /// Version id or name (defaults to the newest version)
        #[arg(long)]
        version: Option<String>,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a cleanup transform to a version's lyrics
    Clean {
        /// Song id or title
        song: String,
        /// Transform to apply
        #[arg(value_enum)]
        action: CleanAction,
        /// Version id or name (defaults to the newest version)
        #[arg(long)]
        version: Option<String>,
    },

    /// Re-print the analysis whenever the library changes on disk
    Watch {
        /// Song id or title
        song: String,
        /// Polling interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
        /// Stop after this many polls (runs until the song is deleted by default)
        #[arg(long)]
        polls: Option<u64>,
    },
}

/// Version subcommands.
#[derive(Debug, Subcommand)]
pub enum VersionCommand {
    /// List a song's versions
    List {
        /// Song id or title
        song: String,
    },

    /// Branch a new version, copying lyrics from an existing one
    Add {
        /// Song id or title
        song: String,
        /// Version to copy from (defaults to the newest version)
        #[arg(long)]
        from: Option<String>,
    },

    /// Rename a version
    Rename {
        /// Song id or title
        song: String,
        /// Version id or name
        version: String,
        /// New name
        name: String,
    },

    /// Delete a version (a song's last version cannot be deleted)
    Delete {
        /// Song id or title
        song: String,
        /// Version id or name
        version: String,
    },
}
