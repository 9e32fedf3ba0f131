//! `LyricPad` - local-first lyric notebook.
//!
//! Songs hold named versions of their lyrics; the library is kept as one
//! JSON snapshot on disk. Text can be cleaned with simple transforms and
//! analyzed for word counts, repeated phrases, line lengths and tone.

pub mod analysis;
pub mod cleaner;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod library;
pub mod types;
