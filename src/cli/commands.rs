//! Command handlers.
//!
//! Each invocation opens the library, runs one command against it and makes
//! sure the result reached disk before returning.

use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};

use super::{Cli, Command, VersionCommand};
use crate::analysis::{analyze, AnalysisReport};
use crate::cleaner::CleanAction;
use crate::config::Config;
use crate::constants::output::BAR_WIDTH;
use crate::error::{Error, Result};
use crate::library::storage::{FileStorage, Storage};
use crate::library::store::LibraryStore;
use crate::library::{Selection, Song, Version};
use crate::types::{SongId, VersionId};

/// Open the configured library and run `cli.command`.
pub fn run<W: Write>(cli: Cli, config: &Config, out: &mut W) -> Result<()> {
    let storage = FileStorage::new(&config.data_dir);
    tracing::debug!("Using library file {}", storage.path_for(&config.storage_key).display());
    let mut store = LibraryStore::open(storage, config.storage_key.clone());
    execute(&mut store, cli.command, out)?;
    store.flush()
}

/// Run one command against an open store.
pub fn execute<S: Storage, W: Write>(
    store: &mut LibraryStore<S>,
    command: Command,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::New { title } => {
            let selection = match title {
                Some(title) => store.create_titled_song(&title)?,
                None => store.create_song(),
            };
            let (song_id, _) = selected_ids(&selection)?;
            writeln!(out, "{song_id}")?;
        }
        Command::List => list_songs(store, out)?,
        Command::Show { song, version } => {
            let selection = target(store, &song, version.as_deref())?;
            let (song, version) = resolved(store, &selection)?;
            writeln!(out, "# {} [{}]", song.title(), version.name())?;
            writeln!(out, "{}", version.lyrics())?;
        }
        Command::Rename { song, title } => {
            let id = store.library().find_song(&song)?.id().clone();
            store.rename_song(&id, &title)?;
        }
        Command::Delete { song } => {
            let id = store.library().find_song(&song)?.id().clone();
            store.delete_song(&id, &Selection::none())?;
            writeln!(out, "Deleted {id}")?;
        }
        Command::Lyrics { song, version, file } => {
            let selection = target(store, &song, version.as_deref())?;
            let text = read_lyrics_input(file.as_deref())?;
            let (song_id, version_id) = selected_ids(&selection)?;
            store.set_lyrics(&song_id, &version_id, text)?;
        }
        Command::Version(cmd) => version_command(store, cmd, out)?,
        Command::Analyze { song, version, json } => {
            let selection = target(store, &song, version.as_deref())?;
            let (_, version) = resolved(store, &selection)?;
            let report = analyze(version.lyrics());
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                render_report(&report, out)?;
            }
        }
        Command::Clean { song, action, version } => {
            let selection = target(store, &song, version.as_deref())?;
            clean(store, &selection, action, out)?;
        }
        Command::Watch { song, interval_ms, polls } => watch(store, &song, interval_ms, polls, out)?,
    }
    Ok(())
}

fn version_command<S: Storage, W: Write>(
    store: &mut LibraryStore<S>,
    command: VersionCommand,
    out: &mut W,
) -> Result<()> {
    match command {
        VersionCommand::List { song } => {
            let song = store.library().find_song(&song)?;
            let latest = song.latest_version().map(Version::id);
            for version in song.versions() {
                let marker = if Some(version.id()) == latest { "*" } else { " " };
                writeln!(
                    out,
                    "{marker} {}  {}  ({})",
                    version.id(),
                    version.name(),
                    format_stamp(version.created_at())
                )?;
            }
        }
        VersionCommand::Add { song, from } => {
            let selection = target(store, &song, from.as_deref())?;
            let (song_id, _) = selected_ids(&selection)?;
            let added = store.add_version(&song_id, &selection)?;
            let (_, version) = resolved(store, &added)?;
            writeln!(out, "{}  {}", version.id(), version.name())?;
        }
        VersionCommand::Rename { song, version, name } => {
            let selection = target(store, &song, Some(&version))?;
            let (song_id, version_id) = selected_ids(&selection)?;
            store.rename_version(&song_id, &version_id, &name)?;
        }
        VersionCommand::Delete { song, version } => {
            let selection = target(store, &song, Some(&version))?;
            let (song_id, version_id) = selected_ids(&selection)?;
            let next = store.delete_version(&song_id, &version_id, &selection)?;
            let (_, now_active) = resolved(store, &next)?;
            writeln!(out, "Deleted {version_id}; now on {}", now_active.name())?;
        }
    }
    Ok(())
}

fn list_songs<S: Storage, W: Write>(store: &LibraryStore<S>, out: &mut W) -> Result<()> {
    let songs = store.library().songs_by_recent();
    if songs.is_empty() {
        writeln!(out, "No songs yet. Create one with `lyricpad new`.")?;
        return Ok(());
    }
    for song in songs {
        writeln!(
            out,
            "{}  {}  ({} version(s), updated {})",
            song.id(),
            song.title(),
            song.versions().len(),
            format_stamp(song.updated_at())
        )?;
    }
    Ok(())
}

fn clean<S: Storage, W: Write>(
    store: &mut LibraryStore<S>,
    selection: &Selection,
    action: CleanAction,
    out: &mut W,
) -> Result<()> {
    let (song, version) = resolved(store, selection)?;
    let cleaned = action.apply(version.lyrics());
    if cleaned == version.lyrics() {
        writeln!(out, "{}: nothing to change", action.name())?;
        return Ok(());
    }
    let (song_id, version_id) = (song.id().clone(), version.id().clone());
    store.set_lyrics(&song_id, &version_id, cleaned)?;
    writeln!(out, "{}: applied", action.name())?;
    Ok(())
}

fn watch<S: Storage, W: Write>(
    store: &mut LibraryStore<S>,
    song: &str,
    interval_ms: u64,
    max_polls: Option<u64>,
    out: &mut W,
) -> Result<()> {
    let song_id = store.library().find_song(song)?.id().clone();
    let interval = Duration::from_millis(interval_ms.max(50));
    let mut last: Option<AnalysisReport> = None;
    let mut polls = 0_u64;
    loop {
        store.reload_if_changed();
        let selection = Selection::song(song_id.clone());
        let Some((_, version)) = store.library().resolve(&selection) else {
            writeln!(out, "Song {song_id} was deleted")?;
            return Ok(());
        };
        let report = analyze(version.lyrics());
        if last.as_ref() != Some(&report) {
            writeln!(out, "--- {} ---", version.name())?;
            render_report(&report, out)?;
            out.flush()?;
            last = Some(report);
        }
        polls += 1;
        if max_polls.is_some_and(|max| polls >= max) {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

/// Resolve song/version arguments to a concrete selection.
fn target<S: Storage>(
    store: &LibraryStore<S>,
    song: &str,
    version: Option<&str>,
) -> Result<Selection> {
    let song = store.library().find_song(song)?;
    match version {
        Some(query) => store.select_version(song.id(), song.find_version(query)?.id()),
        None => store.select_song(song.id()),
    }
}

fn resolved<'a, S: Storage>(
    store: &'a LibraryStore<S>,
    selection: &Selection,
) -> Result<(&'a Song, &'a Version)> {
    store.library().resolve(selection).ok_or_else(|| {
        Error::song_not_found(selection.song_id.as_ref().map_or("<none>", SongId::as_str))
    })
}

fn selected_ids(selection: &Selection) -> Result<(SongId, VersionId)> {
    match (&selection.song_id, &selection.version_id) {
        (Some(song), Some(version)) => Ok((song.clone(), version.clone())),
        _ => Err(Error::Msg("no version selected".to_string())),
    }
}

fn read_lyrics_input(file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        return fs_err::read_to_string(path).map_err(|e| Error::io(e, path.to_path_buf()));
    }
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

fn format_stamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Write a plain-text report with proportional line-length bars.
pub fn render_report<W: Write>(report: &AnalysisReport, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "Words: {}  Lines: {}  Unique: {}  Characters: {}",
        report.word_count, report.line_count, report.unique_words, report.character_count
    )?;
    writeln!(
        out,
        "Tone: {} ({} positive, {} negative)",
        report.tone.dominant().name(),
        report.tone.positive,
        report.tone.negative
    )?;

    writeln!(out, "\nRepeated phrases (3 words):")?;
    if report.repeated_phrases.is_empty() {
        writeln!(out, "  none")?;
    }
    for phrase in &report.repeated_phrases {
        writeln!(out, "  \"{}\" x{}", phrase.phrase, phrase.count)?;
    }

    writeln!(out, "\nLine lengths:")?;
    if report.line_lengths.is_empty() {
        writeln!(out, "  none")?;
    }
    let longest = report.longest_line().max(1);
    for (idx, len) in report.line_lengths.iter().enumerate() {
        let bar = "#".repeat(len * BAR_WIDTH / longest);
        writeln!(out, "{:>4} {bar:<BAR_WIDTH$} {len}", idx + 1)?;
    }
    Ok(())
}
