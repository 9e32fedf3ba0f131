//! End-to-end tests for the command-line handlers.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use lyricpad::cli::{run, Cli};
use lyricpad::config::Config;

fn lyricpad(dir: &std::path::Path, args: &[&str]) -> lyricpad::error::Result<String> {
    let mut argv = vec!["lyricpad", "--data-dir", dir.to_str().unwrap()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let config = Config::default().with_data_dir(cli.data_dir.clone());
    let mut out = Vec::new();
    run(cli, &config, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn test_write_clean_and_analyze_a_song() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics_file = dir.path().join("draft.txt");
    std::fs::write(&lyrics_file, "  I see the light  \n\n  I see the light, oh  \n").unwrap();

    lyricpad(dir.path(), &["new", "--title", "Beacon"]).unwrap();
    lyricpad(
        dir.path(),
        &["lyrics", "beacon", "--file", lyrics_file.to_str().unwrap()],
    )
    .unwrap();
    lyricpad(dir.path(), &["clean", "beacon", "trim-whitespace"]).unwrap();
    lyricpad(dir.path(), &["clean", "beacon", "remove-empty-lines"]).unwrap();

    let shown = lyricpad(dir.path(), &["show", "Beacon"]).unwrap();
    assert_eq!(shown, "# Beacon [Verse 1]\nI see the light\nI see the light, oh\n");

    let report = lyricpad(dir.path(), &["analyze", "Beacon", "--json"]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(json["wordCount"], 9);
    assert_eq!(json["lineCount"], 2);
    assert_eq!(json["repeatedPhrases"][0]["phrase"], "i see the");
    assert_eq!(json["repeatedPhrases"][0]["count"], 2);
    assert_eq!(json["tone"]["positive"], 2);
}

#[test]
fn test_versions_branch_and_list() {
    let dir = tempfile::tempdir().unwrap();
    lyricpad(dir.path(), &["new", "--title", "Fork"]).unwrap();
    lyricpad(dir.path(), &["version", "add", "Fork"]).unwrap();
    lyricpad(dir.path(), &["version", "rename", "Fork", "Version 2", "Acoustic"]).unwrap();

    let listing = lyricpad(dir.path(), &["version", "list", "Fork"]).unwrap();
    let lines: Vec<_> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("  ") && lines[0].contains("Verse 1"));
    assert!(lines[1].starts_with("* ") && lines[1].contains("Acoustic"));

    let err = lyricpad(dir.path(), &["version", "rename", "Fork", "Acoustic", "   "]).unwrap_err();
    assert!(matches!(err, lyricpad::error::Error::InvalidArgument(_)));
}

#[test]
fn test_delete_song_and_list() {
    let dir = tempfile::tempdir().unwrap();
    lyricpad(dir.path(), &["new", "--title", "Keep"]).unwrap();
    lyricpad(dir.path(), &["new", "--title", "Drop"]).unwrap();
    lyricpad(dir.path(), &["delete", "Drop"]).unwrap();

    let listing = lyricpad(dir.path(), &["list"]).unwrap();
    assert!(listing.contains("Keep"));
    assert!(!listing.contains("Drop"));
}
