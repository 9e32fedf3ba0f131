//! Text cleanup transforms applied to a whole lyric.
//!
//! Each action is a stateless `&str -> String` function. Lines are split and
//! re-joined on `\n`.

use std::sync::LazyLock;

use regex::Regex;

/// Regex matching runs of plain spaces.
#[allow(clippy::expect_used)]
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" +").expect("valid regex: RE_SPACES")
});

/// Regex matching the punctuation stripped by `RemovePunctuation`.
#[allow(clippy::expect_used)]
static RE_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.,?!()\[\]{}"']"#).expect("valid regex: RE_PUNCTUATION")
});

/// A cleanup operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CleanAction {
    /// Trim whitespace from both ends of every line.
    TrimWhitespace,
    /// Drop lines that are empty or whitespace-only.
    RemoveEmptyLines,
    /// Replace runs of spaces with a single space.
    CollapseSpaces,
    /// Strip `. , ? ! ( ) [ ] { } " '`.
    RemovePunctuation,
}

impl CleanAction {
    /// Returns all actions in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::TrimWhitespace,
            Self::RemoveEmptyLines,
            Self::CollapseSpaces,
            Self::RemovePunctuation,
        ]
    }

    /// Returns the human-readable name of this action.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TrimWhitespace => "Trim Whitespace",
            Self::RemoveEmptyLines => "Remove Empty Lines",
            Self::CollapseSpaces => "Collapse Spaces",
            Self::RemovePunctuation => "Remove Punctuation",
        }
    }

    /// One-line explanation shown next to the name.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::TrimWhitespace => "Remove space from start/end of each line.",
            Self::RemoveEmptyLines => "Delete all lines that are completely empty.",
            Self::CollapseSpaces => "Replace multiple spaces with a single space.",
            Self::RemovePunctuation => "Removes .,?!()[]{} and quote marks.",
        }
    }

    /// Run the transform.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::TrimWhitespace => text.split('\n').map(str::trim).collect::<Vec<_>>().join("\n"),
            Self::RemoveEmptyLines => text
                .split('\n')
                .filter(|line| !line.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            Self::CollapseSpaces => RE_SPACES.replace_all(text, " ").into_owned(),
            Self::RemovePunctuation => RE_PUNCTUATION.replace_all(text, "").into_owned(),
        }
    }
}
