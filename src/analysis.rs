//! Lyric statistics.
//!
//! [`analyze`] is a pure function from lyric text to an [`AnalysisReport`]:
//! word, line and character counts, the most repeated three-word phrases,
//! per-line lengths, and a keyword tone tally.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::analysis::{
    MAX_REPEATED_PHRASES, NEGATIVE_WORDS, PHRASE_LENGTH, POSITIVE_WORDS,
};

/// Regex matching a maximal run of word characters.
#[allow(clippy::expect_used)]
static RE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+").expect("valid regex: RE_WORD")
});

/// A phrase that occurs more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatedPhrase {
    /// Lower-cased tokens joined by single spaces.
    pub phrase: String,
    /// Number of occurrences.
    pub count: usize,
}

/// Raw keyword match counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    /// Tokens found in the positive keyword list.
    pub positive: usize,
    /// Tokens found in the negative keyword list.
    pub negative: usize,
}

/// Which way a [`Tone`] tally leans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneLean {
    /// More positive than negative matches.
    Positive,
    /// More negative than positive matches.
    Negative,
    /// Equal counts, including none at all.
    Neutral,
}

impl ToneLean {
    /// Returns the human-readable label.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        }
    }
}

impl Tone {
    /// Which count is larger.
    pub const fn dominant(&self) -> ToneLean {
        if self.positive > self.negative {
            ToneLean::Positive
        } else if self.negative > self.positive {
            ToneLean::Negative
        } else {
            ToneLean::Neutral
        }
    }
}

/// Statistics for one lyric text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Number of word tokens.
    pub word_count: usize,
    /// Number of lines with non-whitespace content.
    pub line_count: usize,
    /// Number of distinct (lower-cased) tokens.
    pub unique_words: usize,
    /// Length of the whole input in characters.
    pub character_count: usize,
    /// Up to five three-word phrases seen more than once, most frequent first.
    pub repeated_phrases: Vec<RepeatedPhrase>,
    /// Character length of each non-blank line, untrimmed, in order.
    pub line_lengths: Vec<usize>,
    /// Keyword tone tally.
    pub tone: Tone,
}

impl AnalysisReport {
    /// Length of the longest counted line, or 0 when there are none.
    pub fn longest_line(&self) -> usize {
        self.line_lengths.iter().copied().max().unwrap_or(0)
    }

    /// True if the analyzed text had no content.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Lower-case `text` and split it into maximal runs of word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    RE_WORD
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Count sliding three-token windows and keep those seen more than once.
///
/// Sorted by count descending; equal counts keep first-occurrence order.
pub fn repeated_phrases(words: &[String]) -> Vec<RepeatedPhrase> {
    if words.len() < PHRASE_LENGTH {
        return Vec::new();
    }

    // phrase -> (count, index of first occurrence)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (idx, window) in words.windows(PHRASE_LENGTH).enumerate() {
        counts.entry(window.join(" ")).or_insert((0, idx)).0 += 1;
    }

    let mut repeated: Vec<(String, usize, usize)> = counts
        .into_iter()
        .filter(|(_, (count, _))| *count > 1)
        .map(|(phrase, (count, first))| (phrase, count, first))
        .collect();
    repeated.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    repeated
        .into_iter()
        .take(MAX_REPEATED_PHRASES)
        .map(|(phrase, count, _)| RepeatedPhrase { phrase, count })
        .collect()
}

/// Count tokens that appear in the positive and negative keyword lists.
pub fn tone(words: &[String]) -> Tone {
    words.iter().fold(Tone::default(), |mut acc, word| {
        if POSITIVE_WORDS.contains(&word.as_str()) {
            acc.positive += 1;
        }
        if NEGATIVE_WORDS.contains(&word.as_str()) {
            acc.negative += 1;
        }
        acc
    })
}

/// Analyze lyric text. Blank input yields an all-zero report.
pub fn analyze(lyrics: &str) -> AnalysisReport {
    if lyrics.trim().is_empty() {
        return AnalysisReport::default();
    }

    let words = tokenize(lyrics);
    let line_lengths: Vec<usize> = lyrics
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().count())
        .collect();
    let unique_words = words.iter().collect::<HashSet<_>>().len();

    AnalysisReport {
        word_count: words.len(),
        line_count: line_lengths.len(),
        unique_words,
        character_count: lyrics.chars().count(),
        repeated_phrases: repeated_phrases(&words),
        line_lengths,
        tone: tone(&words),
    }
}
