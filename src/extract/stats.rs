use std::sync::LazyLock;

use regex::Regex;

use crate::model::{round_to, DocumentStats};

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\w\p{No}]+").unwrap());
static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());
static PARAGRAPH_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Maximal runs of Unicode word characters, case preserved. Superscripts
/// and vulgar fractions (`\p{No}`) count as word characters too.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    WORD_RE.find_iter(text).map(|m| m.as_str())
}

/// Lower-cased tokens, the unit of corpus aggregation.
pub fn tokenize_lower(text: &str) -> Vec<String> {
    tokenize(text).map(str::to_lowercase).collect()
}

/// Segments between runs of `.`, `!` and `?`, blank ones dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_END_RE
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn count_paragraphs(text: &str) -> usize {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }
    PARAGRAPH_BREAK_RE
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .count()
}

pub fn char_len(token: &str) -> usize {
    token.chars().count()
}

pub fn compute_stats(text: &str) -> DocumentStats {
    let (word_count, total_len) = tokenize(text).fold((0usize, 0usize), |(n, len), tok| {
        (n + 1, len + char_len(tok))
    });
    let avg_word_length = if word_count == 0 {
        0.0
    } else {
        round_to(total_len as f64 / word_count as f64, 3)
    };

    DocumentStats {
        word_count,
        sentence_count: split_sentences(text).len(),
        paragraph_count: count_paragraphs(text),
        avg_word_length,
    }
}
