//! Text cleanup and fixed-size chunking.
//!
//! Provides the two pure transformations applied to extracted page text
//! before embedding: `clean` normalizes whitespace artifacts from PDF
//! extraction, `split` slices the result into fixed-size chunks.

use regex::Regex;
use std::sync::LazyLock;

static HYPHEN_LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)-\n(\w)").expect("valid regex"));
static NEWLINE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").expect("valid regex"));
static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize extracted page text.
///
/// Steps, in order:
/// 1. Join words hyphenated across a line break (`inter-\nesting` -> `interesting`)
/// 2. Collapse newline runs to a single newline
/// 3. Collapse all whitespace runs to a single space
/// 4. Trim leading and trailing whitespace
pub fn clean(text: &str) -> String {
    let joined = HYPHEN_LINE_BREAK.replace_all(text, "${1}${2}");
    let single_newlines = NEWLINE_RUNS.replace_all(&joined, "\n");
    let spaced = WHITESPACE_RUNS.replace_all(&single_newlines, " ");
    spaced.trim().to_string()
}

/// Slice text into consecutive chunks of at most `size` characters.
///
/// Counts characters, not bytes, so multi-byte text never splits inside
/// a code point. Every chunk except the last has exactly `size` characters
/// and concatenating the chunks reproduces the input. Empty input yields
/// no chunks. `size` must be greater than zero; the configured chunk size
/// is validated at startup.
pub fn split(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
