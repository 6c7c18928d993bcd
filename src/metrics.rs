//! Pure typing metrics.
//!
//! Everything here is total over its inputs: degenerate cases (no input, no
//! elapsed time, empty target) map to fixed sentinel values instead of errors.
//! Lengths and positions are counted in `char`s, not bytes.

use std::borrow::Cow;

/// Characters that make up one "word" for speed purposes
pub const CHARS_PER_WORD: f64 = 5.0;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Words per minute, where a word is five characters regardless of spacing.
pub fn compute_wpm(chars_typed: usize, elapsed_minutes: f64) -> u32 {
    if !elapsed_minutes.is_finite() || elapsed_minutes <= 0.0 {
        return 0;
    }
    let words = chars_typed as f64 / CHARS_PER_WORD;
    (words / elapsed_minutes).round() as u32
}

/// Percentage of typed characters matching the target at the same position.
///
/// Characters typed past the end of `target` count as attempted but never
/// correct. An empty `input` is 100.
pub fn compute_accuracy(target: &str, input: &str) -> u32 {
    let typed = input.chars().count();
    if typed == 0 {
        return 100;
    }
    let correct = target
        .chars()
        .zip(input.chars())
        .filter(|(expected, actual)| expected == actual)
        .count();

    ((correct as f64 / typed as f64) * 100.0).round() as u32
}

/// Collapse `\r\n` pairs into `\n`, borrowing when there is nothing to change.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains("\r\n") {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// True once `input` reproduces `target`, ignoring CRLF vs LF differences.
pub fn is_complete(target: &str, input: &str) -> bool {
    normalize_line_endings(target) == normalize_line_endings(input)
}

/// Minutes between two millisecond timestamps; zero if the clock went backwards.
pub fn elapsed_minutes(started_at_ms: u64, now_ms: u64) -> f64 {
    now_ms.saturating_sub(started_at_ms) as f64 / MS_PER_MINUTE
}

/// How far through `target` the input has reached, floored and capped at 100.
pub fn progress_percent(target: &str, input: &str) -> u32 {
    let total = target.chars().count();
    if total == 0 {
        return 0;
    }
    let typed = input.chars().count();
    ((typed * 100) / total).min(100) as u32
}
