use std::time::{Duration, Instant};

/// Standard typing convention: five characters make one word.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Words per minute over `[started_at, ended_at]`, rounded to the nearest integer.
///
/// Returns 0 when no start has been latched or when no time has elapsed.
pub fn wpm(char_count: usize, started_at: Option<Instant>, ended_at: Instant) -> u32 {
    let Some(start) = started_at else {
        return 0;
    };
    let elapsed_minutes = ended_at.saturating_duration_since(start).as_secs_f64() / 60.0;
    if elapsed_minutes <= 0.0 {
        return 0;
    }
    let words = char_count as f64 / CHARS_PER_WORD;
    (words / elapsed_minutes).round() as u32
}

/// Percentage of `total` that was typed correctly, rounded to the nearest integer.
pub fn accuracy(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    (correct as f64 / total as f64 * 100.0).round() as u32
}

/// `m:ss` clock string for a whole number of seconds.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Drill duration with one decimal, e.g. `42.3s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}
