use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::engine::metrics;
use crate::session::input::{self, CharStatus};

/// Live readout for the typing view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveMetrics {
    pub wpm: u32,
    pub accuracy: u32,
}

/// One typing drill against a fixed reference text.
///
/// `error_indices` is a historical mistake ledger: a position is added the
/// first time a wrong character lands there and stays until [`reset`].
/// `finished_at` is latched exactly when the input length reaches the
/// reference length; after that every input is rejected.
///
/// [`reset`]: TypingSession::reset
pub struct TypingSession {
    pub(crate) reference: Vec<char>,
    pub(crate) input: Vec<char>,
    pub(crate) error_indices: BTreeSet<usize>,
    /// Position holding a bare base character that a following combining
    /// mark may still turn into the expected one. Not yet judged.
    pub(crate) deferred: Option<usize>,
    pub(crate) started_at: Option<Instant>,
    pub(crate) finished_at: Option<Instant>,
}

impl TypingSession {
    pub fn new(reference: &str) -> Self {
        Self {
            reference: input::normalize(reference).chars().collect(),
            input: Vec::new(),
            error_indices: BTreeSet::new(),
            deferred: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn reference(&self) -> &[char] {
        &self.reference
    }

    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn input_text(&self) -> String {
        self.input.iter().collect()
    }

    pub fn error_indices(&self) -> &BTreeSet<usize> {
        &self.error_indices
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    pub fn cursor(&self) -> usize {
        self.input.len()
    }

    pub fn is_terminal(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn reset(&mut self) {
        self.input.clear();
        self.error_indices.clear();
        self.deferred = None;
        self.started_at = None;
        self.finished_at = None;
    }

    pub fn error_count(&self) -> usize {
        self.error_indices.len()
    }

    /// Typed characters minus every position ever marked wrong.
    pub fn correct_count(&self) -> usize {
        self.input.len().saturating_sub(self.error_indices.len())
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => now.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    pub fn live_metrics(&self) -> LiveMetrics {
        self.live_metrics_at(Instant::now())
    }

    /// Metrics as of `now`; a finished drill is frozen at its end time.
    pub fn live_metrics_at(&self, now: Instant) -> LiveMetrics {
        let end = self.finished_at.unwrap_or(now);
        LiveMetrics {
            wpm: metrics::wpm(self.input.len(), self.started_at, end),
            accuracy: metrics::accuracy(self.correct_count(), self.input.len()),
        }
    }

    pub fn progress(&self) -> f64 {
        if self.reference.is_empty() {
            return 0.0;
        }
        self.input.len() as f64 / self.reference.len() as f64
    }

    pub fn char_status(&self, idx: usize) -> CharStatus {
        let Some(&expected) = self.reference.get(idx) else {
            return CharStatus::Pending;
        };
        match self.input.get(idx) {
            None => CharStatus::Pending,
            Some(&typed) if typed != expected => CharStatus::Incorrect(typed),
            Some(_) if self.error_indices.contains(&idx) => CharStatus::Corrected,
            Some(_) => CharStatus::Correct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::input::{self, InputOutcome};

    #[test]
    fn test_new_session() {
        let session = TypingSession::new("hello");
        assert_eq!(session.reference().len(), 5);
        assert_eq!(session.cursor(), 0);
        assert!(!session.is_terminal());
        assert!(session.started_at().is_none());
        assert_eq!(session.progress(), 0.0);
    }

    #[test]
    fn test_accuracy_starts_at_100() {
        let session = TypingSession::new("test");
        assert_eq!(session.live_metrics().accuracy, 100);
        assert_eq!(session.live_metrics().wpm, 0);
    }

    #[test]
    fn test_char_status_tracks_corrections() {
        let mut session = TypingSession::new("abc");
        input::type_char(&mut session, 'x');
        assert_eq!(session.char_status(0), CharStatus::Incorrect('x'));
        assert_eq!(session.char_status(1), CharStatus::Pending);

        input::backspace(&mut session);
        assert_eq!(session.char_status(0), CharStatus::Pending);

        input::type_char(&mut session, 'a');
        assert_eq!(session.char_status(0), CharStatus::Corrected);
        input::type_char(&mut session, 'b');
        assert_eq!(session.char_status(1), CharStatus::Correct);
    }

    #[test]
    fn test_corrected_drill_still_below_100() {
        let mut session = TypingSession::new("abcd");
        input::type_char(&mut session, 'x');
        input::backspace(&mut session);
        for ch in "abc".chars() {
            input::type_char(&mut session, ch);
        }
        let outcome = input::type_char(&mut session, 'd');
        let InputOutcome::Completed(report) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        // 4 typed, 1 position in the ledger
        assert_eq!(report.accuracy, 75);
        assert_eq!(report.error_count, 1);
    }

    #[test]
    fn test_live_accuracy_never_underflows() {
        let mut session = TypingSession::new("abcdef");
        for ch in "xyzw".chars() {
            input::type_char(&mut session, ch);
        }
        for _ in 0..3 {
            input::backspace(&mut session);
        }
        // 1 char typed, 4 positions in the ledger
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.live_metrics().accuracy, 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut session = TypingSession::new("ab");
        input::type_char(&mut session, 'x');
        input::type_char(&mut session, 'b');
        assert!(session.is_terminal());

        session.reset();
        session.reset();
        assert!(!session.is_terminal());
        assert!(session.input().is_empty());
        assert!(session.error_indices().is_empty());
        assert!(session.started_at().is_none());
        assert!(session.finished_at().is_none());
    }

    #[test]
    fn test_elapsed_frozen_after_finish() {
        let mut session = TypingSession::new("a");
        let t0 = Instant::now();
        input::apply_input(&mut session, "a", t0 + Duration::from_secs(3));
        let later = t0 + Duration::from_secs(60);
        assert_eq!(session.elapsed_at(later), Duration::ZERO);
    }
}
