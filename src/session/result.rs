use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::metrics;
use crate::session::drill::TypingSession;

/// Final numbers for a finished drill, plus the review ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrillReport {
    pub wpm: u32,
    pub accuracy: u32,
    pub total_chars: usize,
    pub error_count: usize,
    pub elapsed_secs: f64,
    #[serde(default)]
    pub error_positions: Vec<usize>,
    pub completed_at: DateTime<Utc>,
}

impl DrillReport {
    pub fn from_session(session: &TypingSession) -> Self {
        let end = session.finished_at().unwrap_or_else(Instant::now);
        let total_chars = session.input().len();
        Self {
            wpm: metrics::wpm(total_chars, session.started_at(), end),
            accuracy: metrics::accuracy(session.correct_count(), total_chars),
            total_chars,
            error_count: session.error_count(),
            elapsed_secs: session.elapsed_at(end).as_secs_f64(),
            error_positions: session.error_indices().iter().copied().collect(),
            completed_at: Utc::now(),
        }
    }

    pub fn elapsed_label(&self) -> String {
        metrics::format_elapsed(Duration::try_from_secs_f64(self.elapsed_secs).unwrap_or_default())
    }
}
