use std::borrow::Cow;
use std::time::Instant;

use icu_normalizer::{ComposingNormalizerBorrowed, DecomposingNormalizerBorrowed};
use tracing::debug;

use crate::session::drill::TypingSession;
use crate::session::result::DrillReport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharStatus {
    Pending,
    Correct,
    /// Currently correct, but this position was mistyped at some point.
    Corrected,
    Incorrect(char),
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputOutcome {
    /// Drill already finished, or the proposal is longer than the reference.
    Rejected,
    Accepted,
    Completed(DrillReport),
}

/// NFC form so composed and decomposed input compare equal to the reference.
pub fn normalize(text: &str) -> Cow<'_, str> {
    ComposingNormalizerBorrowed::new_nfc().normalize(text)
}

/// True when `typed` is the first part of the canonical decomposition of
/// `expected`, e.g. `e` for `\u{e9}`.
fn starts_composition(typed: char, expected: char) -> bool {
    let mut buf = [0u8; 4];
    let decomposed = DecomposingNormalizerBorrowed::new_nfd().normalize(expected.encode_utf8(&mut buf));
    let mut chars = decomposed.chars();
    chars.next() == Some(typed) && chars.next().is_some()
}

/// Judge a deferred position against the new proposal. It is cleared once
/// it matches or is deleted, and recorded as a mistake once the typist has
/// moved on or the drill is completing.
fn settle_deferred(session: &mut TypingSession, proposed: &[char], completing: bool) {
    let Some(idx) = session.deferred else {
        return;
    };
    let Some(&typed) = proposed.get(idx) else {
        session.deferred = None;
        return;
    };
    let expected = session.reference[idx];
    if typed == expected {
        session.deferred = None;
        return;
    }
    let still_open =
        !completing && proposed.len() == idx + 1 && starts_composition(typed, expected);
    if !still_open {
        session.error_indices.insert(idx);
        session.deferred = None;
    }
}

pub fn apply_input_now(session: &mut TypingSession, new_text: &str) -> InputOutcome {
    apply_input(session, new_text, Instant::now())
}

/// Replace the typed-so-far text with `new_text`.
///
/// Only a growing proposal is checked: its last character is compared to the
/// reference at the same index and recorded in the mistake ledger on
/// mismatch. A bare base letter whose composed form is expected is held
/// back until the next proposal, so a trailing combining mark can complete
/// it. Shrinking or equal-length edits never add new positions.
pub fn apply_input(session: &mut TypingSession, new_text: &str, now: Instant) -> InputOutcome {
    if session.is_terminal() {
        return InputOutcome::Rejected;
    }

    let proposed: Vec<char> = normalize(new_text).chars().collect();
    if proposed.len() > session.reference.len() {
        debug!(
            len = proposed.len(),
            reference_len = session.reference.len(),
            "input longer than reference ignored"
        );
        return InputOutcome::Rejected;
    }

    if session.started_at.is_none() && !proposed.is_empty() {
        session.started_at = Some(now);
    }

    let completing = !proposed.is_empty() && proposed.len() == session.reference.len();
    settle_deferred(session, &proposed, completing);

    if proposed.len() > session.input.len() {
        let idx = proposed.len() - 1;
        let (typed, expected) = (proposed[idx], session.reference[idx]);
        if typed != expected {
            if !completing && starts_composition(typed, expected) {
                session.deferred = Some(idx);
            } else {
                session.error_indices.insert(idx);
            }
        }
    }

    session.input = proposed;

    if !session.input.is_empty() && session.input.len() == session.reference.len() {
        session.finished_at = Some(now);
        let report = DrillReport::from_session(session);
        debug!(
            wpm = report.wpm,
            accuracy = report.accuracy,
            errors = report.error_count,
            "drill complete"
        );
        return InputOutcome::Completed(report);
    }

    InputOutcome::Accepted
}

/// Append one keystroke at the end of the input.
pub fn type_char(session: &mut TypingSession, ch: char) -> InputOutcome {
    let mut text = session.input_text();
    text.push(ch);
    apply_input_now(session, &text)
}

pub fn backspace(session: &mut TypingSession) -> InputOutcome {
    if session.input.is_empty() {
        return InputOutcome::Accepted;
    }
    let text: String = session.input[..session.input.len() - 1].iter().collect();
    apply_input_now(session, &text)
}
