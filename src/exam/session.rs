use tracing::{debug, info, warn};

use crate::engine::metrics;
use crate::exam::countdown::{Countdown, IntervalId, Scheduler};
use crate::exam::evaluation::Evaluation;
use crate::exam::grader::{GradeRequest, Grader, GraderError};
use crate::exam::grading;
use crate::exam::task::{ExamTask, LengthHint};

/// Countdown values below this are highlighted.
pub const LOW_TIME_SECS: u32 = 120;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Selecting,
    Writing,
    Submitting,
    Result,
}

/// Tag for one in-flight grading call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubmissionId(pub u64);

/// What the caller must send to the grader after a successful [`ExamSession::submit`].
#[derive(Clone, Debug)]
pub struct Submission {
    pub id: SubmissionId,
    pub request: GradeRequest,
}

/// Timed essay session.
///
/// `Selecting -> Writing -> Submitting -> Result`, with `Result -> Writing`
/// and `Writing -> Selecting` on [`back`](Self::back), and an automatic
/// `Submitting -> Writing` when grading fails. The countdown runs only while
/// the stage is `Writing`. The essay text is never cleared by a failure.
pub struct ExamSession<S: Scheduler> {
    stage: Stage,
    selected_task: Option<ExamTask>,
    content: String,
    seconds_remaining: u32,
    evaluation: Option<Evaluation>,
    last_error: Option<String>,
    time_taken_secs: Option<u32>,
    pending: Option<SubmissionId>,
    next_submission: u64,
    countdown: Countdown<S>,
}

impl<S: Scheduler> ExamSession<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            stage: Stage::Selecting,
            selected_task: None,
            content: String::new(),
            seconds_remaining: 0,
            evaluation: None,
            last_error: None,
            time_taken_secs: None,
            pending: None,
            next_submission: 0,
            countdown: Countdown::new(scheduler),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn selected_task(&self) -> Option<&ExamTask> {
        self.selected_task.as_ref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn countdown(&self) -> &Countdown<S> {
        &self.countdown
    }

    pub fn is_low_time(&self) -> bool {
        self.stage == Stage::Writing && self.seconds_remaining < LOW_TIME_SECS
    }

    pub fn word_count(&self) -> usize {
        grading::word_count(&self.content)
    }

    pub fn length_hint(&self) -> Option<LengthHint> {
        let task = self.selected_task.as_ref()?;
        Some(LengthHint::classify(task.kind, self.word_count()))
    }

    /// Submit is offered only with non-blank text while writing.
    pub fn can_submit(&self) -> bool {
        self.stage == Stage::Writing && !self.content.trim().is_empty()
    }

    /// `Selecting -> Writing` with a fresh essay and a full countdown.
    pub fn select_task(&mut self, task: ExamTask) -> bool {
        if self.stage != Stage::Selecting {
            return false;
        }
        info!(task = %task.id, kind = %task.kind, "exam task selected");
        self.seconds_remaining = task.time_allowance_secs();
        self.selected_task = Some(task);
        self.content.clear();
        self.last_error = None;
        self.evaluation = None;
        self.time_taken_secs = None;
        self.enter_writing();
        true
    }

    /// Replace the essay text. Only accepted while writing.
    pub fn set_content(&mut self, text: &str) -> bool {
        if self.stage != Stage::Writing {
            return false;
        }
        self.content.clear();
        self.content.push_str(text);
        true
    }

    /// One second off the clock, floored at zero. Ignored outside `Writing`.
    /// Reaching zero does not end the session.
    pub fn tick(&mut self) {
        if self.stage != Stage::Writing {
            return;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
    }

    /// Tick delivered by the scheduler; ticks from a stopped interval are dropped.
    pub fn on_interval(&mut self, id: IntervalId) {
        if self.countdown.is_current(id) {
            self.tick();
        } else {
            debug!(?id, "tick from stale interval ignored");
        }
    }

    /// `Writing -> Submitting`. Returns the request to grade, or `None` when
    /// the essay is blank or the session is not writing (including while a
    /// previous submission is still pending).
    pub fn submit(&mut self) -> Option<Submission> {
        if !self.can_submit() {
            return None;
        }
        let task = self.selected_task.as_ref()?;
        let request = GradeRequest::new(task, &self.content);

        self.next_submission += 1;
        let id = SubmissionId(self.next_submission);
        self.pending = Some(id);
        self.last_error = None;
        self.leave_writing(Stage::Submitting);
        info!(submission = id.0, words = self.word_count(), "essay submitted");
        Some(Submission { id, request })
    }

    /// Apply the outcome of submission `id`. Outcomes for anything other than
    /// the pending submission are discarded. Returns whether it was applied.
    pub fn resolve(&mut self, id: SubmissionId, outcome: Result<Evaluation, GraderError>) -> bool {
        if self.stage != Stage::Submitting || self.pending != Some(id) {
            debug!(submission = id.0, "stale grading result discarded");
            return false;
        }
        self.pending = None;

        match outcome {
            Ok(evaluation) => {
                let allowance = self
                    .selected_task
                    .as_ref()
                    .map_or(0, ExamTask::time_allowance_secs);
                self.time_taken_secs = Some(allowance.saturating_sub(self.seconds_remaining));
                self.evaluation = Some(evaluation);
                self.stage = Stage::Result;
                info!(submission = id.0, "evaluation received");
            }
            Err(err) => {
                warn!(submission = id.0, error = %err, "grading failed, back to writing");
                self.last_error = Some(err.display_message());
                self.enter_writing();
            }
        }
        true
    }

    /// Submit and grade synchronously on the current thread.
    pub fn submit_with(&mut self, grader: &dyn Grader) -> bool {
        let Some(submission) = self.submit() else {
            return false;
        };
        let outcome = grading::grade(grader, &submission.request);
        self.resolve(submission.id, outcome)
    }

    /// `Result -> Writing` keeps the essay; `Writing -> Selecting` discards
    /// the task, essay and clock. No effect in other stages.
    pub fn back(&mut self) {
        match self.stage {
            Stage::Result => {
                self.evaluation = None;
                self.time_taken_secs = None;
                self.enter_writing();
            }
            Stage::Writing => self.clear_to_selecting(),
            Stage::Selecting | Stage::Submitting => {}
        }
    }

    /// Navigate away from any stage. A pending grading result will be discarded.
    pub fn leave(&mut self) {
        if self.pending.take().is_some() {
            debug!("leaving with a submission in flight");
        }
        self.clear_to_selecting();
    }

    /// Time spent writing, captured when the evaluation arrived.
    pub fn time_taken(&self) -> Option<String> {
        self.time_taken_secs
            .map(|secs| metrics::format_clock(u64::from(secs)))
    }

    pub fn remaining_label(&self) -> String {
        metrics::format_clock(u64::from(self.seconds_remaining))
    }

    /// Share of the allowance still left, for the countdown bar.
    pub fn remaining_ratio(&self) -> f64 {
        match &self.selected_task {
            Some(task) if task.time_allowance_secs() > 0 => {
                f64::from(self.seconds_remaining) / f64::from(task.time_allowance_secs())
            }
            _ => 0.0,
        }
    }

    fn enter_writing(&mut self) {
        self.stage = Stage::Writing;
        self.countdown.start();
    }

    fn leave_writing(&mut self, next: Stage) {
        self.countdown.stop();
        self.stage = next;
    }

    fn clear_to_selecting(&mut self) {
        self.leave_writing(Stage::Selecting);
        self.selected_task = None;
        self.content.clear();
        self.seconds_remaining = 0;
        self.evaluation = None;
        self.last_error = None;
        self.time_taken_secs = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::countdown::testing::ManualScheduler;
    use crate::exam::grading::short_submission;
    use crate::exam::task::{TaskCategory, TaskKind};

    fn task(kind: TaskKind) -> ExamTask {
        ExamTask {
            id: "w1".to_string(),
            kind,
            category: TaskCategory::Opinion,
            prompt: "Discuss.".to_string(),
            data_outline: None,
            image: None,
            model_answer: None,
        }
    }

    fn writing_session(kind: TaskKind) -> ExamSession<ManualScheduler> {
        let mut session = ExamSession::new(ManualScheduler::default());
        assert!(session.select_task(task(kind)));
        session
    }

    fn evaluation() -> Evaluation {
        let mut eval = short_submission(TaskKind::Task2, 0);
        eval.overall_band = 7.0;
        eval
    }

    #[test]
    fn select_task_enters_writing_with_full_clock() {
        let session = writing_session(TaskKind::Task1);
        assert_eq!(session.stage(), Stage::Writing);
        assert_eq!(session.seconds_remaining(), 1200);
        assert!(session.content().is_empty());
        assert!(session.countdown().is_running());
    }

    #[test]
    fn select_task_only_from_selecting() {
        let mut session = writing_session(TaskKind::Task1);
        assert!(!session.select_task(task(TaskKind::Task2)));
        assert_eq!(session.seconds_remaining(), 1200);
    }

    #[test]
    fn tick_floors_at_zero_without_ending() {
        let mut session = writing_session(TaskKind::Task1);
        for _ in 0..1300 {
            session.tick();
        }
        assert_eq!(session.seconds_remaining(), 0);
        assert_eq!(session.stage(), Stage::Writing);
        assert!(session.set_content("still typing"));
    }

    #[test]
    fn tick_outside_writing_is_ignored() {
        let mut session = ExamSession::new(ManualScheduler::default());
        session.tick();
        assert_eq!(session.seconds_remaining(), 0);

        let mut session = writing_session(TaskKind::Task2);
        session.set_content("an essay");
        session.submit().unwrap();
        session.tick();
        session.tick();
        assert_eq!(session.seconds_remaining(), 2400);
    }

    #[test]
    fn stale_interval_does_not_tick() {
        let sched = ManualScheduler::default();
        let log = sched.log.clone();
        let mut session = ExamSession::new(sched);
        session.select_task(task(TaskKind::Task2));
        let first = log.borrow().started[0];

        session.set_content("text");
        let sub = session.submit().unwrap();
        session.resolve(sub.id, Err(GraderError::Transport("down".into())));
        let second = log.borrow().started[1];

        session.on_interval(first);
        assert_eq!(session.seconds_remaining(), 2400);
        session.on_interval(second);
        assert_eq!(session.seconds_remaining(), 2399);
    }

    #[test]
    fn submit_blank_is_noop() {
        let mut session = writing_session(TaskKind::Task2);
        session.set_content("   \n\t ");
        assert!(session.submit().is_none());
        assert_eq!(session.stage(), Stage::Writing);
    }

    #[test]
    fn double_submit_yields_one_request() {
        let mut session = writing_session(TaskKind::Task2);
        session.set_content("an essay");
        assert!(session.submit().is_some());
        assert!(session.submit().is_none());
        assert_eq!(session.stage(), Stage::Submitting);
    }

    #[test]
    fn timer_stops_while_submitting() {
        let sched = ManualScheduler::default();
        let log = sched.log.clone();
        let mut session = ExamSession::new(sched);
        session.select_task(task(TaskKind::Task1));
        session.set_content("text");
        session.submit().unwrap();
        assert!(!session.countdown().is_running());
        assert_eq!(log.borrow().running(), 0);
    }

    #[test]
    fn success_records_time_taken() {
        let mut session = writing_session(TaskKind::Task1);
        for _ in 0..125 {
            session.tick();
        }
        session.set_content("text");
        let sub = session.submit().unwrap();
        assert!(session.resolve(sub.id, Ok(evaluation())));
        assert_eq!(session.stage(), Stage::Result);
        assert_eq!(session.time_taken().as_deref(), Some("2:05"));
        assert_eq!(session.evaluation().map(|e| e.overall_band), Some(7.0));
    }

    #[test]
    fn failure_preserves_content_and_allows_retry() {
        let mut session = writing_session(TaskKind::Task2);
        let essay = "Line one.\n\nLine two with ünïcödé.";
        session.set_content(essay);
        let sub = session.submit().unwrap();
        session.resolve(sub.id, Err(GraderError::Transport("connection refused".into())));

        assert_eq!(session.stage(), Stage::Writing);
        assert_eq!(session.content(), essay);
        assert_eq!(session.last_error(), Some("Error: connection refused"));
        assert!(session.countdown().is_running());

        // Error clears on the next attempt
        assert!(session.submit().is_some());
        assert!(session.last_error().is_none());
    }

    #[test]
    fn stale_result_is_discarded() {
        let mut session = writing_session(TaskKind::Task2);
        session.set_content("text");
        let sub = session.submit().unwrap();
        session.leave();
        assert!(!session.resolve(sub.id, Ok(evaluation())));
        assert_eq!(session.stage(), Stage::Selecting);
        assert!(session.evaluation().is_none());
    }

    #[test]
    fn result_from_old_submission_is_discarded() {
        let mut session = writing_session(TaskKind::Task2);
        session.set_content("text");
        let old = session.submit().unwrap();
        session.leave();
        session.select_task(task(TaskKind::Task2));
        session.set_content("text");
        let current = session.submit().unwrap();
        assert!(!session.resolve(old.id, Ok(evaluation())));
        assert_eq!(session.stage(), Stage::Submitting);
        assert!(session.resolve(current.id, Ok(evaluation())));
    }

    #[test]
    fn back_from_result_keeps_essay() {
        let mut session = writing_session(TaskKind::Task2);
        session.set_content("my essay");
        let sub = session.submit().unwrap();
        session.resolve(sub.id, Ok(evaluation()));
        session.back();
        assert_eq!(session.stage(), Stage::Writing);
        assert_eq!(session.content(), "my essay");
        assert!(session.evaluation().is_none());
        assert!(session.countdown().is_running());
    }

    #[test]
    fn back_from_writing_clears_everything() {
        let mut session = writing_session(TaskKind::Task2);
        session.set_content("my essay");
        session.back();
        assert_eq!(session.stage(), Stage::Selecting);
        assert!(session.selected_task().is_none());
        assert!(session.content().is_empty());
        assert_eq!(session.seconds_remaining(), 0);
        assert!(!session.countdown().is_running());
    }

    #[test]
    fn back_while_submitting_is_ignored() {
        let mut session = writing_session(TaskKind::Task2);
        session.set_content("my essay");
        session.submit().unwrap();
        session.back();
        assert_eq!(session.stage(), Stage::Submitting);
    }

    #[test]
    fn content_locked_outside_writing() {
        let mut session = writing_session(TaskKind::Task2);
        session.set_content("draft");
        session.submit().unwrap();
        assert!(!session.set_content("changed"));
        assert_eq!(session.content(), "draft");
    }

    #[test]
    fn low_time_flag() {
        let mut session = writing_session(TaskKind::Task1);
        assert!(!session.is_low_time());
        for _ in 0..(1200 - 119) {
            session.tick();
        }
        assert!(session.is_low_time());
    }
}
