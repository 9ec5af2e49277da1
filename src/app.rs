use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crossterm::event::KeyEvent;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::event::AppEvent;
use crate::exam::countdown::{IntervalId, Scheduler};
use crate::exam::evaluation::Evaluation;
use crate::exam::grader::{Grader, GraderError, OfflineGrader};
use crate::exam::grading;
use crate::exam::session::{ExamSession, Stage, SubmissionId};
use crate::session::drill::TypingSession;
use crate::session::input::{self, InputOutcome};
use crate::session::result::DrillReport;
use crate::ui::components::menu::Menu;
use crate::ui::editor::{EditorAction, EssayEditor};
use crate::ui::theme::ThemeContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    DrillSelect,
    Drill,
    DrillResult,
    ExamSelect,
    Exam,
}

pub struct App<S: Scheduler> {
    pub screen: AppScreen,
    pub menu: Menu,
    pub theme: ThemeContext,
    pub config: Config,
    pub catalog: Catalog,
    pub drill_selected: usize,
    pub drill: Option<TypingSession>,
    pub last_report: Option<DrillReport>,
    pub task_selected: usize,
    pub exam: ExamSession<S>,
    pub editor: EssayEditor,
    pub result_scroll: u16,
    pub should_quit: bool,
    grader: Arc<dyn Grader>,
    tx: Sender<AppEvent>,
}

/// Pick the grader the build and configuration allow.
#[cfg(feature = "network")]
pub fn build_grader(config: &Config) -> Arc<dyn Grader> {
    use crate::exam::grader::HttpGrader;

    match HttpGrader::new(
        config.grader_url.clone(),
        &config.grader_api_key_env,
        config.grader_require_api_key,
        config.grader_timeout(),
    ) {
        Ok(grader) => Arc::new(grader),
        Err(err) => {
            tracing::warn!(error = %err, "falling back to offline grader");
            Arc::new(OfflineGrader)
        }
    }
}

#[cfg(not(feature = "network"))]
pub fn build_grader(_config: &Config) -> Arc<dyn Grader> {
    Arc::new(OfflineGrader)
}

impl<S: Scheduler> App<S> {
    pub fn new(
        config: Config,
        catalog: Catalog,
        scheduler: S,
        grader: Arc<dyn Grader>,
        tx: Sender<AppEvent>,
    ) -> Self {
        let theme = ThemeContext::new(&config.theme);
        Self {
            screen: AppScreen::Menu,
            menu: Menu::new(),
            theme,
            config,
            catalog,
            drill_selected: 0,
            drill: None,
            last_report: None,
            task_selected: 0,
            exam: ExamSession::new(scheduler),
            editor: EssayEditor::new(""),
            result_scroll: 0,
            should_quit: false,
            grader,
            tx,
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme.toggle();
        self.config.theme = self.theme.name().to_string();
        info!(theme = %self.config.theme, "theme switched");
    }

    pub fn go_to_menu(&mut self) {
        if self.screen == AppScreen::Exam {
            self.exam.leave();
        }
        self.drill = None;
        self.screen = AppScreen::Menu;
    }

    // --- typing drills ---

    pub fn go_to_drill_select(&mut self) {
        self.drill = None;
        self.drill_selected = self
            .drill_selected
            .min(self.catalog.drills.len().saturating_sub(1));
        self.screen = AppScreen::DrillSelect;
    }

    pub fn drill_next(&mut self) {
        if !self.catalog.drills.is_empty() {
            self.drill_selected = (self.drill_selected + 1) % self.catalog.drills.len();
        }
    }

    pub fn drill_prev(&mut self) {
        let len = self.catalog.drills.len();
        if len > 0 {
            self.drill_selected = (self.drill_selected + len - 1) % len;
        }
    }

    pub fn start_drill(&mut self) {
        let Some(drill) = self.catalog.drills.get(self.drill_selected) else {
            return;
        };
        info!(drill = %drill.id, chars = drill.text.chars().count(), "drill started");
        self.drill = Some(TypingSession::new(&drill.text));
        self.screen = AppScreen::Drill;
    }

    /// Start the current drill over, keeping the same text.
    pub fn retry_drill(&mut self) {
        if let Some(drill) = self.drill.as_mut() {
            drill.reset();
            self.screen = AppScreen::Drill;
        } else {
            self.start_drill();
        }
    }

    pub fn type_char(&mut self, ch: char) {
        let Some(drill) = self.drill.as_mut() else {
            return;
        };
        let outcome = input::type_char(drill, ch);
        self.on_drill_outcome(outcome);
    }

    pub fn backspace(&mut self) {
        if let Some(drill) = self.drill.as_mut() {
            input::backspace(drill);
        }
    }

    fn on_drill_outcome(&mut self, outcome: InputOutcome) {
        if let InputOutcome::Completed(report) = outcome {
            info!(
                wpm = report.wpm,
                accuracy = report.accuracy,
                mistakes = report.error_count,
                "drill completed"
            );
            self.last_report = Some(report);
            self.screen = AppScreen::DrillResult;
        }
    }

    // --- exam simulator ---

    pub fn go_to_exam_select(&mut self) {
        self.exam.leave();
        self.task_selected = self
            .task_selected
            .min(self.catalog.exam_tasks.len().saturating_sub(1));
        self.screen = AppScreen::ExamSelect;
    }

    pub fn task_next(&mut self) {
        if !self.catalog.exam_tasks.is_empty() {
            self.task_selected = (self.task_selected + 1) % self.catalog.exam_tasks.len();
        }
    }

    pub fn task_prev(&mut self) {
        let len = self.catalog.exam_tasks.len();
        if len > 0 {
            self.task_selected = (self.task_selected + len - 1) % len;
        }
    }

    pub fn start_exam(&mut self) {
        let Some(task) = self.catalog.exam_tasks.get(self.task_selected).cloned() else {
            return;
        };
        if self.exam.select_task(task) {
            self.editor = EssayEditor::new("");
            self.result_scroll = 0;
            self.screen = AppScreen::Exam;
        }
    }

    /// Route a key to the essay editor. Only reaches the session while writing.
    pub fn on_editor_key(&mut self, key: KeyEvent) {
        if self.exam.stage() != Stage::Writing {
            return;
        }
        match self.editor.handle(key) {
            EditorAction::Edited => {
                self.exam.set_content(self.editor.value());
            }
            EditorAction::Submit => self.submit_essay(),
            EditorAction::Back => {
                self.exam.back();
                self.screen = AppScreen::ExamSelect;
            }
            EditorAction::Continue => {}
        }
    }

    /// Hand the essay to a grading worker. The result comes back as
    /// [`AppEvent::Graded`].
    pub fn submit_essay(&mut self) {
        let Some(submission) = self.exam.submit() else {
            debug!("submit ignored");
            return;
        };
        let grader = Arc::clone(&self.grader);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let outcome = grading::grade(grader.as_ref(), &submission.request);
            let _ = tx.send(AppEvent::Graded {
                id: submission.id,
                outcome,
            });
        });
    }

    pub fn on_graded(&mut self, id: SubmissionId, outcome: Result<Evaluation, GraderError>) {
        if self.exam.resolve(id, outcome) && self.exam.stage() == Stage::Result {
            self.result_scroll = 0;
        }
    }

    pub fn on_countdown(&mut self, id: IntervalId) {
        self.exam.on_interval(id);
    }

    /// From the report back to the essay, which is kept as written.
    pub fn revise_essay(&mut self) {
        if self.exam.stage() == Stage::Result {
            self.exam.back();
            self.editor.set_text(self.exam.content());
        }
    }

    pub fn scroll_result(&mut self, delta: i32) {
        self.result_scroll = if delta < 0 {
            self.result_scroll.saturating_sub(delta.unsigned_abs() as u16)
        } else {
            self.result_scroll.saturating_add(delta as u16)
        };
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver};
    use std::time::Duration;

    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::exam::countdown::testing::ManualScheduler;
    use crate::exam::evaluation::{Criteria, ExaminerFeedback};
    use crate::exam::grader::GradeRequest;

    struct CountingGrader {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Grader for CountingGrader {
        fn grade(&self, request: &GradeRequest) -> Result<Evaluation, GraderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GraderError::Transport("connection refused".to_string()));
            }
            Ok(Evaluation {
                criteria: Criteria {
                    task: 7.0,
                    coherence: 7.0,
                    lexical: 7.0,
                    grammar: 7.0,
                },
                overall_band: 7.0,
                feedback: ExaminerFeedback::default(),
                model_answer: "Model.".to_string(),
                word_count: 0,
                task_type: Some(request.task_type),
                word_count_penalty: false,
                band_upgrades: Vec::new(),
                error_patterns: Vec::new(),
                vocabulary_improvements: Vec::new(),
            })
        }
    }

    fn app(fail: bool) -> (App<ManualScheduler>, Receiver<AppEvent>, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let grader = Arc::new(CountingGrader {
            calls: Arc::clone(&calls),
            fail,
        });
        let catalog = Catalog::bundled().unwrap();
        let app = App::new(Config::default(), catalog, ManualScheduler::default(), grader, tx);
        (app, rx, calls)
    }

    fn press(app: &mut App<ManualScheduler>, code: KeyCode) {
        app.on_editor_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_essay(app: &mut App<ManualScheduler>, words: usize) {
        for _ in 0..words {
            for ch in "word ".chars() {
                press(app, KeyCode::Char(ch));
            }
        }
    }

    fn wait_graded(app: &mut App<ManualScheduler>, rx: &Receiver<AppEvent>) {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(AppEvent::Graded { id, outcome }) => app.on_graded(id, outcome),
            _ => panic!("expected a graded event"),
        }
    }

    #[test]
    fn starts_on_menu_with_light_theme() {
        let (app, _rx, _) = app(false);
        assert_eq!(app.screen, AppScreen::Menu);
        assert_eq!(app.theme.name(), "light");
    }

    #[test]
    fn toggle_theme_updates_config() {
        let (mut app, _rx, _) = app(false);
        app.toggle_theme();
        assert_eq!(app.config.theme, "dark");
    }

    #[test]
    fn completing_a_drill_shows_the_report() {
        let (mut app, _rx, _) = app(false);
        app.go_to_drill_select();
        app.start_drill();
        assert_eq!(app.screen, AppScreen::Drill);

        let text: String = app.drill.as_ref().unwrap().reference().iter().collect();
        for ch in text.chars() {
            app.type_char(ch);
        }
        assert_eq!(app.screen, AppScreen::DrillResult);
        let report = app.last_report.as_ref().unwrap();
        assert_eq!(report.accuracy, 100);
        assert_eq!(report.total_chars, text.chars().count());

        app.retry_drill();
        assert_eq!(app.screen, AppScreen::Drill);
        assert_eq!(app.drill.as_ref().unwrap().cursor(), 0);
    }

    #[test]
    fn drill_picker_wraps() {
        let (mut app, _rx, _) = app(false);
        app.drill_prev();
        assert_eq!(app.drill_selected, app.catalog.drills.len() - 1);
        app.drill_next();
        assert_eq!(app.drill_selected, 0);
    }

    #[test]
    fn editor_keys_flow_into_the_session() {
        let (mut app, _rx, _) = app(false);
        app.go_to_exam_select();
        app.start_exam();
        assert_eq!(app.screen, AppScreen::Exam);
        assert_eq!(app.exam.stage(), Stage::Writing);

        type_essay(&mut app, 3);
        assert_eq!(app.exam.content(), "word word word ");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.exam.content(), "word word word");
    }

    #[test]
    fn graded_essay_reaches_result_then_revision_keeps_text() {
        let (mut app, rx, calls) = app(false);
        app.go_to_exam_select();
        app.start_exam();
        type_essay(&mut app, 30);

        app.on_editor_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(app.exam.stage(), Stage::Submitting);
        // A second submit while pending is ignored.
        app.submit_essay();

        wait_graded(&mut app, &rx);
        assert_eq!(app.exam.stage(), Stage::Result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(rx.try_recv().is_err());

        let before = app.exam.content().to_string();
        app.revise_essay();
        assert_eq!(app.exam.stage(), Stage::Writing);
        assert_eq!(app.editor.value(), before);
    }

    #[test]
    fn failed_grading_returns_to_writing_with_error() {
        let (mut app, rx, _) = app(true);
        app.go_to_exam_select();
        app.start_exam();
        type_essay(&mut app, 30);
        let before = app.exam.content().to_string();

        app.submit_essay();
        wait_graded(&mut app, &rx);

        assert_eq!(app.exam.stage(), Stage::Writing);
        assert_eq!(app.exam.content(), before);
        assert_eq!(app.editor.value(), before);
        assert_eq!(app.exam.last_error(), Some("Error: connection refused"));
    }

    #[test]
    fn leaving_mid_grading_discards_the_result() {
        let (mut app, rx, _) = app(false);
        app.go_to_exam_select();
        app.start_exam();
        type_essay(&mut app, 30);
        app.submit_essay();
        app.go_to_menu();

        wait_graded(&mut app, &rx);
        assert_eq!(app.exam.stage(), Stage::Selecting);
        assert!(app.exam.evaluation().is_none());
        assert_eq!(app.screen, AppScreen::Menu);
    }

    #[test]
    fn escape_from_writing_returns_to_picker() {
        let (mut app, _rx, _) = app(false);
        app.go_to_exam_select();
        app.start_exam();
        type_essay(&mut app, 2);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, AppScreen::ExamSelect);
        assert_eq!(app.exam.stage(), Stage::Selecting);
        assert_eq!(app.exam.content(), "");
    }

    #[test]
    fn result_scroll_saturates() {
        let (mut app, _rx, _) = app(false);
        app.scroll_result(-3);
        assert_eq!(app.result_scroll, 0);
        app.scroll_result(5);
        app.scroll_result(-2);
        assert_eq!(app.result_scroll, 3);
    }
}
