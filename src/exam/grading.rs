use tracing::{info, warn};

use crate::engine::band::{self, PENALTY_BAND_CAP};
use crate::exam::evaluation::{Criteria, Evaluation, ExaminerFeedback};
use crate::exam::grader::{GradeRequest, Grader, GraderError};
use crate::exam::task::TaskKind;

/// Below this many words the essay is not sent to the grader at all.
pub const MIN_GRADABLE_WORDS: usize = 20;

/// Half a band either way is normal examiner rounding.
const MAX_BAND_DRIFT: f64 = 0.5;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Fixed zero-band result for submissions too short to grade.
pub fn short_submission(kind: TaskKind, words: usize) -> Evaluation {
    Evaluation {
        criteria: Criteria::zero(),
        overall_band: 0.0,
        feedback: ExaminerFeedback {
            strengths: Vec::new(),
            improvements: vec!["The submission is too short to be evaluated.".to_string()],
            tips: vec![format!(
                "Please write a complete essay (at least {} words for Task 1, {} for Task 2).",
                TaskKind::Task1.min_words(),
                TaskKind::Task2.min_words()
            )],
        },
        model_answer: "No model answer generated for incomplete submission.".to_string(),
        word_count: words,
        task_type: Some(kind),
        word_count_penalty: false,
        band_upgrades: Vec::new(),
        error_patterns: Vec::new(),
        vocabulary_improvements: Vec::new(),
    }
}

/// Echo the locally computed word count and task kind, and cap the overall
/// band when the essay is under the task minimum. The cap ignores whatever
/// the grader itself decided.
pub fn apply_local_policy(evaluation: &mut Evaluation, kind: TaskKind, words: usize) {
    evaluation.word_count = words;
    evaluation.task_type = Some(kind);
    if words < kind.min_words() {
        evaluation.overall_band = band::cap(evaluation.overall_band, PENALTY_BAND_CAP);
        evaluation.word_count_penalty = true;
    }
}

/// Grade an essay, applying the local word-count rules around the grader call.
pub fn grade(grader: &dyn Grader, request: &GradeRequest) -> Result<Evaluation, GraderError> {
    let words = word_count(&request.essay);
    let kind = request.task_type;

    if words < MIN_GRADABLE_WORDS {
        info!(words, "essay too short, skipping grader");
        return Ok(short_submission(kind, words));
    }

    let mut evaluation = grader.grade(request).inspect_err(|e| {
        warn!(error = %e, "grader call failed");
    })?;
    evaluation.normalize_bands().map_err(GraderError::Malformed)?;
    if evaluation.band_drift() > MAX_BAND_DRIFT {
        warn!(
            overall = evaluation.overall_band,
            mean = evaluation.criteria.mean_band(),
            "grader overall band disagrees with its criteria"
        );
    }
    apply_local_policy(&mut evaluation, kind, words);

    info!(
        words,
        band = evaluation.overall_band,
        penalty = evaluation.word_count_penalty,
        "essay graded"
    );
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FixedBand {
        band: f64,
        calls: AtomicUsize,
    }

    impl FixedBand {
        fn new(band: f64) -> Self {
            Self {
                band,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Grader for FixedBand {
        fn grade(&self, _request: &GradeRequest) -> Result<Evaluation, GraderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut eval = short_submission(TaskKind::Task2, 0);
            eval.criteria = Criteria {
                task: self.band,
                coherence: self.band,
                lexical: self.band,
                grammar: self.band,
            };
            eval.overall_band = self.band;
            eval.task_type = None;
            Ok(eval)
        }
    }

    fn essay(words: usize) -> String {
        vec!["word"; words].join(" ")
    }

    fn request(kind: TaskKind, words: usize) -> GradeRequest {
        GradeRequest {
            prompt: "Prompt".to_string(),
            task_type: kind,
            data_outline: None,
            essay: essay(words),
        }
    }

    #[test]
    fn test_word_count_splits_on_any_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("  one\ttwo\n\nthree  "), 3);
    }

    #[test]
    fn test_nineteen_words_short_circuits() {
        let grader = FixedBand::new(8.0);
        let eval = grade(&grader, &request(TaskKind::Task2, 19)).unwrap();
        assert_eq!(grader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(eval.overall_band, 0.0);
        assert_eq!(eval.criteria, Criteria::zero());
        assert_eq!(eval.word_count, 19);
        assert_eq!(eval.task_type, Some(TaskKind::Task2));
        assert_eq!(
            eval.feedback.improvements,
            vec!["The submission is too short to be evaluated.".to_string()]
        );
        assert_eq!(
            eval.model_answer,
            "No model answer generated for incomplete submission."
        );
    }

    #[test]
    fn test_twenty_words_calls_grader() {
        let grader = FixedBand::new(5.0);
        grade(&grader, &request(TaskKind::Task1, 20)).unwrap();
        assert_eq!(grader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_task1_below_minimum_is_capped() {
        let grader = FixedBand::new(7.5);
        let eval = grade(&grader, &request(TaskKind::Task1, 140)).unwrap();
        assert_eq!(eval.overall_band, 6.5);
        assert!(eval.word_count_penalty);
        assert_eq!(eval.word_count, 140);
        assert_eq!(eval.task_type, Some(TaskKind::Task1));
        // Sub-scores are left as the grader returned them
        assert_eq!(eval.criteria.task, 7.5);
    }

    #[test]
    fn test_task2_above_minimum_passes_through() {
        let grader = FixedBand::new(7.5);
        let eval = grade(&grader, &request(TaskKind::Task2, 260)).unwrap();
        assert_eq!(eval.overall_band, 7.5);
        assert!(!eval.word_count_penalty);
    }

    #[test]
    fn test_below_minimum_low_band_keeps_band_but_flags() {
        let grader = FixedBand::new(5.5);
        let eval = grade(&grader, &request(TaskKind::Task2, 200)).unwrap();
        assert_eq!(eval.overall_band, 5.5);
        assert!(eval.word_count_penalty);
    }

    #[test]
    fn test_out_of_range_band_is_malformed() {
        let grader = FixedBand::new(12.0);
        let err = grade(&grader, &request(TaskKind::Task2, 260)).unwrap_err();
        assert!(matches!(err, GraderError::Malformed(_)));
    }

    #[test]
    fn test_drifting_overall_band_is_kept() {
        struct Drifting;
        impl Grader for Drifting {
            fn grade(&self, _request: &GradeRequest) -> Result<Evaluation, GraderError> {
                let mut eval = short_submission(TaskKind::Task2, 0);
                eval.criteria = Criteria {
                    task: 6.0,
                    coherence: 6.0,
                    lexical: 6.0,
                    grammar: 6.0,
                };
                eval.overall_band = 8.0;
                Ok(eval)
            }
        }

        let eval = grade(&Drifting, &request(TaskKind::Task2, 260)).unwrap();
        assert!(eval.band_drift() > MAX_BAND_DRIFT);
        assert_eq!(eval.overall_band, 8.0);
    }
}
