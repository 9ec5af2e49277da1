use serde::{Deserialize, Serialize};

use crate::engine::band;
use crate::exam::task::TaskKind;

/// The four sub-scores. The first one is Task Achievement for Task 1 and
/// Task Response for Task 2; both wire names are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(rename = "taskAchievement", alias = "taskResponse")]
    pub task: f64,
    pub coherence: f64,
    pub lexical: f64,
    pub grammar: f64,
}

impl Criteria {
    pub fn zero() -> Self {
        Self {
            task: 0.0,
            coherence: 0.0,
            lexical: 0.0,
            grammar: 0.0,
        }
    }

    pub fn scores(&self) -> [f64; 4] {
        [self.task, self.coherence, self.lexical, self.grammar]
    }

    pub fn mean_band(&self) -> f64 {
        band::mean_band(&self.scores())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExaminerFeedback {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandUpgradeSuggestion {
    pub current_band: f64,
    pub target_band: f64,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Grammar,
    Vocabulary,
    Coherence,
    Task,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Rare,
    Occasional,
    Frequent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

/// A recurring mistake, with quotes from the essay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorPattern {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
    pub frequency: Frequency,
    pub severity: Severity,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VocabSuggestion {
    pub original: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub reason: String,
}

/// Scored feedback for one essay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub criteria: Criteria,
    pub overall_band: f64,
    pub feedback: ExaminerFeedback,
    pub model_answer: String,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub task_type: Option<TaskKind>,
    #[serde(default)]
    pub word_count_penalty: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub band_upgrades: Vec<BandUpgradeSuggestion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_patterns: Vec<ErrorPattern>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vocabulary_improvements: Vec<VocabSuggestion>,
}

impl Evaluation {
    /// Reject scores outside 0..=9 and snap the rest to half bands.
    pub fn normalize_bands(&mut self) -> Result<(), String> {
        let labelled = [
            ("taskAchievement", &mut self.criteria.task),
            ("coherence", &mut self.criteria.coherence),
            ("lexical", &mut self.criteria.lexical),
            ("grammar", &mut self.criteria.grammar),
            ("overallBand", &mut self.overall_band),
        ];
        for (name, score) in labelled {
            if !band::in_range(*score) {
                return Err(format!("{name} out of range: {score}"));
            }
            *score = band::round_to_half(*score);
        }
        Ok(())
    }

    /// Distance between the reported overall band and the rounded mean of
    /// the four criteria.
    pub fn band_drift(&self) -> f64 {
        (self.overall_band - self.criteria.mean_band()).abs()
    }

    pub fn has_enrichment(&self) -> bool {
        !self.band_upgrades.is_empty()
            || !self.error_patterns.is_empty()
            || !self.vocabulary_improvements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASK2_RESPONSE: &str = r#"{
        "criteria": {"taskResponse": 7.0, "coherence": 6.5, "lexical": 7.0, "grammar": 6.0},
        "overallBand": 6.5,
        "feedback": {
            "strengths": ["Clear thesis"],
            "improvements": ["Vary linking words"],
            "tips": ["Plan before writing"]
        },
        "modelAnswer": "Model essay text."
    }"#;

    #[test]
    fn parses_task_response_alias() {
        let eval: Evaluation = serde_json::from_str(TASK2_RESPONSE).unwrap();
        assert_eq!(eval.criteria.task, 7.0);
        assert_eq!(eval.overall_band, 6.5);
        assert_eq!(eval.word_count, 0);
        assert!(!eval.word_count_penalty);
        assert!(!eval.has_enrichment());
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let body = r#"{"criteria": {"taskAchievement": 7, "coherence": 7, "lexical": 7, "grammar": 7}}"#;
        assert!(serde_json::from_str::<Evaluation>(body).is_err());
    }

    #[test]
    fn parses_enrichment_fields() {
        let body = r#"{
            "criteria": {"taskAchievement": 6, "coherence": 6, "lexical": 6, "grammar": 6},
            "overallBand": 6,
            "feedback": {"strengths": [], "improvements": [], "tips": []},
            "modelAnswer": "x",
            "errorPatterns": [{
                "type": "grammar",
                "description": "Article omission",
                "examples": ["in the UK and France"],
                "frequency": "frequent",
                "severity": "moderate"
            }],
            "vocabularyImprovements": [{
                "original": "big",
                "alternatives": ["substantial"],
                "context": "a big increase",
                "reason": "informal tone"
            }],
            "bandUpgrades": [{"currentBand": 6, "targetBand": 6.5, "suggestions": ["Add an overview"]}]
        }"#;
        let eval: Evaluation = serde_json::from_str(body).unwrap();
        assert!(eval.has_enrichment());
        assert_eq!(eval.error_patterns[0].kind, ErrorKind::Grammar);
        assert_eq!(eval.error_patterns[0].frequency, Frequency::Frequent);
        assert_eq!(eval.band_upgrades[0].target_band, 6.5);
    }

    #[test]
    fn normalize_snaps_to_half_bands() {
        let mut eval: Evaluation = serde_json::from_str(TASK2_RESPONSE).unwrap();
        eval.criteria.grammar = 6.3;
        eval.normalize_bands().unwrap();
        assert_eq!(eval.criteria.grammar, 6.5);
    }

    #[test]
    fn normalize_rejects_out_of_range() {
        let mut eval: Evaluation = serde_json::from_str(TASK2_RESPONSE).unwrap();
        eval.overall_band = 11.0;
        let err = eval.normalize_bands().unwrap_err();
        assert!(err.contains("overallBand"));
    }

    #[test]
    fn criteria_mean_band() {
        let eval: Evaluation = serde_json::from_str(TASK2_RESPONSE).unwrap();
        assert_eq!(eval.criteria.mean_band(), 6.5);
    }

    #[test]
    fn band_drift_against_criteria_mean() {
        let mut eval: Evaluation = serde_json::from_str(TASK2_RESPONSE).unwrap();
        assert_eq!(eval.band_drift(), 0.0);
        eval.overall_band = 8.0;
        assert_eq!(eval.band_drift(), 1.5);
    }
}
