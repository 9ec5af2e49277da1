use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "Task 1")]
    Task1,
    #[serde(rename = "Task 2")]
    Task2,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Task1 => "Task 1",
            TaskKind::Task2 => "Task 2",
        }
    }

    pub fn time_allowance_secs(self) -> u32 {
        match self {
            TaskKind::Task1 => 1200,
            TaskKind::Task2 => 2400,
        }
    }

    pub fn min_words(self) -> usize {
        match self {
            TaskKind::Task1 => 150,
            TaskKind::Task2 => 250,
        }
    }

    /// Target length range the grader's model answer is asked to hit.
    pub fn ideal_words(self) -> RangeInclusive<usize> {
        match self {
            TaskKind::Task1 => 160..=190,
            TaskKind::Task2 => 260..=290,
        }
    }

    /// Beyond this an essay risks irrelevance or running out of time.
    pub fn recommended_max_words(self) -> usize {
        match self {
            TaskKind::Task1 => 220,
            TaskKind::Task2 => 320,
        }
    }

    /// Label for the first criterion, which differs between the two tasks.
    pub fn first_criterion_label(self) -> &'static str {
        match self {
            TaskKind::Task1 => "Task Achievement",
            TaskKind::Task2 => "Task Response",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskCategory {
    #[serde(rename = "Bar Chart")]
    BarChart,
    #[serde(rename = "Line Graph")]
    LineGraph,
    Map,
    Process,
    Opinion,
    Discussion,
    #[serde(rename = "Problem/Solution")]
    ProblemSolution,
}

impl TaskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::BarChart => "Bar Chart",
            TaskCategory::LineGraph => "Line Graph",
            TaskCategory::Map => "Map",
            TaskCategory::Process => "Process",
            TaskCategory::Opinion => "Opinion",
            TaskCategory::Discussion => "Discussion",
            TaskCategory::ProblemSolution => "Problem/Solution",
        }
    }
}

/// Immutable descriptor of one exam question.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExamTask {
    pub id: String,
    pub kind: TaskKind,
    pub category: TaskCategory,
    pub prompt: String,
    /// Ground-truth figures for Task 1 visuals, forwarded to the grader.
    #[serde(default)]
    pub data_outline: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub model_answer: Option<String>,
}

impl ExamTask {
    pub fn time_allowance_secs(&self) -> u32 {
        self.kind.time_allowance_secs()
    }
}

/// Hint shown under the editor while writing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthHint {
    BelowMinimum,
    Ideal,
    Long,
}

impl LengthHint {
    pub fn classify(kind: TaskKind, words: usize) -> Self {
        if words < kind.min_words() {
            LengthHint::BelowMinimum
        } else if words <= *kind.ideal_words().end() {
            LengthHint::Ideal
        } else {
            LengthHint::Long
        }
    }

    pub fn label(self, kind: TaskKind) -> String {
        match (self, kind) {
            (LengthHint::BelowMinimum, _) => format!("Below Min ({})", kind.min_words()),
            (LengthHint::Ideal, _) => "Perfect Length".to_string(),
            (LengthHint::Long, TaskKind::Task1) => "Long (Risk of irrelevance)".to_string(),
            (LengthHint::Long, TaskKind::Task2) => "Long (Time warning)".to_string(),
        }
    }
}

/// Length verdict attached to a graded essay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordCountStatus {
    Unknown,
    BelowMinimum,
    Optimal,
    Acceptable,
    OverRecommended,
}

impl WordCountStatus {
    pub fn classify(kind: TaskKind, words: usize) -> Self {
        if words == 0 {
            WordCountStatus::Unknown
        } else if words < kind.min_words() {
            WordCountStatus::BelowMinimum
        } else if kind.ideal_words().contains(&words) {
            WordCountStatus::Optimal
        } else if words > kind.recommended_max_words() {
            WordCountStatus::OverRecommended
        } else {
            WordCountStatus::Acceptable
        }
    }

    pub fn label(self, kind: TaskKind) -> String {
        match self {
            WordCountStatus::Unknown => "Unknown".to_string(),
            WordCountStatus::BelowMinimum => format!("Below minimum ({})", kind.min_words()),
            WordCountStatus::Optimal => "Optimal range".to_string(),
            WordCountStatus::Acceptable => "Acceptable".to_string(),
            WordCountStatus::OverRecommended => "Over recommended".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowances_and_minimums() {
        assert_eq!(TaskKind::Task1.time_allowance_secs(), 1200);
        assert_eq!(TaskKind::Task2.time_allowance_secs(), 2400);
        assert_eq!(TaskKind::Task1.min_words(), 150);
        assert_eq!(TaskKind::Task2.min_words(), 250);
        assert_eq!(TaskKind::Task1.ideal_words(), 160..=190);
        assert_eq!(TaskKind::Task2.ideal_words(), 260..=290);
    }

    #[test]
    fn test_task_kind_serde_names() {
        let json = serde_json::to_string(&TaskKind::Task1).unwrap();
        assert_eq!(json, "\"Task 1\"");
        let kind: TaskKind = serde_json::from_str("\"Task 2\"").unwrap();
        assert_eq!(kind, TaskKind::Task2);
    }

    #[test]
    fn test_length_hint() {
        assert_eq!(LengthHint::classify(TaskKind::Task1, 149), LengthHint::BelowMinimum);
        assert_eq!(LengthHint::classify(TaskKind::Task1, 150), LengthHint::Ideal);
        assert_eq!(LengthHint::classify(TaskKind::Task1, 190), LengthHint::Ideal);
        assert_eq!(LengthHint::classify(TaskKind::Task1, 191), LengthHint::Long);
        assert_eq!(
            LengthHint::Long.label(TaskKind::Task2),
            "Long (Time warning)"
        );
    }

    #[test]
    fn test_word_count_status() {
        let k = TaskKind::Task2;
        assert_eq!(WordCountStatus::classify(k, 0), WordCountStatus::Unknown);
        assert_eq!(WordCountStatus::classify(k, 249), WordCountStatus::BelowMinimum);
        assert_eq!(WordCountStatus::classify(k, 255), WordCountStatus::Acceptable);
        assert_eq!(WordCountStatus::classify(k, 270), WordCountStatus::Optimal);
        assert_eq!(WordCountStatus::classify(k, 300), WordCountStatus::Acceptable);
        assert_eq!(WordCountStatus::classify(k, 321), WordCountStatus::OverRecommended);
    }
}
