use std::collections::HashSet;

use rust_embed::Embed;
use serde::Deserialize;
use thiserror::Error;

use crate::exam::task::ExamTask;
use crate::session::input;

#[derive(Embed)]
#[folder = "assets/tasks/"]
struct TaskAssets;

const DRILLS_FILE: &str = "drills.toml";
const EXAM_FILE: &str = "exam.toml";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("bundled asset {0} is missing")]
    MissingAsset(&'static str),
    #[error("bundled asset {0} is not valid UTF-8")]
    Encoding(&'static str),
    #[error("failed to parse {file}: {source}")]
    Parse {
        file: &'static str,
        #[source]
        source: toml::de::Error,
    },
    #[error("duplicate id {0}")]
    DuplicateId(String),
    #[error("drill {0} has no text")]
    EmptyDrill(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum DrillCategory {
    #[serde(rename = "Sentence Structure")]
    SentenceStructure,
    #[serde(rename = "Paragraph Cohesion")]
    ParagraphCohesion,
    #[serde(rename = "Full Essay")]
    FullEssay,
}

impl DrillCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DrillCategory::SentenceStructure => "Sentence Structure",
            DrillCategory::ParagraphCohesion => "Paragraph Cohesion",
            DrillCategory::FullEssay => "Full Essay",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// Reference text for one typing drill.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TrainingDrill {
    pub id: String,
    pub title: String,
    pub category: DrillCategory,
    pub difficulty: Difficulty,
    pub text: String,
}

#[derive(Deserialize)]
struct DrillFile {
    #[serde(default)]
    drill: Vec<TrainingDrill>,
}

#[derive(Deserialize)]
struct ExamFile {
    #[serde(default)]
    task: Vec<ExamTask>,
}

pub struct Catalog {
    pub drills: Vec<TrainingDrill>,
    pub exam_tasks: Vec<ExamTask>,
}

impl Catalog {
    pub fn bundled() -> Result<Self, CatalogError> {
        let drills = asset_text(DRILLS_FILE)?;
        let exam = asset_text(EXAM_FILE)?;
        Self::from_toml(&drills, &exam)
    }

    pub fn from_toml(drills_src: &str, exam_src: &str) -> Result<Self, CatalogError> {
        let drills: DrillFile = toml::from_str(drills_src).map_err(|source| CatalogError::Parse {
            file: DRILLS_FILE,
            source,
        })?;
        let exam: ExamFile = toml::from_str(exam_src).map_err(|source| CatalogError::Parse {
            file: EXAM_FILE,
            source,
        })?;

        let mut seen = HashSet::new();
        let mut drill_list = Vec::with_capacity(drills.drill.len());
        for mut drill in drills.drill {
            if !seen.insert(drill.id.clone()) {
                return Err(CatalogError::DuplicateId(drill.id));
            }
            // Multi-line TOML strings keep a trailing newline nobody should have to type.
            drill.text = input::normalize(drill.text.trim_end()).into_owned();
            if drill.text.is_empty() {
                return Err(CatalogError::EmptyDrill(drill.id));
            }
            drill_list.push(drill);
        }
        for task in &exam.task {
            if !seen.insert(task.id.clone()) {
                return Err(CatalogError::DuplicateId(task.id.clone()));
            }
        }

        Ok(Self {
            drills: drill_list,
            exam_tasks: exam.task,
        })
    }

    pub fn drill(&self, id: &str) -> Option<&TrainingDrill> {
        self.drills.iter().find(|d| d.id == id)
    }
}

fn asset_text(name: &'static str) -> Result<String, CatalogError> {
    let file = TaskAssets::get(name).ok_or(CatalogError::MissingAsset(name))?;
    String::from_utf8(file.data.into_owned()).map_err(|_| CatalogError::Encoding(name))
}
