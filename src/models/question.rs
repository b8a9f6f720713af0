use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i32,
    /// Rich text; rendering is the presentation layer's problem.
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default = "default_points")]
    pub points: i32,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

fn default_points() -> i32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    MultipleSelect,
    TrueFalse,
    ShortAnswer,
    Essay,
    Matching,
    FillBlank,
}

impl QuestionType {
    /// Types answered as free text into `answer_text`.
    pub fn is_text_entry(self) -> bool {
        matches!(
            self,
            QuestionType::TrueFalse
                | QuestionType::ShortAnswer
                | QuestionType::Essay
                | QuestionType::FillBlank
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub id: i32,
    pub text: String,
    #[serde(default)]
    pub order: i32,
}

/// One side of a matching question, derived from the authored
/// `"left::right"` choice text. Both columns are indexed 0..n-1 and ordered
/// independently of each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingItem {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSettings {
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default)]
    pub shuffle_choices: bool,
    #[serde(default)]
    pub show_correct_answers: bool,
    #[serde(default)]
    pub pass_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityMeta {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Everything the loader returns for one assessment. Immutable for the
/// lifetime of a session.
#[derive(Debug, Clone)]
pub struct QuestionSet {
    pub activity: ActivityMeta,
    pub questions: Vec<Question>,
    pub settings: QuizSettings,
}
