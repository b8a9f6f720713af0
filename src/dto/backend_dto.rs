use crate::models::answer::AnswerRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAnswerRequest {
    pub question_id: i32,
    pub answer: serde_json::Value,
    pub time_spent_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAnswerResponse {
    pub saved: bool,
    pub question_id: i32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSessionRequest {
    pub answers: Vec<SaveAnswerRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSessionResponse {
    pub attempt_id: uuid::Uuid,
    pub status: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub attempt_id: uuid::Uuid,
    pub status: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl SaveAnswerRequest {
    pub fn from_record(record: &AnswerRecord) -> crate::error::Result<Self> {
        Ok(Self {
            question_id: record.question_id,
            answer: serde_json::to_value(&record.answer)?,
            time_spent_seconds: record.time_spent_seconds,
        })
    }
}
