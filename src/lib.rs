//! In-process timed-assessment delivery engine: session lifecycle, countdown
//! with forced submission, periodic answer autosave, and matching-question
//! pair resolution. Persistence and transport live behind the
//! [`backend::AssessmentBackend`] trait; the presentation layer drives the
//! session through [`services::session::QuizSession`].

pub mod backend;
pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;

pub use backend::{AssessmentBackend, HttpBackend};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use models::answer::{Answer, AnswerPatch, AnswerRecord, MatchingPairs};
pub use models::question::{
    ActivityMeta, Choice, MatchingItem, Question, QuestionSet, QuestionType, QuizSettings,
};
pub use services::autosave::AutosaveStatus;
pub use services::matching::{LinkOutcome, MatchingPairResolver};
pub use services::session::{QuizSession, SessionPhase, SubmitOutcome};
pub use services::shuffle::PreparedQuestion;
