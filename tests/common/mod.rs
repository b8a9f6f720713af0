#![allow(dead_code)]

use quiz_session::{
    ActivityMeta, AnswerRecord, AssessmentBackend, Choice, EngineConfig, Error, Question,
    QuestionType, QuizSettings, Result,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// In-memory fake of the external collaborator. Records every call and can
/// be told to fail loads, saves, or a number of submissions.
pub struct RecordingBackend {
    pub assessment_id: Uuid,
    questions: Vec<Question>,
    settings: QuizSettings,
    fail_load: AtomicBool,
    fail_saves: AtomicBool,
    fail_submits: AtomicUsize,
    saved: Mutex<Vec<AnswerRecord>>,
    submissions: Mutex<Vec<Vec<AnswerRecord>>>,
    start_signals: AtomicUsize,
}

impl RecordingBackend {
    pub fn new(questions: Vec<Question>, settings: QuizSettings) -> Self {
        Self {
            assessment_id: Uuid::new_v4(),
            questions,
            settings,
            fail_load: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
            fail_submits: AtomicUsize::new(0),
            saved: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            start_signals: AtomicUsize::new(0),
        }
    }

    pub fn fail_load(&self) {
        self.fail_load.store(true, Ordering::SeqCst);
    }

    pub fn set_saves_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::SeqCst);
    }

    /// The next `count` submissions will fail.
    pub fn fail_next_submits(&self, count: usize) {
        self.fail_submits.store(count, Ordering::SeqCst);
    }

    pub fn saved_records(&self) -> Vec<AnswerRecord> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_call_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn submissions(&self) -> Vec<Vec<AnswerRecord>> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn start_signal_count(&self) -> usize {
        self.start_signals.load(Ordering::SeqCst)
    }
}

impl AssessmentBackend for RecordingBackend {
    async fn fetch_activity(&self, id: Uuid) -> Result<ActivityMeta> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".to_string()));
        }
        if id != self.assessment_id {
            return Err(Error::NotFound(format!("assessment {}", id)));
        }
        Ok(ActivityMeta {
            id,
            title: "Unit 3 Quiz".to_string(),
            max_score: Some(10.0),
            due_date: None,
        })
    }

    async fn fetch_questions(&self, id: Uuid) -> Result<Vec<Question>> {
        if id != self.assessment_id {
            return Err(Error::NotFound(format!("assessment {}", id)));
        }
        Ok(self.questions.clone())
    }

    async fn fetch_settings(&self, id: Uuid) -> Result<QuizSettings> {
        if id != self.assessment_id {
            return Err(Error::NotFound(format!("assessment {}", id)));
        }
        Ok(self.settings.clone())
    }

    async fn signal_start(&self, _id: Uuid) -> Result<()> {
        self.start_signals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save_answer(&self, _id: Uuid, record: AnswerRecord) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Network("save endpoint unavailable".to_string()));
        }
        self.saved.lock().unwrap().push(record);
        Ok(())
    }

    async fn submit_session(&self, _id: Uuid, answers: Vec<AnswerRecord>) -> Result<()> {
        let remaining = self.fail_submits.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_submits.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::Submission("gateway timeout".to_string()));
        }
        self.submissions.lock().unwrap().push(answers);
        Ok(())
    }
}

pub fn plain_settings() -> QuizSettings {
    QuizSettings {
        time_limit_minutes: None,
        max_attempts: Some(1),
        shuffle_questions: false,
        shuffle_choices: false,
        show_correct_answers: false,
        pass_threshold: Some(60.0),
    }
}

pub fn timed_settings(minutes: u32) -> QuizSettings {
    QuizSettings {
        time_limit_minutes: Some(minutes),
        ..plain_settings()
    }
}

pub fn short_answer_question(id: i32) -> Question {
    Question {
        id,
        text: format!("Question {}", id),
        question_type: QuestionType::ShortAnswer,
        points: 2,
        order: id,
        image_ref: None,
        choices: Vec::new(),
    }
}

pub fn multiple_choice_question(id: i32) -> Question {
    Question {
        id,
        text: format!("Question {}", id),
        question_type: QuestionType::MultipleChoice,
        points: 1,
        order: id,
        image_ref: None,
        choices: (1..=4)
            .map(|c| Choice {
                id: id * 10 + c,
                text: format!("Option {}", c),
                order: c,
            })
            .collect(),
    }
}

pub fn matching_question(id: i32, pairs: &[(&str, &str)]) -> Question {
    Question {
        id,
        text: format!("Match the terms ({})", id),
        question_type: QuestionType::Matching,
        points: pairs.len() as i32,
        order: id,
        image_ref: None,
        choices: pairs
            .iter()
            .enumerate()
            .map(|(i, (left, right))| Choice {
                id: id * 10 + i as i32,
                text: format!("{}::{}", left, right),
                order: i as i32,
            })
            .collect(),
    }
}

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Engine tuning used by the tests: production-shaped intervals, driven by
/// tokio's paused clock where timing matters.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        autosave_interval_secs: 30,
        timer_tick: Duration::from_secs(1),
        request_timeout_secs: 5,
    }
}
