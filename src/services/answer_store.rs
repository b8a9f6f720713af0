use crate::models::answer::{Answer, AnswerPatch, AnswerRecord};
use chrono::Utc;
use std::collections::BTreeMap;

/// One answer record per question id, whatever the question type. The single
/// mutable resource of a session: one writer (the interaction handler), two
/// readers (autosave and submission) that only ever take snapshots.
#[derive(Debug, Default)]
pub struct AnswerStore {
    records: BTreeMap<i32, AnswerRecord>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `patch` into the record for `question_id`, creating the record
    /// on first interaction. Never replaces the whole record: a matching
    /// update leaves other fields of the same answer intact.
    pub fn set(&mut self, question_id: i32, patch: AnswerPatch) {
        let record = self
            .records
            .entry(question_id)
            .or_insert_with(|| AnswerRecord {
                question_id,
                answer: Answer::default(),
                answered_at: Utc::now(),
                time_spent_seconds: 0,
            });
        record.answer.apply(patch);
        record.answered_at = Utc::now();
    }

    pub fn add_time_spent(&mut self, question_id: i32, seconds: u32) {
        if let Some(record) = self.records.get_mut(&question_id) {
            record.time_spent_seconds = record.time_spent_seconds.saturating_add(seconds);
        }
    }

    pub fn get(&self, question_id: i32) -> Option<&AnswerRecord> {
        self.records.get(&question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Deep copy in question-id order. Later mutation of the store never
    /// reaches into an already-taken snapshot.
    pub fn snapshot(&self) -> Vec<AnswerRecord> {
        self.records.values().cloned().collect()
    }
}
