use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// left index -> right index. Kept injective by `MatchingPairResolver`;
/// `BTreeMap` so snapshots serialize in a stable order.
pub type MatchingPairs = BTreeMap<usize, usize>;

/// The answer to one question. A single struct rather than an enum so a
/// partial update merges into the record instead of replacing it: each
/// question type only ever populates its own field, but a matching update
/// must not erase anything else already recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_id: Option<i32>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub selected_choice_ids: BTreeSet<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub matching_pairs: MatchingPairs,
}

impl Answer {
    pub fn apply(&mut self, patch: AnswerPatch) {
        match patch {
            AnswerPatch::Choice(id) => self.choice_id = Some(id),
            AnswerPatch::SelectedChoices(ids) => self.selected_choice_ids = ids,
            AnswerPatch::Text(text) => self.answer_text = Some(text),
            AnswerPatch::MatchingPairs(pairs) => self.matching_pairs = pairs,
        }
    }
}

/// One field's worth of update, merged into the stored `Answer`.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerPatch {
    Choice(i32),
    SelectedChoices(BTreeSet<i32>),
    Text(String),
    MatchingPairs(MatchingPairs),
}

/// The unit of autosave and of submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: i32,
    #[serde(flatten)]
    pub answer: Answer,
    pub answered_at: DateTime<Utc>,
    /// Accumulated seconds the test-taker has spent on this question.
    #[serde(default)]
    pub time_spent_seconds: u32,
}
