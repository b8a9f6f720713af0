use crate::models::question::{Choice, MatchingItem, Question, QuestionType, QuizSettings};
use rand::seq::SliceRandom;
use rand::Rng;

/// A question as the session presents it: choice order fixed for the whole
/// session, matching columns already split and ordered. Built exactly once
/// at session start; navigation re-reads this, it never re-shuffles.
#[derive(Debug, Clone)]
pub struct PreparedQuestion {
    pub question: Question,
    pub choices: Vec<Choice>,
    /// Matching questions only: left column in authored order.
    pub left_items: Vec<MatchingItem>,
    /// Matching questions only: right column, independently shuffled.
    pub right_items: Vec<MatchingItem>,
}

impl PreparedQuestion {
    pub fn id(&self) -> i32 {
        self.question.id
    }

    pub fn is_matching(&self) -> bool {
        self.question.question_type == QuestionType::Matching
    }
}

/// One-shot session-start preparation per the assessment settings.
pub fn prepare<R: Rng>(
    questions: Vec<Question>,
    settings: &QuizSettings,
    rng: &mut R,
) -> Vec<PreparedQuestion> {
    let mut questions = questions;
    if settings.shuffle_questions {
        questions.shuffle(rng);
    }

    questions
        .into_iter()
        .map(|question| prepare_question(question, settings, rng))
        .collect()
}

fn prepare_question<R: Rng>(
    question: Question,
    settings: &QuizSettings,
    rng: &mut R,
) -> PreparedQuestion {
    let mut choices = question.choices.clone();

    if question.question_type == QuestionType::Matching {
        let (left_items, right_items) = split_matching_columns(&choices, rng);
        return PreparedQuestion {
            question,
            choices,
            left_items,
            right_items,
        };
    }

    if settings.shuffle_choices {
        choices.shuffle(rng);
    }

    PreparedQuestion {
        question,
        choices,
        left_items: Vec::new(),
        right_items: Vec::new(),
    }
}

/// Splits authored `"left::right"` choice texts into the two columns. The
/// left column keeps authored order; the right column is always a fresh
/// permutation so the pairing is never given away by position. Splits on the
/// first `"::"` only, so a right-hand text may itself contain `"::"`.
fn split_matching_columns<R: Rng>(
    choices: &[Choice],
    rng: &mut R,
) -> (Vec<MatchingItem>, Vec<MatchingItem>) {
    let mut right_texts: Vec<String> = Vec::with_capacity(choices.len());
    let left_items: Vec<MatchingItem> = choices
        .iter()
        .enumerate()
        .map(|(index, choice)| {
            let (left, right) = match choice.text.split_once("::") {
                Some((l, r)) => (l.to_string(), r.to_string()),
                // No separator: keep the item so authored counts stay stable.
                None => (choice.text.clone(), String::new()),
            };
            right_texts.push(right);
            MatchingItem { index, text: left }
        })
        .collect();

    right_texts.shuffle(rng);
    let right_items = right_texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| MatchingItem { index, text })
        .collect();

    (left_items, right_items)
}
