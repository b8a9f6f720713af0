mod common;

use common::*;
use quiz_session::{Error, LinkOutcome, QuizSession};
use std::sync::Arc;

fn matching_backend() -> Arc<RecordingBackend> {
    let questions = vec![
        matching_question(
            1,
            &[
                ("cat", "chat"),
                ("dog", "chien"),
                ("bird", "oiseau"),
                ("fish", "poisson"),
            ],
        ),
        short_answer_question(2),
    ];
    Arc::new(RecordingBackend::new(questions, plain_settings()))
}

#[tokio::test]
async fn conflict_is_rejected_and_resolved_by_unlink() {
    let backend = matching_backend();
    let session = QuizSession::new(backend.clone(), backend.assessment_id, test_config());
    session.start().await.unwrap();

    // Link 0 -> 2.
    session.begin_link(1, 0).unwrap();
    assert_eq!(session.complete_link(1, 0, 2).unwrap(), LinkOutcome::Linked);

    // 1 -> 2 is rejected: right node 2 already belongs to left 0.
    session.begin_link(1, 1).unwrap();
    let outcome = session.complete_link(1, 1, 2).unwrap();
    assert_eq!(outcome, LinkOutcome::Conflict);
    assert!(!outcome.accepted());
    let pairs = session.matching_pairs(1).unwrap();
    assert_eq!(pairs.get(&0), Some(&2));
    assert_eq!(pairs.get(&1), None);

    // Unlink 0, then 1 -> 2 succeeds.
    session.unlink(1, 0).unwrap();
    assert_eq!(session.pending_link(1), Some(0));
    session.cancel_link(1).unwrap();
    session.begin_link(1, 1).unwrap();
    assert_eq!(session.complete_link(1, 1, 2).unwrap(), LinkOutcome::Linked);

    let pairs = session.matching_pairs(1).unwrap();
    assert_eq!(pairs.get(&1), Some(&2));
    assert_eq!(pairs.get(&0), None);
    assert_eq!(pairs.len(), 1);
}

#[tokio::test]
async fn pairs_flow_into_the_submission_snapshot() {
    let backend = matching_backend();
    let session = QuizSession::new(backend.clone(), backend.assessment_id, test_config());
    session.start().await.unwrap();

    for left in 0..4 {
        session.begin_link(1, left).unwrap();
        assert_eq!(
            session.complete_link(1, left, (left + 1) % 4).unwrap(),
            LinkOutcome::Linked
        );
    }
    assert_eq!(session.progress(), (1, 2));

    session.submit().await.unwrap();
    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    let record = submissions[0].iter().find(|r| r.question_id == 1).unwrap();
    assert_eq!(record.answer.matching_pairs.len(), 4);
    let rights: std::collections::BTreeSet<usize> =
        record.answer.matching_pairs.values().copied().collect();
    assert_eq!(rights.len(), 4, "submitted pairs must be injective");
}

#[tokio::test]
async fn rejected_attempts_do_not_dirty_the_answer() {
    let backend = matching_backend();
    let session = QuizSession::new(backend.clone(), backend.assessment_id, test_config());
    session.start().await.unwrap();

    session.begin_link(1, 0).unwrap();
    session.complete_link(1, 0, 1).unwrap();
    let before = session.matching_pairs(1).unwrap();

    // A conflicting attempt changes nothing in store or resolver.
    session.begin_link(1, 2).unwrap();
    assert_eq!(session.complete_link(1, 2, 1).unwrap(), LinkOutcome::Conflict);
    assert_eq!(session.matching_pairs(1).unwrap(), before);

    session.submit().await.unwrap();
    let record = backend.submissions()[0]
        .iter()
        .find(|r| r.question_id == 1)
        .cloned()
        .unwrap();
    assert_eq!(record.answer.matching_pairs, before);
}

#[tokio::test]
async fn gesture_ops_on_non_matching_question_are_invalid() {
    let backend = matching_backend();
    let session = QuizSession::new(backend.clone(), backend.assessment_id, test_config());
    session.start().await.unwrap();

    let err = session.begin_link(2, 0).unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    let err = session.complete_link(99, 0, 0).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn matching_columns_are_prepared_for_rendering() {
    let backend = matching_backend();
    let session = QuizSession::new(backend.clone(), backend.assessment_id, test_config());
    session.start().await.unwrap();

    let prepared = session.question(0).unwrap();
    assert!(prepared.is_matching());
    let left: Vec<&str> = prepared.left_items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(left, vec!["cat", "dog", "bird", "fish"]);
    assert_eq!(prepared.right_items.len(), 4);

    // Right column holds every translation exactly once, whatever the order.
    let mut rights: Vec<&str> = prepared.right_items.iter().map(|i| i.text.as_str()).collect();
    rights.sort_unstable();
    assert_eq!(rights, vec!["chat", "chien", "oiseau", "poisson"]);

    // Navigating away and back never re-shuffles.
    let first_order: Vec<String> = prepared.right_items.iter().map(|i| i.text.clone()).collect();
    session.navigate(1);
    session.navigate(0);
    let again: Vec<String> = session
        .question(0)
        .unwrap()
        .right_items
        .iter()
        .map(|i| i.text.clone())
        .collect();
    assert_eq!(first_order, again);
}
