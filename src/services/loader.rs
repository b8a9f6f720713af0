use crate::backend::AssessmentBackend;
use crate::error::Result;
use crate::models::question::QuestionSet;
use uuid::Uuid;

/// Fetches the full assessment definition: activity metadata, questions and
/// settings. Pure data acquisition; errors are surfaced to the caller and
/// the whole load is retried from scratch if desired.
pub async fn load<B: AssessmentBackend>(backend: &B, assessment_id: Uuid) -> Result<QuestionSet> {
    let activity = backend.fetch_activity(assessment_id).await?;
    let mut questions = backend.fetch_questions(assessment_id).await?;
    let settings = backend.fetch_settings(assessment_id).await?;

    // Authored order, regardless of how the transport returned them.
    questions.sort_by_key(|q| q.order);
    for q in &mut questions {
        q.choices.sort_by_key(|c| c.order);
    }

    tracing::debug!(
        assessment_id = %assessment_id,
        questions = questions.len(),
        "loaded question set"
    );

    Ok(QuestionSet {
        activity,
        questions,
        settings,
    })
}
