use crate::backend::AssessmentBackend;
use crate::services::answer_store::AnswerStore;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Tri-state persistence badge observed by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutosaveStatus {
    Saved,
    Saving,
    Unsaved,
}

/// Periodic best-effort flush of the answer store to the backend, one
/// `save_answer` write per answered question per cycle. Never blocks user
/// interaction, never retries mid-interval; a failed cycle downgrades the
/// status badge and the next scheduled tick simply tries again.
pub struct AutoSaveScheduler {
    active: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl AutoSaveScheduler {
    pub fn start<B: AssessmentBackend>(
        interval: Duration,
        store: Arc<Mutex<AnswerStore>>,
        backend: Arc<B>,
        assessment_id: Uuid,
        status: Arc<watch::Sender<AutosaveStatus>>,
    ) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let flag = active.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !flag.load(Ordering::SeqCst) {
                    return;
                }
                flush_once(&store, backend.as_ref(), assessment_id, &status).await;
            }
        });

        Self { active, handle }
    }

    /// Idempotent; called from both submission paths.
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.handle.abort();
    }
}

impl Drop for AutoSaveScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One flush cycle over a copy-on-read snapshot. An empty store is a no-op:
/// no network call and no status change. Returns whether every write landed.
pub async fn flush_once<B: AssessmentBackend>(
    store: &Mutex<AnswerStore>,
    backend: &B,
    assessment_id: Uuid,
    status: &watch::Sender<AutosaveStatus>,
) -> bool {
    let snapshot = {
        let store = store.lock().expect("answer store poisoned");
        store.snapshot()
    };
    if snapshot.is_empty() {
        return true;
    }

    let _ = status.send(AutosaveStatus::Saving);
    let mut all_saved = true;
    for record in snapshot {
        let question_id = record.question_id;
        if let Err(e) = backend.save_answer(assessment_id, record).await {
            tracing::warn!(
                assessment_id = %assessment_id,
                question_id,
                error = %e,
                "autosave write failed"
            );
            all_saved = false;
        }
    }

    let _ = status.send(if all_saved {
        AutosaveStatus::Saved
    } else {
        AutosaveStatus::Unsaved
    });
    tracing::debug!(assessment_id = %assessment_id, all_saved, "autosave cycle finished");
    all_saved
}
