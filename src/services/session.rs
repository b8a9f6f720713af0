use crate::backend::AssessmentBackend;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::models::answer::AnswerPatch;
use crate::models::question::{ActivityMeta, QuizSettings};
use crate::services::answer_store::AnswerStore;
use crate::services::autosave::{flush_once, AutoSaveScheduler, AutosaveStatus};
use crate::services::loader;
use crate::services::matching::{LinkOutcome, MatchingPairResolver};
use crate::services::shuffle::{self, PreparedQuestion};
use crate::services::timer::SessionTimer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted { submitted_at: DateTime<Utc> },
    /// The session was already submitted; no network call was made.
    AlreadySubmitted,
}

struct Inner {
    phase: SessionPhase,
    prepared: Vec<PreparedQuestion>,
    resolvers: HashMap<i32, MatchingPairResolver>,
    activity: Option<ActivityMeta>,
    settings: Option<QuizSettings>,
    current_index: usize,
    viewing_since: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
    expired: bool,
    submit_in_flight: bool,
    last_submit_error: Option<String>,
    timer: Option<SessionTimer>,
    autosave: Option<AutoSaveScheduler>,
}

impl Inner {
    fn new() -> Self {
        Self {
            phase: SessionPhase::NotStarted,
            prepared: Vec::new(),
            resolvers: HashMap::new(),
            activity: None,
            settings: None,
            current_index: 0,
            viewing_since: None,
            started_at: None,
            submitted_at: None,
            expired: false,
            submit_in_flight: false,
            last_submit_error: None,
            timer: None,
            autosave: None,
        }
    }

    fn ensure_in_progress(&self) -> Result<()> {
        match self.phase {
            SessionPhase::InProgress => Ok(()),
            SessionPhase::NotStarted => {
                Err(Error::InvalidState("session has not started".to_string()))
            }
            SessionPhase::Submitted => {
                Err(Error::InvalidState("session already submitted".to_string()))
            }
        }
    }
}

/// One test-taking attempt, from `start()` to `Submitted`. Owns the session
/// phase, the prepared (post-shuffle) question order, the answer store and
/// the two periodic triggers; a new attempt requires a fresh instance.
pub struct QuizSession<B: AssessmentBackend> {
    backend: Arc<B>,
    assessment_id: Uuid,
    config: EngineConfig,
    inner: Arc<Mutex<Inner>>,
    store: Arc<Mutex<AnswerStore>>,
    status_tx: Arc<watch::Sender<AutosaveStatus>>,
    status_rx: watch::Receiver<AutosaveStatus>,
    time_tx: Arc<watch::Sender<Option<u32>>>,
    time_rx: watch::Receiver<Option<u32>>,
}

impl<B: AssessmentBackend> QuizSession<B> {
    pub fn new(backend: Arc<B>, assessment_id: Uuid, config: EngineConfig) -> Self {
        let (status_tx, status_rx) = watch::channel(AutosaveStatus::Saved);
        let (time_tx, time_rx) = watch::channel(None);
        Self {
            backend,
            assessment_id,
            config,
            inner: Arc::new(Mutex::new(Inner::new())),
            store: Arc::new(Mutex::new(AnswerStore::new())),
            status_tx: Arc::new(status_tx),
            status_rx,
            time_tx: Arc::new(time_tx),
            time_rx,
        }
    }

    /// The machine never prompts for confirmation itself; the presentation
    /// layer reads this capability flag and asks before calling `submit`.
    pub fn requires_confirmation(&self) -> bool {
        true
    }

    /// NotStarted -> InProgress: loads and prepares the question set, starts
    /// the countdown if a time limit is configured, starts autosave, and
    /// fires the attempt-logging start signal without waiting on it. A load
    /// failure leaves the session in NotStarted for a from-scratch retry.
    pub async fn start(&self) -> Result<()> {
        {
            let inner = self.lock_inner();
            if inner.phase != SessionPhase::NotStarted {
                return Err(Error::InvalidState(
                    "start() is only valid from NotStarted".to_string(),
                ));
            }
        }

        let set = loader::load(self.backend.as_ref(), self.assessment_id).await?;
        let crate::models::question::QuestionSet {
            activity,
            questions,
            settings,
        } = set;

        let mut inner = self.lock_inner();
        if inner.phase != SessionPhase::NotStarted {
            return Err(Error::InvalidState(
                "start() is only valid from NotStarted".to_string(),
            ));
        }

        let prepared = {
            let mut rng = rand::thread_rng();
            shuffle::prepare(questions, &settings, &mut rng)
        };
        inner.resolvers = prepared
            .iter()
            .filter(|p| p.is_matching())
            .map(|p| {
                (
                    p.id(),
                    MatchingPairResolver::new(p.left_items.len(), p.right_items.len()),
                )
            })
            .collect();
        inner.prepared = prepared;
        inner.activity = Some(activity);
        inner.current_index = 0;
        inner.viewing_since = Some(Instant::now());
        inner.started_at = Some(Utc::now());
        inner.phase = SessionPhase::InProgress;

        if let Some(minutes) = settings.time_limit_minutes {
            let total_seconds = minutes * 60;
            let _ = self.time_tx.send(Some(total_seconds));

            let time_tx = self.time_tx.clone();
            let backend = self.backend.clone();
            let assessment_id = self.assessment_id;
            let inner_ref = self.inner.clone();
            let store = self.store.clone();
            let status_tx = self.status_tx.clone();
            inner.timer = Some(SessionTimer::start(
                total_seconds,
                self.config.timer_tick,
                move |remaining| {
                    let _ = time_tx.send(Some(remaining));
                },
                move || {
                    tracing::info!(assessment_id = %assessment_id, "time limit reached, forcing submission");
                    tokio::spawn(async move {
                        match run_submission(
                            backend,
                            assessment_id,
                            inner_ref,
                            store,
                            status_tx,
                            true,
                        )
                        .await
                        {
                            Ok(_) => {}
                            Err(e) => {
                                tracing::warn!(
                                    assessment_id = %assessment_id,
                                    error = %e,
                                    "forced submission failed; session left in progress for manual retry"
                                );
                            }
                        }
                    });
                },
            ));
        }

        inner.autosave = Some(AutoSaveScheduler::start(
            self.config.autosave_interval(),
            self.store.clone(),
            self.backend.clone(),
            self.assessment_id,
            self.status_tx.clone(),
        ));
        inner.settings = Some(settings);

        let backend = self.backend.clone();
        let assessment_id = self.assessment_id;
        tokio::spawn(async move {
            if let Err(e) = backend.signal_start(assessment_id).await {
                tracing::warn!(assessment_id = %assessment_id, error = %e, "start signal failed");
            }
        });

        tracing::info!(assessment_id = %self.assessment_id, "session started");
        Ok(())
    }

    /// Moves to `index`, clamped into the valid range. Returns the index the
    /// session landed on. Accumulates dwell time on the question being left.
    pub fn navigate(&self, index: usize) -> usize {
        let mut inner = self.lock_inner();
        if inner.phase != SessionPhase::InProgress || inner.prepared.is_empty() {
            return inner.current_index;
        }
        let target = index.min(inner.prepared.len() - 1);

        let leaving_id = inner.prepared[inner.current_index].id();
        if let Some(since) = inner.viewing_since.replace(Instant::now()) {
            let seconds = since.elapsed().as_secs() as u32;
            if seconds > 0 {
                self.store
                    .lock()
                    .expect("answer store poisoned")
                    .add_time_spent(leaving_id, seconds);
            }
        }

        inner.current_index = target;
        target
    }

    /// Records (merges) an answer for `question_id` and marks the autosave
    /// badge unsaved. The mutation is immediately visible to the next flush
    /// or submission snapshot.
    pub fn answer(&self, question_id: i32, patch: AnswerPatch) -> Result<()> {
        let inner = self.lock_inner();
        inner.ensure_in_progress()?;
        if !inner.prepared.iter().any(|p| p.id() == question_id) {
            return Err(Error::NotFound(format!("Unknown question id {}", question_id)));
        }
        drop(inner);

        self.store
            .lock()
            .expect("answer store poisoned")
            .set(question_id, patch);
        let _ = self.status_tx.send(AutosaveStatus::Unsaved);
        Ok(())
    }

    // --- matching gesture passthroughs ---

    pub fn begin_link(&self, question_id: i32, left: usize) -> Result<()> {
        let mut inner = self.lock_inner();
        inner.ensure_in_progress()?;
        self.resolver_mut(&mut inner, question_id)?.begin_link(left);
        Ok(())
    }

    /// Completes the in-progress link. A conflict (target already claimed by
    /// another left item) is a normal rejected outcome, not an error.
    pub fn complete_link(&self, question_id: i32, left: usize, right: usize) -> Result<LinkOutcome> {
        let mut inner = self.lock_inner();
        inner.ensure_in_progress()?;
        let resolver = self.resolver_mut(&mut inner, question_id)?;
        let outcome = resolver.complete_link(left, right);
        if outcome.accepted() {
            let pairs = resolver.pairs().clone();
            drop(inner);
            self.store
                .lock()
                .expect("answer store poisoned")
                .set(question_id, AnswerPatch::MatchingPairs(pairs));
            let _ = self.status_tx.send(AutosaveStatus::Unsaved);
        }
        Ok(outcome)
    }

    /// Detaches the pairing for `left` and leaves the gesture re-anchored
    /// there, so detach-and-redrag is one continuous motion.
    pub fn unlink(&self, question_id: i32, left: usize) -> Result<()> {
        let mut inner = self.lock_inner();
        inner.ensure_in_progress()?;
        let resolver = self.resolver_mut(&mut inner, question_id)?;
        resolver.unlink(left);
        let pairs = resolver.pairs().clone();
        drop(inner);
        self.store
            .lock()
            .expect("answer store poisoned")
            .set(question_id, AnswerPatch::MatchingPairs(pairs));
        let _ = self.status_tx.send(AutosaveStatus::Unsaved);
        Ok(())
    }

    pub fn cancel_link(&self, question_id: i32) -> Result<()> {
        let mut inner = self.lock_inner();
        inner.ensure_in_progress()?;
        self.resolver_mut(&mut inner, question_id)?.cancel_link();
        Ok(())
    }

    pub fn pending_link(&self, question_id: i32) -> Option<usize> {
        self.lock_inner()
            .resolvers
            .get(&question_id)
            .and_then(|r| r.pending())
    }

    pub fn matching_pairs(&self, question_id: i32) -> Option<crate::models::answer::MatchingPairs> {
        self.lock_inner()
            .resolvers
            .get(&question_id)
            .map(|r| r.pairs().clone())
    }

    // --- submission ---

    /// InProgress -> Submitted. Stops both periodic triggers, makes one
    /// best-effort final flush, then sends the full snapshot. On failure the
    /// session stays InProgress with answers intact and the caller retries.
    /// Calling again after Submitted is a no-op with no network call.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        run_submission(
            self.backend.clone(),
            self.assessment_id,
            self.inner.clone(),
            self.store.clone(),
            self.status_tx.clone(),
            false,
        )
        .await
    }

    // --- read accessors ---

    pub fn phase(&self) -> SessionPhase {
        self.lock_inner().phase
    }

    pub fn current_index(&self) -> usize {
        self.lock_inner().current_index
    }

    pub fn question_count(&self) -> usize {
        self.lock_inner().prepared.len()
    }

    pub fn question(&self, index: usize) -> Option<PreparedQuestion> {
        self.lock_inner().prepared.get(index).cloned()
    }

    pub fn current_question(&self) -> Option<PreparedQuestion> {
        let inner = self.lock_inner();
        inner.prepared.get(inner.current_index).cloned()
    }

    pub fn activity(&self) -> Option<ActivityMeta> {
        self.lock_inner().activity.clone()
    }

    pub fn settings(&self) -> Option<QuizSettings> {
        self.lock_inner().settings.clone()
    }

    /// (answered, total) for progress reporting.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.lock_inner().prepared.len();
        let answered = self
            .store
            .lock()
            .expect("answer store poisoned")
            .answered_count();
        (answered, total)
    }

    pub fn autosave_status(&self) -> AutosaveStatus {
        *self.status_rx.borrow()
    }

    pub fn watch_autosave(&self) -> watch::Receiver<AutosaveStatus> {
        self.status_tx.subscribe()
    }

    /// Remaining seconds, or `None` when no time limit is configured.
    pub fn time_remaining(&self) -> Option<u32> {
        *self.time_rx.borrow()
    }

    pub fn watch_time(&self) -> watch::Receiver<Option<u32>> {
        self.time_tx.subscribe()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.lock_inner().started_at
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.lock_inner().submitted_at
    }

    /// True once the countdown has hit zero, whether or not the forced
    /// submission that followed actually landed.
    pub fn has_expired(&self) -> bool {
        self.lock_inner().expired
    }

    /// The last submission failure, kept for the retry affordance.
    pub fn last_submit_error(&self) -> Option<String> {
        self.lock_inner().last_submit_error.clone()
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("session state poisoned")
    }

    fn resolver_mut<'a>(
        &self,
        inner: &'a mut MutexGuard<'_, Inner>,
        question_id: i32,
    ) -> Result<&'a mut MatchingPairResolver> {
        let exists = inner.prepared.iter().any(|p| p.id() == question_id);
        match inner.resolvers.get_mut(&question_id) {
            Some(resolver) => Ok(resolver),
            None if exists => Err(Error::InvalidState(format!(
                "Question {} is not a matching question",
                question_id
            ))),
            None => Err(Error::NotFound(format!("Unknown question id {}", question_id))),
        }
    }
}

/// The single guarded transition point shared by manual and timer-forced
/// submission. The first caller to pass the phase gate performs the real
/// submission; anyone arriving after Submitted observes it and no-ops, and a
/// concurrent second caller is turned away while the first is in flight.
async fn run_submission<B: AssessmentBackend>(
    backend: Arc<B>,
    assessment_id: Uuid,
    inner: Arc<Mutex<Inner>>,
    store: Arc<Mutex<AnswerStore>>,
    status: Arc<watch::Sender<AutosaveStatus>>,
    forced: bool,
) -> Result<SubmitOutcome> {
    let (timer, autosave) = {
        let mut guard = inner.lock().expect("session state poisoned");
        match guard.phase {
            SessionPhase::Submitted => return Ok(SubmitOutcome::AlreadySubmitted),
            SessionPhase::NotStarted => {
                return Err(Error::InvalidState("session has not started".to_string()))
            }
            SessionPhase::InProgress => {}
        }
        if guard.submit_in_flight {
            return if forced {
                Ok(SubmitOutcome::AlreadySubmitted)
            } else {
                Err(Error::InvalidState(
                    "submission already in progress".to_string(),
                ))
            };
        }
        guard.submit_in_flight = true;
        if forced {
            guard.expired = true;
        }

        // Settle dwell time for the question currently on screen.
        if let Some(since) = guard.viewing_since.take() {
            if let Some(current) = guard.prepared.get(guard.current_index) {
                let seconds = since.elapsed().as_secs() as u32;
                if seconds > 0 {
                    store
                        .lock()
                        .expect("answer store poisoned")
                        .add_time_spent(current.id(), seconds);
                }
            }
        }

        (guard.timer.take(), guard.autosave.take())
    };

    // Cancel both periodic triggers before touching the network; both stops
    // are idempotent, so racing paths cannot double-fire anything.
    if let Some(timer) = timer {
        timer.stop();
    }
    if let Some(autosave) = autosave {
        autosave.stop();
    }

    // Best-effort final flush; its failure only moves the status badge.
    flush_once(&store, backend.as_ref(), assessment_id, &status).await;

    let snapshot = {
        let store = store.lock().expect("answer store poisoned");
        store.snapshot()
    };
    let answer_count = snapshot.len();

    match backend.submit_session(assessment_id, snapshot).await {
        Ok(()) => {
            let submitted_at = Utc::now();
            let mut guard = inner.lock().expect("session state poisoned");
            guard.phase = SessionPhase::Submitted;
            guard.submitted_at = Some(submitted_at);
            guard.submit_in_flight = false;
            guard.last_submit_error = None;
            tracing::info!(
                assessment_id = %assessment_id,
                answers = answer_count,
                forced,
                "session submitted"
            );
            Ok(SubmitOutcome::Submitted { submitted_at })
        }
        Err(e) => {
            let mut guard = inner.lock().expect("session state poisoned");
            guard.submit_in_flight = false;
            guard.last_submit_error = Some(e.to_string());
            Err(match e {
                Error::Submission(_) => e,
                other => Error::Submission(other.to_string()),
            })
        }
    }
}
