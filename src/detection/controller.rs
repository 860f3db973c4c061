use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use super::{
    debouncer::{DebounceFire, Debouncer},
    state::{ControllerState, DetectionRequest, DetectionSnapshot, DetectionState},
};
use crate::{
    classifier::{ClassificationError, DetectionResult, ErrorKind, MoodClassifier},
    entries::{EntryStore, StoreError},
    models::{is_classifiable, trimmed_len, Mood, MoodEntry, NoteTooShort},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    TooShort(#[from] NoteTooShort),

    #[error("mood detection failed: {0:?}")]
    Detection(ErrorKind),

    #[error("failed to save entry: {0}")]
    Storage(#[from] StoreError),
}

impl SubmitError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmitError::TooShort(_) => ErrorKind::TooShort.user_message(),
            SubmitError::Detection(kind) => kind.user_message(),
            SubmitError::Storage(_) => "Failed to save mood entry",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved(MoodEntry),
    /// The classification started by this submit was overtaken by a newer
    /// edit or request before it could be finalized. Nothing was saved.
    Superseded,
}

/// Owns the detection state machine: debounced classification, stale
/// response gating, and handing finalized entries to the [`EntryStore`].
///
/// Construction spawns the debounce listener on the current tokio runtime;
/// call [`DetectionController::shutdown`] to stop it.
#[derive(Clone)]
pub struct DetectionController {
    state: Arc<Mutex<ControllerState>>,
    debouncer: Arc<Debouncer>,
    classifier: Arc<dyn MoodClassifier>,
    store: EntryStore,
    state_tx: Arc<watch::Sender<DetectionState>>,
    cancel_token: CancellationToken,
}

impl DetectionController {
    pub fn new(
        classifier: Arc<dyn MoodClassifier>,
        store: EntryStore,
        quiet_period: Duration,
    ) -> Self {
        let (debouncer, fire_rx) = Debouncer::new(quiet_period);
        let (state_tx, _) = watch::channel(DetectionState::Idle);

        let controller = Self {
            state: Arc::new(Mutex::new(ControllerState::default())),
            debouncer: Arc::new(debouncer),
            classifier,
            store,
            state_tx: Arc::new(state_tx),
            cancel_token: CancellationToken::new(),
        };

        tokio::spawn(fire_loop(
            controller.clone(),
            fire_rx,
            controller.cancel_token.clone(),
        ));

        controller
    }

    /// Receives every state transition.
    pub fn subscribe(&self) -> watch::Receiver<DetectionState> {
        self.state_tx.subscribe()
    }

    pub async fn snapshot(&self) -> DetectionSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn current_state(&self) -> DetectionState {
        self.state.lock().await.detection
    }

    pub async fn on_text_change(&self, text: &str) {
        let mut state = self.state.lock().await;
        state.note = text.to_string();
        self.debouncer.on_text_change(text);

        if !is_classifiable(text) && state.detection != DetectionState::Idle {
            log_debug!("Note shortened below threshold, clearing detection");
            state.detection = DetectionState::Idle;
            self.emit_state_changed(&state);
        }
    }

    /// Submits the current note.
    pub async fn submit(&self) -> Result<SubmitOutcome, SubmitError> {
        let request = {
            let mut state = self.state.lock().await;
            let actual = trimmed_len(&state.note);
            if !is_classifiable(&state.note) {
                log_debug!("Submit rejected, note has {actual} characters");
                return Err(SubmitError::TooShort(NoteTooShort { actual }));
            }

            if let Some(mood) = state.mood_for_note() {
                return self.finalize(&mut state, mood).await;
            }

            match state.detection {
                DetectionState::Failed { kind } => {
                    log_debug!("Submit rejected, last detection failed with {kind:?}");
                    return Err(SubmitError::Detection(kind));
                }
                // A detection for different text does not count for this note.
                DetectionState::Idle
                | DetectionState::Detecting { .. }
                | DetectionState::Detected { .. } => {
                    // The immediate request replaces whatever the timer would have sent.
                    self.debouncer.cancel();
                    let note = state.note.clone();
                    let request = state.issue(note);
                    self.emit_state_changed(&state);
                    request
                }
            }
        };

        log_info!(
            "Submit without a detected mood, classifying immediately (sequence {})",
            request.sequence
        );
        self.run_request(&request).await;

        let mut state = self.state.lock().await;
        if state.latest_sequence != request.sequence || state.note != request.text {
            log_debug!("Submit request {} was superseded", request.sequence);
            return Ok(SubmitOutcome::Superseded);
        }

        if let Some(mood) = state.mood_for_note() {
            return self.finalize(&mut state, mood).await;
        }
        match state.detection {
            DetectionState::Failed { kind } => Err(SubmitError::Detection(kind)),
            _ => Ok(SubmitOutcome::Superseded),
        }
    }

    /// Replaces the note with `text` if it differs, then submits.
    pub async fn submit_note(&self, text: &str) -> Result<SubmitOutcome, SubmitError> {
        let changed = self.state.lock().await.note != text;
        if changed {
            self.on_text_change(text).await;
        }
        self.submit().await
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
        self.debouncer.cancel();
    }

    async fn finalize(
        &self,
        state: &mut MutexGuard<'_, ControllerState>,
        mood: Mood,
    ) -> Result<SubmitOutcome, SubmitError> {
        let entry = MoodEntry::new(mood, &state.note)?;
        if let Err(err) = self.store.add(entry.clone()).await {
            log_error!("Failed to save mood entry: {err}");
            return Err(SubmitError::Storage(err));
        }

        state.reset();
        self.debouncer.clear();
        self.emit_state_changed(state);

        log_info!("Saved mood entry {} as {}", entry.id, entry.mood.label());
        Ok(SubmitOutcome::Saved(entry))
    }

    async fn handle_debounce_fired(&self, fire: DebounceFire) {
        let request = {
            let mut state = self.state.lock().await;
            if !self.debouncer.is_current(fire.generation) {
                log_debug!("Dropping stale debounce fire (generation {})", fire.generation);
                return;
            }
            let request = state.issue(fire.text);
            self.emit_state_changed(&state);
            request
        };

        log_debug!("Quiet period elapsed, issuing request {}", request.sequence);
        let controller = self.clone();
        tokio::spawn(async move {
            controller.run_request(&request).await;
        });
    }

    async fn run_request(&self, request: &DetectionRequest) {
        let result = self.classifier.classify(&request.text).await;
        self.apply_response(request.sequence, result).await;
    }

    async fn apply_response(
        &self,
        sequence: u64,
        result: Result<DetectionResult, ClassificationError>,
    ) -> bool {
        let mut state = self.state.lock().await;
        if !state.accepts(sequence) {
            log_debug!(
                "Discarding stale response {sequence} (latest {})",
                state.latest_sequence
            );
            return false;
        }

        state.detection = match result {
            Ok(DetectionResult { mood, confidence }) => {
                log_info!("Detected mood {mood} ({}) for request {sequence}", confidence.as_str());
                DetectionState::Detected { mood, confidence }
            }
            Err(err) => {
                log_failure(sequence, &err);
                DetectionState::Failed { kind: err.kind() }
            }
        };
        self.emit_state_changed(&state);
        true
    }

    fn emit_state_changed(&self, state: &ControllerState) {
        self.state_tx.send_replace(state.detection);
    }
}

fn log_failure(sequence: u64, err: &ClassificationError) {
    match err {
        ClassificationError::TooShort => log_debug!("Request {sequence} rejected: {err}"),
        ClassificationError::RateLimited => log_warn!("Request {sequence} rate limited"),
        ClassificationError::ServiceUnavailable(detail) => {
            log_error!("Request {sequence}: classifier unavailable: {detail}")
        }
        ClassificationError::QuotaExhausted => {
            log_error!("Request {sequence}: classifier quota exhausted")
        }
        ClassificationError::Unknown(detail) => {
            log_error!("Request {sequence} failed: {detail}")
        }
    }
}

async fn fire_loop(
    controller: DetectionController,
    mut fires: mpsc::UnboundedReceiver<DebounceFire>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            fire = fires.recv() => match fire {
                Some(fire) => controller.handle_debounce_fired(fire).await,
                None => break,
            },
            _ = cancel_token.cancelled() => {
                log_info!("Detection loop shutting down");
                break;
            }
        }
    }
}
