//! Pipeline stage types and the shared, guarded status handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::analysis::error::AnalysisError;

const EVENT_CAPACITY: usize = 32;
const DROPPED_ERROR: &str = "Request was dropped before it finished";

/// Coarse-grained stage of an analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Idle,
    Transcribing,
    Analyzing,
    Saving,
    Complete,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Transcribing => "transcribing",
            Self::Analyzing => "analyzing",
            Self::Saving => "saving",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// Stages during which a request is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Transcribing | Self::Analyzing | Self::Saving)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (Idle, Transcribing)
                | (Transcribing, Analyzing)
                | (Analyzing, Saving)
                | (Saving, Complete)
                | (Transcribing | Analyzing | Saving, Failed)
                | (Complete | Failed, Idle)
        )
    }

    /// Headline shown while the stage is active.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Transcribing => Some("🔁 Transcribing audio..."),
            Self::Analyzing => Some("💡 Analyzing with AI..."),
            Self::Saving => Some("📦 Saving to database..."),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&'static str> {
        match self {
            Self::Transcribing => Some("Converting speech to text"),
            Self::Analyzing => Some("Extracting insights and action items"),
            Self::Saving => Some("Storing results securely"),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single accepted stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageEvent {
    pub request_id: u64,
    pub from: PipelineStage,
    pub to: PipelineStage,
}

/// Snapshot of the pipeline, readable by the UI.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub stage: PipelineStage,
    pub request_id: Option<u64>,
    pub file_name: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            stage: PipelineStage::Idle,
            request_id: None,
            file_name: None,
            started_at: None,
            last_error: None,
        }
    }
}

impl PipelineState {
    /// Seconds since the current request was accepted.
    pub fn elapsed_seconds(&self) -> Option<u64> {
        self.started_at.map(|started| {
            let elapsed = Utc::now() - started;
            elapsed.num_seconds().max(0) as u64
        })
    }
}

#[derive(Default)]
struct StatusInner {
    state: PipelineState,
    last_request_id: u64,
}

/// Shared handle enforcing the stage machine.
///
/// Every transition after `begin` carries the request id it was issued for;
/// transitions for any other id are ignored, so an abandoned request cannot
/// move the pipeline once it has been reset or superseded.
#[derive(Clone)]
pub struct PipelineStatusHandle {
    inner: Arc<Mutex<StatusInner>>,
    events: broadcast::Sender<StageEvent>,
}

impl Default for PipelineStatusHandle {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(StatusInner::default())),
            events,
        }
    }
}

impl PipelineStatusHandle {
    pub async fn get(&self) -> PipelineState {
        self.inner.lock().await.state.clone()
    }

    pub async fn stage(&self) -> PipelineStage {
        self.inner.lock().await.state.stage
    }

    /// Receive every accepted transition, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        self.events.subscribe()
    }

    /// Accept a new request and enter `Transcribing`.
    ///
    /// Fails with `Busy` while another request is in flight. A pending
    /// `Complete`/`Failed` is folded back to `Idle` first.
    pub async fn begin(&self, file_name: &str) -> Result<u64, AnalysisError> {
        let mut inner = self.inner.lock().await;
        let current = inner.state.stage;

        if current.is_active() {
            warn!(
                "Rejecting submission of {} while request {:?} is {}",
                file_name, inner.state.request_id, current
            );
            return Err(AnalysisError::Busy { stage: current });
        }

        if current.is_terminal() {
            let previous = inner.state.request_id.unwrap_or(inner.last_request_id);
            self.transition(&mut inner, previous, PipelineStage::Idle);
        }

        inner.last_request_id += 1;
        let request_id = inner.last_request_id;
        inner.state.request_id = Some(request_id);
        inner.state.file_name = Some(file_name.to_string());
        inner.state.started_at = Some(Utc::now());
        inner.state.last_error = None;
        self.transition(&mut inner, request_id, PipelineStage::Transcribing);

        Ok(request_id)
    }

    /// Move the given request forward. Returns false if the request is stale
    /// or the transition is not allowed from the current stage.
    pub async fn advance(&self, request_id: u64, next: PipelineStage) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state.request_id != Some(request_id) {
            debug!("Ignoring {} for stale request {}", next, request_id);
            return false;
        }
        self.transition(&mut inner, request_id, next)
    }

    pub async fn fail(&self, request_id: u64, error: String) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state.request_id != Some(request_id) {
            debug!("Ignoring failure of stale request {}: {}", request_id, error);
            return false;
        }
        let moved = self.transition(&mut inner, request_id, PipelineStage::Failed);
        if moved {
            inner.state.last_error = Some(error);
        }
        moved
    }

    /// Fold a finished request back to `Idle` once its outcome was shown.
    /// The last error, if any, stays readable.
    pub async fn acknowledge(&self, request_id: u64) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state.request_id != Some(request_id) || !inner.state.stage.is_terminal() {
            return false;
        }
        self.transition(&mut inner, request_id, PipelineStage::Idle)
    }

    /// Fail a request whose driver went away without finishing, then fold
    /// back to `Idle`. Synchronous so it can run from `Drop`; if the lock is
    /// contended the cleanup is handed to the runtime.
    pub fn abandon(&self, request_id: u64) {
        match self.inner.try_lock() {
            Ok(mut inner) => self.abandon_locked(&mut inner, request_id),
            Err(_) => match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let handle = self.clone();
                    runtime.spawn(async move {
                        let mut inner = handle.inner.lock().await;
                        handle.abandon_locked(&mut inner, request_id);
                    });
                }
                Err(_) => warn!(
                    "Request {} dropped outside a runtime; pipeline left as is",
                    request_id
                ),
            },
        }
    }

    fn abandon_locked(&self, inner: &mut StatusInner, request_id: u64) {
        if inner.state.request_id != Some(request_id) || !inner.state.stage.is_active() {
            return;
        }
        warn!(
            "Request {} dropped while {}",
            request_id, inner.state.stage
        );
        if self.transition(inner, request_id, PipelineStage::Failed) {
            inner.state.last_error = Some(DROPPED_ERROR.to_string());
            self.transition(inner, request_id, PipelineStage::Idle);
        }
    }

    /// Abandon whatever is in flight and return to `Idle`.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        let state = &inner.state;
        if state.stage != PipelineStage::Idle {
            let event = StageEvent {
                request_id: state.request_id.unwrap_or(inner.last_request_id),
                from: state.stage,
                to: PipelineStage::Idle,
            };
            debug!("Pipeline reset from {}", event.from);
            let _ = self.events.send(event);
        }
        inner.state = PipelineState::default();
    }

    fn transition(&self, inner: &mut StatusInner, request_id: u64, next: PipelineStage) -> bool {
        let from = inner.state.stage;
        if !from.can_transition_to(next) {
            warn!(
                "Rejected pipeline transition {} -> {} for request {}",
                from, next, request_id
            );
            return false;
        }

        inner.state.stage = next;
        debug!("Request {}: {} -> {}", request_id, from, next);
        // No subscribers is fine.
        let _ = self.events.send(StageEvent {
            request_id,
            from,
            to: next,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_as_str() {
        assert_eq!(PipelineStage::Idle.as_str(), "idle");
        assert_eq!(PipelineStage::Transcribing.as_str(), "transcribing");
        assert_eq!(PipelineStage::Analyzing.as_str(), "analyzing");
        assert_eq!(PipelineStage::Saving.as_str(), "saving");
        assert_eq!(PipelineStage::Complete.as_str(), "complete");
        assert_eq!(PipelineStage::Failed.as_str(), "failed");
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&PipelineStage::Analyzing).unwrap();
        assert_eq!(json, "\"analyzing\"");

        let parsed: PipelineStage = serde_json::from_str("\"saving\"").unwrap();
        assert_eq!(parsed, PipelineStage::Saving);
    }

    #[test]
    fn test_transition_table() {
        use PipelineStage::*;
        assert!(Idle.can_transition_to(Transcribing));
        assert!(Transcribing.can_transition_to(Analyzing));
        assert!(Analyzing.can_transition_to(Saving));
        assert!(Saving.can_transition_to(Complete));
        assert!(Saving.can_transition_to(Failed));
        assert!(Complete.can_transition_to(Idle));
        assert!(Failed.can_transition_to(Idle));

        assert!(!Idle.can_transition_to(Analyzing));
        assert!(!Transcribing.can_transition_to(Saving));
        assert!(!Transcribing.can_transition_to(Transcribing));
        assert!(!Idle.can_transition_to(Failed));
        assert!(!Complete.can_transition_to(Failed));
        assert!(!Complete.can_transition_to(Transcribing));
    }

    #[test]
    fn test_only_in_flight_stages_have_messages() {
        assert!(PipelineStage::Idle.message().is_none());
        assert!(PipelineStage::Complete.message().is_none());
        assert!(PipelineStage::Failed.description().is_none());
        assert_eq!(
            PipelineStage::Transcribing.description(),
            Some("Converting speech to text")
        );
    }

    #[tokio::test]
    async fn test_full_lifecycle_emits_ordered_events() {
        let handle = PipelineStatusHandle::default();
        let mut events = handle.subscribe();

        let id = handle.begin("standup.mp3").await.unwrap();
        assert!(handle.advance(id, PipelineStage::Analyzing).await);
        assert!(handle.advance(id, PipelineStage::Saving).await);
        assert!(handle.advance(id, PipelineStage::Complete).await);
        assert!(handle.acknowledge(id).await);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            assert_eq!(event.request_id, id);
            seen.push(event.to);
        }
        assert_eq!(
            seen,
            vec![
                PipelineStage::Transcribing,
                PipelineStage::Analyzing,
                PipelineStage::Saving,
                PipelineStage::Complete,
                PipelineStage::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn test_begin_while_active_is_busy() {
        let handle = PipelineStatusHandle::default();
        let id = handle.begin("first.wav").await.unwrap();
        handle.advance(id, PipelineStage::Analyzing).await;

        let err = handle.begin("second.wav").await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Busy {
                stage: PipelineStage::Analyzing
            }
        ));

        let state = handle.get().await;
        assert_eq!(state.request_id, Some(id));
        assert_eq!(state.file_name.as_deref(), Some("first.wav"));
    }

    #[tokio::test]
    async fn test_begin_after_failure_folds_to_idle() {
        let handle = PipelineStatusHandle::default();
        let first = handle.begin("a.wav").await.unwrap();
        assert!(handle.fail(first, "boom".to_string()).await);
        assert_eq!(handle.get().await.last_error.as_deref(), Some("boom"));

        let second = handle.begin("a.wav").await.unwrap();
        assert!(second > first);

        let state = handle.get().await;
        assert_eq!(state.stage, PipelineStage::Transcribing);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected() {
        let handle = PipelineStatusHandle::default();
        let id = handle.begin("a.wav").await.unwrap();

        assert!(!handle.advance(id, PipelineStage::Complete).await);
        assert_eq!(handle.stage().await, PipelineStage::Transcribing);
    }

    #[tokio::test]
    async fn test_stale_request_cannot_move_pipeline_after_reset() {
        let handle = PipelineStatusHandle::default();
        let stale = handle.begin("old.wav").await.unwrap();
        handle.reset().await;

        let fresh = handle.begin("new.wav").await.unwrap();
        assert!(!handle.advance(stale, PipelineStage::Analyzing).await);
        assert!(!handle.fail(stale, "late".to_string()).await);

        let state = handle.get().await;
        assert_eq!(state.request_id, Some(fresh));
        assert_eq!(state.stage, PipelineStage::Transcribing);
    }

    #[tokio::test]
    async fn test_abandon_fails_and_idles_only_the_live_request() {
        let handle = PipelineStatusHandle::default();
        let mut events = handle.subscribe();
        let id = handle.begin("a.wav").await.unwrap();

        handle.abandon(id + 1);
        assert_eq!(handle.stage().await, PipelineStage::Transcribing);

        handle.abandon(id);
        let state = handle.get().await;
        assert_eq!(state.stage, PipelineStage::Idle);
        assert_eq!(state.last_error.as_deref(), Some(DROPPED_ERROR));

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event.to);
        }
        assert_eq!(
            seen,
            vec![
                PipelineStage::Transcribing,
                PipelineStage::Failed,
                PipelineStage::Idle
            ]
        );

        // Already idle: nothing to undo.
        handle.abandon(id);
        assert!(events.try_recv().is_err());
        assert!(handle.begin("b.wav").await.is_ok());
    }

    #[tokio::test]
    async fn test_elapsed_seconds_tracks_started_request() {
        let handle = PipelineStatusHandle::default();
        assert_eq!(handle.get().await.elapsed_seconds(), None);

        handle.begin("a.wav").await.unwrap();
        let elapsed = handle.get().await.elapsed_seconds();
        assert!(matches!(elapsed, Some(secs) if secs < 5));
    }

    #[tokio::test]
    async fn test_acknowledge_requires_terminal_stage() {
        let handle = PipelineStatusHandle::default();
        let id = handle.begin("a.wav").await.unwrap();

        assert!(!handle.acknowledge(id).await);
        handle.fail(id, "nope".to_string()).await;
        assert!(handle.acknowledge(id).await);

        let state = handle.get().await;
        assert_eq!(state.stage, PipelineStage::Idle);
        assert_eq!(state.last_error.as_deref(), Some("nope"));
    }
}
