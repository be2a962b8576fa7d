//! Mock backend for testing and development.
//!
//! [`MockBackend`] behaves like a small in-memory kiosk server: it keeps a
//! real service queue, answers recognition polls from scripted readings and
//! decides verifications by comparing ids. The paired [`MockBackendHandle`]
//! scripts readings, injects failures and latency, and records every call so
//! tests can count requests.
//!
//! # Examples
//!
//! ```
//! use gradcheck_core::{CaptureMode, Identity, StationId};
//! use gradcheck_services::mock::{CallKind, MockBackend};
//! use gradcheck_services::RecognitionService;
//!
//! #[tokio::main]
//! async fn main() -> gradcheck_services::Result<()> {
//!     let (backend, handle) = MockBackend::new();
//!     handle.set_reading(StationId::CheckIn, CaptureMode::Face, Identity::new("2201", "Ada"));
//!
//!     let who = backend.poll_recognition(StationId::CheckIn, CaptureMode::Face).await?;
//!     assert_eq!(who.id, "2201");
//!     assert_eq!(handle.call_count(CallKind::PollRecognition), 1);
//!     Ok(())
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use gradcheck_core::{CaptureMode, Identity, ModelSelection, QueueEntry, StationId};

use crate::error::{Result, ServiceError};
use crate::traits::{
    CameraService, NotificationService, Outcome, QueueService, RecognitionService,
    SettingsService, StreamHandle, Verdict, VerificationService,
};

/// Kind of collaborator request, used for counting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    SelectStream,
    PollRecognition,
    ResetScan,
    SubmitVerification,
    Enqueue,
    FetchQueue,
    AdvanceCurrent,
    LoadSettings,
    SaveSettings,
    SendNotification,
}

/// A recorded collaborator request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    SelectStream {
        station: StationId,
        mode: CaptureMode,
    },
    PollRecognition {
        station: StationId,
        mode: CaptureMode,
    },
    ResetScan,
    SubmitVerification {
        face_id: String,
        code_id: String,
    },
    Enqueue {
        id: String,
    },
    FetchQueue,
    AdvanceCurrent,
    LoadSettings,
    SaveSettings(ModelSelection),
    SendNotification {
        id: String,
    },
}

impl BackendCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::SelectStream { .. } => CallKind::SelectStream,
            Self::PollRecognition { .. } => CallKind::PollRecognition,
            Self::ResetScan => CallKind::ResetScan,
            Self::SubmitVerification { .. } => CallKind::SubmitVerification,
            Self::Enqueue { .. } => CallKind::Enqueue,
            Self::FetchQueue => CallKind::FetchQueue,
            Self::AdvanceCurrent => CallKind::AdvanceCurrent,
            Self::LoadSettings => CallKind::LoadSettings,
            Self::SaveSettings(_) => CallKind::SaveSettings,
            Self::SendNotification { .. } => CallKind::SendNotification,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    readings: HashMap<(StationId, CaptureMode), Identity>,
    verdict: Option<Verdict>,
    queue: Vec<Identity>,
    current: Option<usize>,
    settings: ModelSelection,
    latency: HashMap<CallKind, Duration>,
    failing: HashSet<CallKind>,
    calls: Vec<BackendCall>,
}

impl MockState {
    fn enqueue(&mut self, identity: &Identity) -> Outcome {
        if identity.is_sentinel() {
            return Outcome::rejected("No identity to add");
        }
        if self.queue.iter().any(|queued| queued.same_person(identity)) {
            return Outcome::rejected(format!("{} is already in the queue", identity.id));
        }
        self.queue.push(identity.clone());
        Outcome::accepted(format!("{} added to the queue", identity.name))
    }

    fn advance(&mut self) -> Outcome {
        if self.queue.is_empty() {
            return Outcome::rejected("Queue is empty");
        }
        let next = match self.current {
            None => 0,
            Some(index) if index + 1 < self.queue.len() => index + 1,
            Some(_) => return Outcome::rejected("No one left to serve"),
        };
        self.current = Some(next);
        Outcome::accepted(format!("Now serving {}", self.queue[next].name))
    }

    fn snapshot(&self) -> Vec<QueueEntry> {
        self.queue
            .iter()
            .enumerate()
            .map(|(index, identity)| QueueEntry::new(identity.clone(), self.current == Some(index)))
            .collect()
    }

    fn verdict_for(&self, face: &Identity, code: &Identity) -> Verdict {
        if let Some(verdict) = &self.verdict {
            return verdict.clone();
        }
        if face.same_person(code) {
            Verdict::Verified {
                message: format!("Welcome, {}", face.name),
                identity: Some(face.clone()),
            }
        } else {
            Verdict::Rejected {
                message: "Face and code do not match".to_string(),
            }
        }
    }
}

/// In-memory kiosk server.
///
/// Cheap to clone; clones share state with each other and with the handle.
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new mock backend and the handle that controls it.
    pub fn new() -> (Self, MockBackendHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockBackendHandle { state },
        )
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call` and return its scripted latency, or the injected failure.
    fn begin(&self, call: BackendCall) -> Result<Option<Duration>> {
        let kind = call.kind();
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(&kind) {
            return Err(ServiceError::transport(
                format!("mock:{kind:?}"),
                "connection refused",
            ));
        }
        Ok(state.latency.get(&kind).copied())
    }

    async fn call<T>(
        &self,
        call: BackendCall,
        respond: impl FnOnce(&mut MockState) -> T + Send,
    ) -> Result<T> {
        if let Some(delay) = self.begin(call)? {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.lock();
        Ok(respond(&mut state))
    }
}

impl CameraService for MockBackend {
    async fn select_stream(&self, station: StationId, mode: CaptureMode) -> Result<StreamHandle> {
        self.call(BackendCall::SelectStream { station, mode }, |_| {
            StreamHandle::new(format!("mock://video/{station}?mode={}", mode.as_wire()))
        })
        .await
    }
}

impl RecognitionService for MockBackend {
    async fn poll_recognition(&self, station: StationId, mode: CaptureMode) -> Result<Identity> {
        self.call(BackendCall::PollRecognition { station, mode }, |state| {
            state
                .readings
                .get(&(station, mode))
                .cloned()
                .unwrap_or_default()
        })
        .await
    }

    async fn reset_scan(&self) -> Result<()> {
        self.call(BackendCall::ResetScan, |state| {
            state
                .readings
                .retain(|(station, mode), _| {
                    *station == StationId::CheckIn && *mode == CaptureMode::Face
                });
        })
        .await
    }
}

impl VerificationService for MockBackend {
    async fn submit_verification(&self, face: &Identity, code: &Identity) -> Result<Verdict> {
        let call = BackendCall::SubmitVerification {
            face_id: face.id.clone(),
            code_id: code.id.clone(),
        };
        self.call(call, |state| state.verdict_for(face, code)).await
    }
}

impl QueueService for MockBackend {
    async fn enqueue(&self, identity: &Identity) -> Result<Outcome> {
        let call = BackendCall::Enqueue {
            id: identity.id.clone(),
        };
        self.call(call, |state| state.enqueue(identity)).await
    }

    async fn fetch_queue(&self) -> Result<Vec<QueueEntry>> {
        self.call(BackendCall::FetchQueue, |state| state.snapshot())
            .await
    }

    async fn advance_current(&self) -> Result<Outcome> {
        self.call(BackendCall::AdvanceCurrent, MockState::advance)
            .await
    }
}

impl SettingsService for MockBackend {
    async fn load_settings(&self) -> Result<ModelSelection> {
        self.call(BackendCall::LoadSettings, |state| state.settings)
            .await
    }

    async fn save_settings(&self, selection: ModelSelection) -> Result<ModelSelection> {
        self.call(BackendCall::SaveSettings(selection), |state| {
            state.settings = selection;
            state.settings
        })
        .await
    }
}

impl NotificationService for MockBackend {
    async fn send_notification(&self, identity: &Identity) -> Result<Outcome> {
        let call = BackendCall::SendNotification {
            id: identity.id.clone(),
        };
        self.call(call, |_| Outcome::accepted(format!("Email sent to {}", identity.name)))
            .await
    }
}

/// Handle for scripting a [`MockBackend`] and inspecting its calls.
#[derive(Debug, Clone)]
pub struct MockBackendHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockBackendHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set what the recognition service reports for `station` in `mode`.
    pub fn set_reading(&self, station: StationId, mode: CaptureMode, identity: Identity) {
        self.lock().readings.insert((station, mode), identity);
    }

    /// Report the sentinel for `station` in `mode` from now on.
    pub fn clear_reading(&self, station: StationId, mode: CaptureMode) {
        self.lock().readings.remove(&(station, mode));
    }

    /// Force every verification to return `verdict`.
    ///
    /// Without a forced verdict, a face and code with the same id verify.
    pub fn set_verdict(&self, verdict: Verdict) {
        self.lock().verdict = Some(verdict);
    }

    /// Make every `kind` request fail at the transport level.
    pub fn fail(&self, kind: CallKind) {
        self.lock().failing.insert(kind);
    }

    /// Let `kind` requests succeed again.
    pub fn recover(&self, kind: CallKind) {
        self.lock().failing.remove(&kind);
    }

    /// Delay every `kind` response by `delay`.
    pub fn set_latency(&self, kind: CallKind, delay: Duration) {
        self.lock().latency.insert(kind, delay);
    }

    /// Pre-populate the queue. The first entry flagged current becomes the pointer.
    pub fn seed_queue(&self, entries: Vec<QueueEntry>) {
        let mut state = self.lock();
        state.current = entries.iter().position(|entry| entry.is_current);
        state.queue = entries.into_iter().map(|entry| entry.identity).collect();
    }

    /// Current server-side queue.
    pub fn queue(&self) -> Vec<QueueEntry> {
        self.lock().snapshot()
    }

    /// Stored model settings.
    pub fn settings(&self) -> ModelSelection {
        self.lock().settings
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Number of calls of `kind` received so far.
    pub fn call_count(&self, kind: CallKind) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.kind() == kind)
            .count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Identity {
        Identity::new("2201", "Ada")
    }

    #[tokio::test]
    async fn test_unscripted_reading_is_sentinel() {
        let (backend, _handle) = MockBackend::new();
        let who = backend
            .poll_recognition(StationId::Confirmation, CaptureMode::Code)
            .await
            .unwrap();
        assert!(who.is_sentinel());
    }

    #[tokio::test]
    async fn test_enqueue_rejects_duplicates() {
        let (backend, handle) = MockBackend::new();

        assert!(backend.enqueue(&ada()).await.unwrap().is_accepted());
        let second = backend.enqueue(&ada()).await.unwrap();

        assert!(!second.is_accepted());
        assert_eq!(handle.queue().len(), 1);
        assert_eq!(handle.call_count(CallKind::Enqueue), 2);
    }

    #[tokio::test]
    async fn test_advance_walks_the_queue() {
        let (backend, handle) = MockBackend::new();
        backend.enqueue(&ada()).await.unwrap();
        backend.enqueue(&Identity::new("7", "Grace")).await.unwrap();

        backend.advance_current().await.unwrap();
        assert!(handle.queue()[0].is_current);

        backend.advance_current().await.unwrap();
        assert!(handle.queue()[1].is_current);

        let last = backend.advance_current().await.unwrap();
        assert!(!last.is_accepted());
    }

    #[tokio::test]
    async fn test_verification_compares_ids() {
        let (backend, _handle) = MockBackend::new();
        let verdict = backend.submit_verification(&ada(), &ada()).await.unwrap();
        assert!(verdict.is_verified());

        let verdict = backend
            .submit_verification(&ada(), &Identity::new("9", "Eve"))
            .await
            .unwrap();
        assert!(!verdict.is_verified());
    }

    #[tokio::test]
    async fn test_injected_failure_is_transient() {
        let (backend, handle) = MockBackend::new();
        handle.fail(CallKind::FetchQueue);

        let error = backend.fetch_queue().await.unwrap_err();
        assert!(error.is_transient());

        handle.recover(CallKind::FetchQueue);
        assert!(backend.fetch_queue().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_delays_response() {
        let (backend, handle) = MockBackend::new();
        handle.set_latency(CallKind::LoadSettings, Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        backend.load_settings().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_reset_clears_code_readings() {
        let (backend, handle) = MockBackend::new();
        handle.set_reading(StationId::Confirmation, CaptureMode::Code, ada());

        backend.reset_scan().await.unwrap();

        let who = backend
            .poll_recognition(StationId::Confirmation, CaptureMode::Code)
            .await
            .unwrap();
        assert!(who.is_sentinel());
    }
}
