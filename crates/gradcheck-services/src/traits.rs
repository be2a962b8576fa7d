//! Collaborator trait definitions.
//!
//! These traits are the narrow request/response contracts the coordinator
//! uses to reach everything outside itself: the camera stream selector, the
//! recognition backend, verification, the service queue, model settings and
//! the notification mailer.
//!
//! Methods return `impl Future + Send` so the coordinator can run each request
//! on its own task. Implementations may still be written with `async fn`.

use std::future::Future;

use gradcheck_core::{CaptureMode, Identity, ModelSelection, QueueEntry, StationId};

use crate::error::Result;

/// Opaque handle to a selected camera stream.
///
/// For the HTTP backend this is the MJPEG URL the display should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle(String);

impl StreamHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// Location the display loads the stream from.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a request that the server may accept or refuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The server applied the request.
    Accepted { message: String },
    /// The server refused the request for a business reason.
    Rejected { message: String },
}

impl Outcome {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self::Accepted {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Server-supplied message, whichever way it went.
    pub fn message(&self) -> &str {
        match self {
            Self::Accepted { message } | Self::Rejected { message } => message,
        }
    }
}

/// Decision returned by the verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Face and code belong to the same person.
    ///
    /// `identity` is the server's view of who was verified, when it says.
    Verified {
        message: String,
        identity: Option<Identity>,
    },
    /// The pair was refused (mismatch, unknown code, ...).
    Rejected { message: String },
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// Camera stream selection.
pub trait CameraService: Send + Sync {
    /// Select the stream shown for `station` in `mode`.
    fn select_stream(
        &self,
        station: StationId,
        mode: CaptureMode,
    ) -> impl Future<Output = Result<StreamHandle>> + Send;
}

/// Recognition backend shared by the face and code pipelines.
pub trait RecognitionService: Send + Sync {
    /// Latest identity recognized for `station` in `mode`.
    ///
    /// Returns the sentinel identity when nothing is in view.
    fn poll_recognition(
        &self,
        station: StationId,
        mode: CaptureMode,
    ) -> impl Future<Output = Result<Identity>> + Send;

    /// Clear the backend's cached detections.
    fn reset_scan(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Two-factor verification.
pub trait VerificationService: Send + Sync {
    /// Submit the captured face and code identities for a decision.
    fn submit_verification(
        &self,
        face: &Identity,
        code: &Identity,
    ) -> impl Future<Output = Result<Verdict>> + Send;
}

/// Server-authoritative service queue.
pub trait QueueService: Send + Sync {
    /// Add `identity` to the end of the queue.
    fn enqueue(&self, identity: &Identity) -> impl Future<Output = Result<Outcome>> + Send;

    /// Full queue snapshot in server order.
    fn fetch_queue(&self) -> impl Future<Output = Result<Vec<QueueEntry>>> + Send;

    /// Move the current pointer to the next entry.
    fn advance_current(&self) -> impl Future<Output = Result<Outcome>> + Send;
}

/// Recognition model settings stored by the server.
pub trait SettingsService: Send + Sync {
    fn load_settings(&self) -> impl Future<Output = Result<ModelSelection>> + Send;

    /// Store `selection` and return what the server now has.
    fn save_settings(
        &self,
        selection: ModelSelection,
    ) -> impl Future<Output = Result<ModelSelection>> + Send;
}

/// Outbound notification for verified graduates.
pub trait NotificationService: Send + Sync {
    fn send_notification(&self, identity: &Identity)
    -> impl Future<Output = Result<Outcome>> + Send;
}

/// Everything the coordinator needs from the outside world.
///
/// Blanket-implemented for any type that provides every collaborator.
pub trait KioskBackend:
    CameraService
    + RecognitionService
    + VerificationService
    + QueueService
    + SettingsService
    + NotificationService
    + 'static
{
}

impl<T> KioskBackend for T where
    T: CameraService
        + RecognitionService
        + VerificationService
        + QueueService
        + SettingsService
        + NotificationService
        + 'static
{
}
