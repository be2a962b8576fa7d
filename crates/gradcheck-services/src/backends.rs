//! Enum wrapper for backend dispatch.
//!
//! The collaborator traits return `impl Future`, so they cannot be used as
//! trait objects. [`AnyBackend`] gives the binary a single concrete type that
//! can be either the HTTP backend or the in-memory mock chosen at runtime.
//!
//! ```
//! use gradcheck_services::backends::AnyBackend;
//! use gradcheck_services::mock::MockBackend;
//!
//! let (mock, _handle) = MockBackend::new();
//! let backend = AnyBackend::Mock(mock);
//! assert_eq!(backend.kind(), "mock");
//! ```

use gradcheck_core::{CaptureMode, Identity, ModelSelection, QueueEntry, StationId};

use crate::error::Result;
use crate::http::HttpBackend;
use crate::mock::MockBackend;
use crate::traits::{
    CameraService, NotificationService, Outcome, QueueService, RecognitionService,
    SettingsService, StreamHandle, Verdict, VerificationService,
};

/// Backend selected at startup.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyBackend {
    /// Kiosk server over HTTP.
    Http(HttpBackend),
    /// In-memory server for demos and tests.
    Mock(MockBackend),
}

impl AnyBackend {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Mock(_) => "mock",
        }
    }
}

impl CameraService for AnyBackend {
    async fn select_stream(&self, station: StationId, mode: CaptureMode) -> Result<StreamHandle> {
        match self {
            Self::Http(backend) => backend.select_stream(station, mode).await,
            Self::Mock(backend) => backend.select_stream(station, mode).await,
        }
    }
}

impl RecognitionService for AnyBackend {
    async fn poll_recognition(&self, station: StationId, mode: CaptureMode) -> Result<Identity> {
        match self {
            Self::Http(backend) => backend.poll_recognition(station, mode).await,
            Self::Mock(backend) => backend.poll_recognition(station, mode).await,
        }
    }

    async fn reset_scan(&self) -> Result<()> {
        match self {
            Self::Http(backend) => backend.reset_scan().await,
            Self::Mock(backend) => backend.reset_scan().await,
        }
    }
}

impl VerificationService for AnyBackend {
    async fn submit_verification(&self, face: &Identity, code: &Identity) -> Result<Verdict> {
        match self {
            Self::Http(backend) => backend.submit_verification(face, code).await,
            Self::Mock(backend) => backend.submit_verification(face, code).await,
        }
    }
}

impl QueueService for AnyBackend {
    async fn enqueue(&self, identity: &Identity) -> Result<Outcome> {
        match self {
            Self::Http(backend) => backend.enqueue(identity).await,
            Self::Mock(backend) => backend.enqueue(identity).await,
        }
    }

    async fn fetch_queue(&self) -> Result<Vec<QueueEntry>> {
        match self {
            Self::Http(backend) => backend.fetch_queue().await,
            Self::Mock(backend) => backend.fetch_queue().await,
        }
    }

    async fn advance_current(&self) -> Result<Outcome> {
        match self {
            Self::Http(backend) => backend.advance_current().await,
            Self::Mock(backend) => backend.advance_current().await,
        }
    }
}

impl SettingsService for AnyBackend {
    async fn load_settings(&self) -> Result<ModelSelection> {
        match self {
            Self::Http(backend) => backend.load_settings().await,
            Self::Mock(backend) => backend.load_settings().await,
        }
    }

    async fn save_settings(&self, selection: ModelSelection) -> Result<ModelSelection> {
        match self {
            Self::Http(backend) => backend.save_settings(selection).await,
            Self::Mock(backend) => backend.save_settings(selection).await,
        }
    }
}

impl NotificationService for AnyBackend {
    async fn send_notification(&self, identity: &Identity) -> Result<Outcome> {
        match self {
            Self::Http(backend) => backend.send_notification(identity).await,
            Self::Mock(backend) => backend.send_notification(identity).await,
        }
    }
}
