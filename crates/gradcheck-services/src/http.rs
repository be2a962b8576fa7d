//! HTTP backend for the kiosk server.
//!
//! Talks to the Flask server that owns the cameras, the recognition
//! pipelines and the service queue.
//!
//! # Routes
//!
//! | Contract | Route |
//! |---|---|
//! | Camera stream | `GET /video/{n}?mode=face\|barcode` (URL only, never fetched here) |
//! | Recognition | `GET /recognition/{n}` |
//! | Verification | `POST /verify` |
//! | Reset scan | `GET /reset-scan` |
//! | Enqueue | `POST /queue/add` |
//! | Queue snapshot | `GET /queue` |
//! | Advance | `POST /queue/next` |
//! | Settings | `GET /get-settings`, `POST /save-settings` |
//! | Notification | `POST /send-email` |
//!
//! # Example
//!
//! ```no_run
//! use gradcheck_services::{HttpBackend, HttpBackendConfig, RecognitionService};
//! use gradcheck_core::{CaptureMode, StationId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = HttpBackend::new(HttpBackendConfig::default())?;
//! let who = backend
//!     .poll_recognition(StationId::CheckIn, CaptureMode::Face)
//!     .await?;
//! println!("recognized: {who}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use gradcheck_core::{
    CaptureMode, Identity, ModelSelection, QueueEntry, StationId,
    constants::{DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SERVER_URL},
};
use reqwest::{Client, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, trace, warn};

use crate::error::{Result, ServiceError};
use crate::traits::{
    CameraService, NotificationService, Outcome, QueueService, RecognitionService,
    SettingsService, StreamHandle, Verdict, VerificationService,
};
use crate::wire::{
    EnqueueRequest, NotifyRequest, QueueRow, RecognitionReply, ReplyStatus, SaveSettingsReply,
    StatusReply, VerifyReply, VerifyRequest,
};

/// Configuration for the HTTP backend.
///
/// ```
/// use gradcheck_services::HttpBackendConfig;
/// use std::time::Duration;
///
/// let config = HttpBackendConfig {
///     base_url: "http://10.0.0.5:5000".to_string(),
///     timeout: Duration::from_millis(1500),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Server base URL, without a trailing slash.
    pub base_url: String,

    /// Timeout for each request.
    pub timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

/// Collaborator backend speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// Creates a new backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::transport("client", e.to_string()))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        debug!("Creating HTTP backend for {}", base_url);

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
        })
    }

    /// Server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(path, self.client.get(self.url(path))).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(path, self.client.post(self.url(path)).json(body))
            .await
    }

    async fn execute<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T> {
        trace!(endpoint = path, "Sending request");

        let response = request.send().await.map_err(|e| self.map_error(path, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = path, status = status.as_u16(), "Server error");
            return Err(ServiceError::status(path, status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| self.map_error(path, e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::invalid_response(path, e.to_string()))
    }

    fn map_error(&self, path: &str, error: reqwest::Error) -> ServiceError {
        if error.is_timeout() {
            ServiceError::timeout(path, self.timeout.as_millis() as u64)
        } else {
            ServiceError::transport(path, error.to_string())
        }
    }
}

impl CameraService for HttpBackend {
    async fn select_stream(&self, station: StationId, mode: CaptureMode) -> Result<StreamHandle> {
        // The display pulls the MJPEG stream itself; selecting it is building the URL.
        Ok(StreamHandle::new(format!(
            "{}/video/{}?mode={}",
            self.base_url,
            station,
            mode.as_wire()
        )))
    }
}

impl RecognitionService for HttpBackend {
    async fn poll_recognition(&self, station: StationId, _mode: CaptureMode) -> Result<Identity> {
        let path = format!("/recognition/{station}");
        let reply: RecognitionReply = self.get_json(&path).await?;
        Ok(reply.into())
    }

    async fn reset_scan(&self) -> Result<()> {
        let _: serde_json::Value = self.get_json("/reset-scan").await?;
        Ok(())
    }
}

impl VerificationService for HttpBackend {
    async fn submit_verification(&self, face: &Identity, code: &Identity) -> Result<Verdict> {
        let body = VerifyRequest {
            face_id: &face.id,
            code_id: &code.id,
        };
        let reply: VerifyReply = self.post_json("/verify", &body).await?;
        Ok(reply.into())
    }
}

impl QueueService for HttpBackend {
    async fn enqueue(&self, identity: &Identity) -> Result<Outcome> {
        let body = EnqueueRequest { id: &identity.id };
        let reply: StatusReply = self.post_json("/queue/add", &body).await?;
        Ok(reply.into())
    }

    async fn fetch_queue(&self) -> Result<Vec<QueueEntry>> {
        let rows: Vec<QueueRow> = self.get_json("/queue").await?;
        Ok(rows.into_iter().map(QueueEntry::from).collect())
    }

    async fn advance_current(&self) -> Result<Outcome> {
        let reply: StatusReply = self.post_json("/queue/next", &()).await?;
        Ok(reply.into())
    }
}

impl SettingsService for HttpBackend {
    async fn load_settings(&self) -> Result<ModelSelection> {
        self.get_json("/get-settings").await
    }

    async fn save_settings(&self, selection: ModelSelection) -> Result<ModelSelection> {
        let reply: SaveSettingsReply = self.post_json("/save-settings", &selection).await?;
        match (reply.status, reply.selected) {
            (ReplyStatus::Success, Some(stored)) => Ok(stored),
            (ReplyStatus::Success, None) => Ok(selection),
            (ReplyStatus::Failure, _) => Err(ServiceError::invalid_response(
                "/save-settings",
                "server refused settings",
            )),
        }
    }
}

impl NotificationService for HttpBackend {
    async fn send_notification(&self, identity: &Identity) -> Result<Outcome> {
        let body = NotifyRequest {
            id: &identity.id,
            name: &identity.name,
        };
        let reply: StatusReply = self.post_json("/send-email", &body).await?;
        Ok(reply.into())
    }
}
