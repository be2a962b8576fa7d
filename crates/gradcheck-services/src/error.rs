//! Error types for collaborator requests.
//!
//! Only transport-level problems are errors. A server that answers with a
//! well-formed `status: "failure"` body is a business rejection and is
//! reported as [`Outcome::Rejected`](crate::traits::Outcome::Rejected) or
//! [`Verdict::Rejected`](crate::traits::Verdict::Rejected) instead.

/// Result type alias for collaborator requests.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur while talking to an external collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request could not be delivered or the connection dropped.
    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The request did not complete within the configured timeout.
    #[error("Request to {endpoint} timed out after {duration_ms}ms")]
    Timeout { endpoint: String, duration_ms: u64 },

    /// The server answered with a non-success HTTP status.
    #[error("Server returned HTTP {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    /// The response body could not be understood.
    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    /// A wire value did not map onto the data model.
    #[error("Invalid data: {0}")]
    Data(#[from] gradcheck_core::Error),
}

impl ServiceError {
    /// Create a new transport error.
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(endpoint: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout {
            endpoint: endpoint.into(),
            duration_ms,
        }
    }

    /// Create a new HTTP status error.
    pub fn status(endpoint: impl Into<String>, status: u16) -> Self {
        Self::Status {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Create a new invalid response error.
    pub fn invalid_response(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for failures the next scheduled attempt may not see.
    ///
    /// Transient failures are recovered by rendering the empty state and
    /// waiting for the next tick; they are never retried eagerly.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::Status { .. }
        )
    }
}
