//! JSON bodies exchanged with the kiosk server.

use gradcheck_core::{Identity, ModelSelection, QueueEntry, QueueFlag};
use serde::{Deserialize, Serialize};

use crate::traits::{Outcome, Verdict};

/// `status` field shared by the server's replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    #[serde(other)]
    Failure,
}

/// `GET /recognition/{n}`
#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionReply {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<RecognitionReply> for Identity {
    fn from(reply: RecognitionReply) -> Self {
        match reply.id {
            Some(id) => Identity::new(id, reply.name.unwrap_or_default()),
            None => Identity::sentinel(),
        }
    }
}

/// `POST /verify`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest<'a> {
    pub face_id: &'a str,
    pub code_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyReply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<VerifyReply> for Verdict {
    fn from(reply: VerifyReply) -> Self {
        match reply.status {
            ReplyStatus::Success => Verdict::Verified {
                message: reply.message,
                identity: reply
                    .id
                    .map(|id| Identity::new(id, reply.name.unwrap_or_default()))
                    .filter(|identity| !identity.is_sentinel()),
            },
            ReplyStatus::Failure => Verdict::Rejected {
                message: reply.message,
            },
        }
    }
}

/// Generic `{status, message}` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusReply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub message: String,
}

impl From<StatusReply> for Outcome {
    fn from(reply: StatusReply) -> Self {
        match reply.status {
            ReplyStatus::Success => Outcome::Accepted {
                message: reply.message,
            },
            ReplyStatus::Failure => Outcome::Rejected {
                message: reply.message,
            },
        }
    }
}

/// `POST /queue/add`
#[derive(Debug, Clone, Serialize)]
pub struct EnqueueRequest<'a> {
    pub id: &'a str,
}

/// One row of `GET /queue`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub is_current: QueueFlag,
}

impl From<QueueRow> for QueueEntry {
    fn from(row: QueueRow) -> Self {
        QueueEntry::new(Identity::new(row.id, row.name), row.is_current.is_current())
    }
}

/// `POST /save-settings`
#[derive(Debug, Clone, Deserialize)]
pub struct SaveSettingsReply {
    pub status: ReplyStatus,
    pub selected: Option<ModelSelection>,
}

/// `POST /send-email`
#[derive(Debug, Clone, Serialize)]
pub struct NotifyRequest<'a> {
    pub id: &'a str,
    pub name: &'a str,
}
