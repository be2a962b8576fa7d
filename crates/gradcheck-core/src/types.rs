use crate::{
    Result,
    constants::{QUEUE_FLAG_CURRENT, QUEUE_FLAG_WAITING, SENTINEL_ID, SENTINEL_NAME},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three fixed kiosk stations.
///
/// Exactly one station is active at any time; which one is owned by the
/// station router in the coordinator crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum StationId {
    /// Face check-in with the two-factor handshake.
    CheckIn = 1,
    /// Code confirmation that feeds the service queue.
    Confirmation = 2,
    /// Live serving-queue monitor.
    QueueMonitor = 3,
}

impl StationId {
    /// All stations in display order.
    pub const ALL: [StationId; 3] = [
        StationId::CheckIn,
        StationId::Confirmation,
        StationId::QueueMonitor,
    ];

    /// Create a station from its numeric identifier.
    ///
    /// # Errors
    /// Returns `Error::InvalidStation` if the value is not 1, 2 or 3.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(StationId::CheckIn),
            2 => Ok(StationId::Confirmation),
            3 => Ok(StationId::QueueMonitor),
            _ => Err(Error::InvalidStation { code: value }),
        }
    }

    /// Numeric identifier used on the wire and in routes.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` if this station runs recognition polling.
    ///
    /// The queue monitor is refreshed from the queue service instead.
    #[inline]
    #[must_use]
    pub fn polls_recognition(self) -> bool {
        !matches!(self, StationId::QueueMonitor)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_u8())
    }
}

impl std::str::FromStr for StationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidStation { code: 0 })?;
        StationId::from_u8(value)
    }
}

/// Capture mode selected for a station's camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Face recognition pipeline.
    #[default]
    #[serde(rename = "face")]
    Face,
    /// Barcode / QR code pipeline.
    #[serde(rename = "barcode", alias = "code")]
    Code,
}

impl CaptureMode {
    /// Spelling used by the camera and recognition routes.
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            CaptureMode::Face => "face",
            CaptureMode::Code => "barcode",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CaptureMode::Face => write!(f, "face"),
            CaptureMode::Code => write!(f, "code"),
        }
    }
}

impl std::str::FromStr for CaptureMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "face" => Ok(CaptureMode::Face),
            "code" | "barcode" | "qr" => Ok(CaptureMode::Code),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

/// A recognized person.
///
/// The recognition service reports `"---"` for both fields when nothing is in
/// view; use [`Identity::sentinel`] and [`Identity::is_sentinel`] rather than
/// comparing strings by hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
}

impl Identity {
    /// Create an identity from its id and display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The reserved "no match" identity.
    #[must_use]
    pub fn sentinel() -> Self {
        Self::new(SENTINEL_ID, SENTINEL_NAME)
    }

    /// Returns `true` for the reserved "no match" identity.
    ///
    /// An empty id is treated the same way so a malformed reading can never
    /// be mistaken for a person.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        let id = self.id.trim();
        id.is_empty() || id == SENTINEL_ID
    }

    /// Returns `true` if both identities refer to the same person.
    ///
    /// Sentinels never match anything, including each other.
    #[must_use]
    pub fn same_person(&self, other: &Identity) -> bool {
        !self.is_sentinel() && !other.is_sentinel() && self.id == other.id
    }

    /// Expand `{id}` and `{name}` in a path or URL template.
    ///
    /// Spaces in the name become underscores, matching how ticket files are
    /// named on disk.
    ///
    /// ```
    /// use gradcheck_core::Identity;
    ///
    /// let who = Identity::new("2201", "Ada Lovelace");
    /// assert_eq!(who.expand("codes/{id}_{name}.png"), "codes/2201_Ada_Lovelace.png");
    /// ```
    #[must_use]
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{id}", self.id.trim())
            .replace("{name}", &self.name.trim().replace(' ', "_"))
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::sentinel()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_sentinel() {
            write!(f, "{SENTINEL_ID}")
        } else {
            write!(f, "{} ({})", self.name, self.id)
        }
    }
}

/// Serving flag as reported by the queue service (`"Y"` / `"N"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueFlag {
    #[serde(rename = "Y", alias = "y")]
    Current,
    #[serde(rename = "N", alias = "n")]
    Waiting,
}

impl QueueFlag {
    /// Returns `true` for the entry being served.
    #[inline]
    #[must_use]
    pub fn is_current(self) -> bool {
        matches!(self, QueueFlag::Current)
    }
}

impl std::str::FromStr for QueueFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            v if v.eq_ignore_ascii_case(QUEUE_FLAG_CURRENT) => Ok(QueueFlag::Current),
            v if v.eq_ignore_ascii_case(QUEUE_FLAG_WAITING) => Ok(QueueFlag::Waiting),
            other => Err(Error::InvalidQueueFlag(other.to_string())),
        }
    }
}

/// One entry of the server-ordered service queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub identity: Identity,
    pub is_current: bool,
}

impl QueueEntry {
    pub fn new(identity: Identity, is_current: bool) -> Self {
        Self {
            identity,
            is_current,
        }
    }
}

/// Face recognition pipeline selected on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FaceModel {
    #[default]
    #[serde(rename = "insightFace")]
    InsightFace,
    #[serde(rename = "mtcnn")]
    Mtcnn,
}

/// Barcode decoding pipeline selected on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarcodeModel {
    #[default]
    #[serde(rename = "zxing")]
    Zxing,
    #[serde(rename = "pyzbar")]
    Pyzbar,
}

impl std::str::FromStr for FaceModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insightface" => Ok(FaceModel::InsightFace),
            "mtcnn" => Ok(FaceModel::Mtcnn),
            other => Err(Error::InvalidModel(other.to_string())),
        }
    }
}

impl std::str::FromStr for BarcodeModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zxing" => Ok(BarcodeModel::Zxing),
            "pyzbar" => Ok(BarcodeModel::Pyzbar),
            other => Err(Error::InvalidModel(other.to_string())),
        }
    }
}

/// Recognition pipelines the server should run for camera streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelSelection {
    pub face: FaceModel,
    pub barcode: BarcodeModel,
}
