//! Shared constants for the check-in kiosk.
//!
//! Timing values here are the defaults used by the coordinator when no
//! configuration overrides them. All periods are expressed in milliseconds
//! unless the name says otherwise.
//!
//! ```
//! use gradcheck_core::constants::*;
//! use std::time::Duration;
//!
//! let poll = Duration::from_millis(DEFAULT_RECOGNITION_POLL_MS);
//! assert_eq!(poll.as_secs(), 3);
//! assert_eq!(SENTINEL_ID, "---");
//! ```

// ============================================================================
// Identity
// ============================================================================

/// Reserved identifier meaning "nobody is currently recognized".
///
/// The recognition service reports this value for both `id` and `name` when
/// no face or code is in view. It is never a valid person.
pub const SENTINEL_ID: &str = "---";

/// Display name paired with [`SENTINEL_ID`].
pub const SENTINEL_NAME: &str = "---";

// ============================================================================
// Stations
// ============================================================================

/// Number of fixed kiosk stations.
pub const STATION_COUNT: usize = 3;

// ============================================================================
// Timing defaults
// ============================================================================

/// Period between recognition requests for the active station.
pub const DEFAULT_RECOGNITION_POLL_MS: u64 = 3000;

/// Period between code readings while a handshake waits for the scanned code.
pub const DEFAULT_CODE_POLL_MS: u64 = 1000;

/// Upper bound on how long a handshake waits for the scanned code.
pub const DEFAULT_CODE_WAIT_MAX_SECS: u64 = 60;

/// Number of visible countdown ticks after a successful verification.
pub const DEFAULT_COUNTDOWN_TICKS: u32 = 10;

/// Length of one countdown tick.
pub const DEFAULT_COUNTDOWN_TICK_MS: u64 = 1000;

/// How long a station 2 scan stays on screen before auto-clearing.
pub const DEFAULT_STATION2_DWELL_MS: u64 = 5000;

/// Period between queue snapshots while the queue monitor is active.
pub const DEFAULT_QUEUE_REFRESH_MS: u64 = 3000;

/// Timeout applied to each collaborator request.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3000;

// ============================================================================
// Collaborator defaults
// ============================================================================

/// Base URL of the recognition and queue server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Template used to locate a person's photo. `{id}` and `{name}` are substituted.
pub const DEFAULT_PHOTO_URL_TEMPLATE: &str = "/static/photos/{id}.jpg";

/// Template used to locate the generated ticket code for a verified person.
pub const DEFAULT_CODE_ARTIFACT_TEMPLATE: &str = "database/barcode_generated/{id}_{name}.png";

/// Wire value reported by the server for the entry currently being served.
pub const QUEUE_FLAG_CURRENT: &str = "Y";

/// Wire value reported by the server for entries still waiting.
pub const QUEUE_FLAG_WAITING: &str = "N";
