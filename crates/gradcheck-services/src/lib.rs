//! External collaborators of the check-in kiosk.
//!
//! The coordinator never talks to the network directly. Everything it needs
//! from the outside world goes through the traits in [`traits`]:
//!
//! - [`CameraService`]: pick the stream a station displays
//! - [`RecognitionService`]: latest face / code reading, scan reset
//! - [`VerificationService`]: two-factor face + code decision
//! - [`QueueService`]: enqueue, snapshot, advance the current pointer
//! - [`SettingsService`]: recognition model selection
//! - [`NotificationService`]: ticket email for verified graduates
//!
//! [`KioskBackend`] bundles them. Two implementations ship with the crate:
//! [`HttpBackend`] for the real server and [`mock::MockBackend`] for tests
//! and offline demos; [`backends::AnyBackend`] picks one at runtime.
//!
//! # Error Handling
//!
//! Transport failures are [`ServiceError`]s. Business refusals (duplicate
//! queue entry, mismatched identity) are ordinary values:
//! [`Outcome::Rejected`] and [`Verdict::Rejected`].

pub mod backends;
pub mod error;
pub mod http;
pub mod mock;
pub mod traits;
pub mod wire;

pub use backends::AnyBackend;
pub use error::{Result, ServiceError};
pub use http::{HttpBackend, HttpBackendConfig};
pub use traits::{
    CameraService, KioskBackend, NotificationService, Outcome, QueueService, RecognitionService,
    SettingsService, StreamHandle, Verdict, VerificationService,
};
