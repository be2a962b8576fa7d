//! Orchestration core of the graduation check-in kiosk.
//!
//! Three stations share one coordinator:
//!
//! - **Station 1** recognizes a face, then asks for the graduate's ticket
//!   code and verifies the pair ([`handshake`])
//! - **Station 2** reads ticket codes and adds each graduate to the service
//!   queue once per appearance ([`debouncer`])
//! - **Station 3** shows the serving queue ([`queue`])
//!
//! Exactly one station is active at a time ([`router`]). Periodic polls and
//! deadlines go through a single registry keyed by purpose ([`timers`]), and
//! every change is published as an immutable [`KioskView`] ([`display`]).
//!
//! Start it with [`spawn_coordinator`] and drive it through the returned
//! [`CoordinatorHandle`].

pub mod config;
pub mod coordinator;
pub mod debouncer;
pub mod display;
pub mod error;
pub mod handshake;
pub mod poller;
pub mod queue;
pub mod router;
pub mod timers;

pub use config::CoordinatorConfig;
pub use coordinator::{CoordinatorHandle, spawn_coordinator};
pub use display::KioskView;
pub use error::{CoordinatorError, Result};
pub use handshake::HandshakeStatus;
