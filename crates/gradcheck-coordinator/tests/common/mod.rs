//! Shared helpers for coordinator integration tests.
//!
//! Every test runs on a paused Tokio clock: sleeping advances virtual time
//! only once the coordinator, its timers and the mock server are idle, so
//! timings below are exact.

#![allow(dead_code)]

use std::time::Duration;

use gradcheck_coordinator::display::{HandshakePanel, QueuePanel, ScanPanel};
use gradcheck_coordinator::{CoordinatorConfig, CoordinatorHandle, KioskView, spawn_coordinator};
use gradcheck_core::{CaptureMode, Identity, QueueEntry, StationId};
use gradcheck_services::mock::{MockBackend, MockBackendHandle};
use tokio::task::JoinHandle;

/// A running coordinator plus the mock server behind it.
pub struct Kiosk {
    pub handle: CoordinatorHandle,
    pub server: MockBackendHandle,
    pub task: JoinHandle<()>,
}

impl Kiosk {
    pub fn view(&self) -> KioskView {
        self.handle.view()
    }

    pub fn handshake(&self) -> HandshakePanel {
        self.view().handshake().cloned().unwrap()
    }

    pub fn scan(&self) -> ScanPanel {
        self.view().scan().cloned().unwrap()
    }

    pub fn queue(&self) -> QueuePanel {
        self.view().queue().cloned().unwrap()
    }

    pub fn mode(&self, station: StationId) -> CaptureMode {
        self.view().station(station).unwrap().mode
    }

    /// Activate and let the resulting requests land.
    pub async fn activate(&self, station: StationId, mode: CaptureMode) {
        self.handle.activate_station(station, mode).await.unwrap();
        settle().await;
    }
}

/// Start a coordinator with default timings.
///
/// `script` runs against the mock server before the coordinator starts.
pub async fn start_with(script: impl FnOnce(&MockBackendHandle)) -> Kiosk {
    start_configured(CoordinatorConfig::default(), script).await
}

pub async fn start_configured(
    config: CoordinatorConfig,
    script: impl FnOnce(&MockBackendHandle),
) -> Kiosk {
    let (backend, server) = MockBackend::new();
    script(&server);
    let (handle, task) = spawn_coordinator(backend, config).unwrap();
    settle().await;
    Kiosk {
        handle,
        server,
        task,
    }
}

pub async fn start() -> Kiosk {
    start_with(|_| {}).await
}

/// Let in-flight work finish without crossing a poll boundary.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

pub async fn advance(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

pub fn ada() -> Identity {
    Identity::new("2201", "Ada")
}

pub fn eve() -> Identity {
    Identity::new("9", "Eve")
}

pub fn entry(id: &str, name: &str, current: bool) -> QueueEntry {
    QueueEntry::new(Identity::new(id, name), current)
}
