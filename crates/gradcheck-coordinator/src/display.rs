//! Render targets and the published kiosk view.
//!
//! Each station has one [`StationDisplay`], created once at startup and
//! looked up by [`StationId`]. The coordinator writes readings, streams and
//! panels into them; after every event it publishes an immutable
//! [`KioskView`] that the operator shell renders.
//!
//! ```
//! use gradcheck_core::{Identity, StationId};
//! use gradcheck_coordinator::display::{Panel, StationDisplays};
//!
//! let mut displays = StationDisplays::new();
//! displays.set_reading(StationId::Confirmation, Identity::new("2201", "Ada"));
//!
//! let station = displays.get(StationId::Confirmation).unwrap();
//! assert_eq!(station.reading.id, "2201");
//! assert!(matches!(station.panel, Panel::Scan(_)));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use gradcheck_core::{CaptureMode, Identity, ModelSelection, StationId};
use gradcheck_services::StreamHandle;

use crate::handshake::{Handshake, HandshakeStatus};
use crate::queue::QueueView;
use crate::timers::TimerPurpose;

/// Station 1 panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakePanel {
    pub status: HandshakeStatus,
    pub face: Identity,
    pub code: Identity,
    pub message: Option<String>,
    pub scan_enabled: bool,
    pub countdown: Option<u32>,
    /// Ticket code location; only shown once verified.
    pub code_artifact: Option<String>,
}

impl HandshakePanel {
    /// Project the handshake. `artifact_template` locates the ticket code.
    pub fn project(handshake: &Handshake, artifact_template: &str) -> Self {
        let session = handshake.session();
        let code_artifact = match session.status() {
            HandshakeStatus::Verified => session
                .verified()
                .map(|identity| identity.expand(artifact_template)),
            _ => None,
        };
        Self {
            status: session.status(),
            face: session.face().clone(),
            code: session.code().clone(),
            message: session.message().map(str::to_string),
            scan_enabled: handshake.scan_enabled(),
            countdown: session.countdown(),
            code_artifact,
        }
    }
}

/// Station 2 panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPanel {
    pub identity: Option<Identity>,
    pub photo_url: Option<String>,
    pub message: Option<String>,
}

impl ScanPanel {
    /// Show a freshly scanned identity.
    pub fn show(&mut self, identity: Identity, photo_template: &str) {
        self.photo_url = Some(identity.expand(photo_template));
        self.identity = Some(identity);
        self.message = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_clear(&self) -> bool {
        self.identity.is_none()
    }
}

/// Station 3 panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueuePanel {
    pub view: QueueView,
    pub message: Option<String>,
}

/// Station-specific part of a display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel {
    Handshake(HandshakePanel),
    Scan(ScanPanel),
    Queue(QueuePanel),
}

impl Panel {
    fn for_station(station: StationId) -> Self {
        match station {
            StationId::CheckIn => Panel::Handshake(HandshakePanel::default()),
            StationId::Confirmation => Panel::Scan(ScanPanel::default()),
            StationId::QueueMonitor => Panel::Queue(QueuePanel::default()),
        }
    }
}

/// Render target for one station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationDisplay {
    pub station: StationId,
    /// Selected camera stream; `None` until the first selection lands.
    pub stream: Option<StreamHandle>,
    /// Latest recognition reading; the sentinel when absent or failed.
    pub reading: Identity,
    pub panel: Panel,
}

/// Every station's render target, keyed by station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationDisplays {
    displays: BTreeMap<StationId, StationDisplay>,
}

impl Default for StationDisplays {
    fn default() -> Self {
        Self::new()
    }
}

impl StationDisplays {
    pub fn new() -> Self {
        let displays = StationId::ALL
            .into_iter()
            .map(|station| {
                (
                    station,
                    StationDisplay {
                        station,
                        stream: None,
                        reading: Identity::sentinel(),
                        panel: Panel::for_station(station),
                    },
                )
            })
            .collect();
        Self { displays }
    }

    pub fn get(&self, station: StationId) -> Option<&StationDisplay> {
        self.displays.get(&station)
    }

    pub fn set_stream(&mut self, station: StationId, stream: StreamHandle) {
        if let Some(display) = self.displays.get_mut(&station) {
            display.stream = Some(stream);
        }
    }

    pub fn set_reading(&mut self, station: StationId, reading: Identity) {
        if let Some(display) = self.displays.get_mut(&station) {
            display.reading = reading;
        }
    }

    pub fn set_handshake(&mut self, panel: HandshakePanel) {
        if let Some(Panel::Handshake(current)) = self.panel_mut(StationId::CheckIn) {
            *current = panel;
        }
    }

    pub fn scan_mut(&mut self) -> Option<&mut ScanPanel> {
        match self.panel_mut(StationId::Confirmation) {
            Some(Panel::Scan(panel)) => Some(panel),
            _ => None,
        }
    }

    pub fn set_queue(&mut self, panel: QueuePanel) {
        if let Some(Panel::Queue(current)) = self.panel_mut(StationId::QueueMonitor) {
            *current = panel;
        }
    }

    fn panel_mut(&mut self, station: StationId) -> Option<&mut Panel> {
        self.displays.get_mut(&station).map(|display| &mut display.panel)
    }

    fn iter(&self) -> impl Iterator<Item = &StationDisplay> {
        self.displays.values()
    }
}

/// One station as published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationView {
    pub active: bool,
    pub mode: CaptureMode,
    pub display: StationDisplay,
}

/// Immutable snapshot of everything the operator sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KioskView {
    pub active: StationId,
    pub stations: Vec<StationView>,
    pub settings: Option<ModelSelection>,
    /// Live timers, sorted by purpose.
    pub timers: Vec<TimerPurpose>,
}

impl KioskView {
    pub(crate) fn project(
        active: StationId,
        modes: impl Fn(StationId) -> CaptureMode,
        displays: &StationDisplays,
        settings: Option<ModelSelection>,
        timers: Vec<TimerPurpose>,
    ) -> Self {
        let stations = displays
            .iter()
            .map(|display| StationView {
                active: display.station == active,
                mode: modes(display.station),
                display: display.clone(),
            })
            .collect();
        Self {
            active,
            stations,
            settings,
            timers,
        }
    }

    pub fn station(&self, station: StationId) -> Option<&StationView> {
        self.stations
            .iter()
            .find(|view| view.display.station == station)
    }

    pub fn handshake(&self) -> Option<&HandshakePanel> {
        match self.station(StationId::CheckIn).map(|view| &view.display.panel) {
            Some(Panel::Handshake(panel)) => Some(panel),
            _ => None,
        }
    }

    pub fn scan(&self) -> Option<&ScanPanel> {
        match self.station(StationId::Confirmation).map(|view| &view.display.panel) {
            Some(Panel::Scan(panel)) => Some(panel),
            _ => None,
        }
    }

    pub fn queue(&self) -> Option<&QueuePanel> {
        match self.station(StationId::QueueMonitor).map(|view| &view.display.panel) {
            Some(Panel::Queue(panel)) => Some(panel),
            _ => None,
        }
    }

    /// Latest reading at `station`.
    pub fn reading(&self, station: StationId) -> Option<&Identity> {
        self.station(station).map(|view| &view.display.reading)
    }

    pub fn has_timer(&self, purpose: TimerPurpose) -> bool {
        self.timers.contains(&purpose)
    }
}

impl fmt::Display for KioskView {
    /// Text rendering of the active station.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(view) = self.station(self.active) else {
            return Ok(());
        };
        let display = &view.display;
        write!(f, "[station {} | {}]", self.active, view.mode)?;
        if let Some(stream) = &display.stream {
            write!(f, " {stream}")?;
        }
        writeln!(f)?;
        writeln!(f, "  reading: {}", display.reading)?;

        match &display.panel {
            Panel::Handshake(panel) => {
                writeln!(f, "  status:  {}", panel.status)?;
                writeln!(f, "  face:    {}", panel.face)?;
                writeln!(f, "  code:    {}", panel.code)?;
                if panel.scan_enabled {
                    writeln!(f, "  (scan code available)")?;
                }
                if let Some(message) = &panel.message {
                    writeln!(f, "  message: {message}")?;
                }
                if let Some(artifact) = &panel.code_artifact {
                    writeln!(f, "  ticket:  {artifact}")?;
                }
                if let Some(countdown) = panel.countdown {
                    writeln!(f, "  closing in {countdown}s")?;
                }
            }
            Panel::Scan(panel) => {
                match &panel.identity {
                    Some(identity) => writeln!(f, "  scanned: {identity}")?,
                    None => writeln!(f, "  scanned: -")?,
                }
                if let Some(photo) = &panel.photo_url {
                    writeln!(f, "  photo:   {photo}")?;
                }
                if let Some(message) = &panel.message {
                    writeln!(f, "  message: {message}")?;
                }
            }
            Panel::Queue(panel) => {
                writeln!(f, "  current: {}", panel.view.current_label())?;
                writeln!(f, "  next:    {}", panel.view.next_label())?;
                for line in &panel.view.lines {
                    let marker = if line.is_current { '>' } else { ' ' };
                    writeln!(f, "  {marker}{:>3}. {}", line.position, line.identity)?;
                }
                if let Some(message) = &panel.message {
                    writeln!(f, "  message: {message}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueSnapshot;
    use gradcheck_core::QueueEntry;

    fn view(displays: &StationDisplays, active: StationId) -> KioskView {
        KioskView::project(active, |_| CaptureMode::Face, displays, None, vec![])
    }

    #[test]
    fn test_every_station_has_a_display() {
        let displays = StationDisplays::new();
        for station in StationId::ALL {
            let display = displays.get(station).unwrap();
            assert!(display.reading.is_sentinel());
            assert!(display.stream.is_none());
        }
    }

    #[test]
    fn test_scan_panel_photo_from_template() {
        let mut displays = StationDisplays::new();
        displays
            .scan_mut()
            .unwrap()
            .show(Identity::new("2201", "Ada"), "/static/photos/{id}.jpg");

        let view = view(&displays, StationId::Confirmation);
        let scan = view.scan().unwrap();
        assert_eq!(scan.photo_url.as_deref(), Some("/static/photos/2201.jpg"));
        assert!(!scan.is_clear());
    }

    #[test]
    fn test_artifact_hidden_until_verified() {
        let mut handshake = Handshake::new();
        handshake.observe_face(&Identity::new("2201", "Ada King"));

        let panel = HandshakePanel::project(&handshake, "codes/{id}_{name}.png");
        assert!(panel.scan_enabled);
        assert!(panel.code_artifact.is_none());
    }

    #[test]
    fn test_view_marks_one_active_station() {
        let displays = StationDisplays::new();
        let view = view(&displays, StationId::QueueMonitor);
        let active: Vec<_> = view
            .stations
            .iter()
            .filter(|s| s.active)
            .map(|s| s.display.station)
            .collect();
        assert_eq!(active, [StationId::QueueMonitor]);
    }

    #[test]
    fn test_text_rendering_of_queue() {
        let mut displays = StationDisplays::new();
        let snapshot = QueueSnapshot::new(vec![
            QueueEntry::new(Identity::new("A", "Ann"), false),
            QueueEntry::new(Identity::new("B", "Ben"), true),
        ]);
        displays.set_queue(QueuePanel {
            view: snapshot.render(),
            message: None,
        });

        let text = view(&displays, StationId::QueueMonitor).to_string();
        assert!(text.contains("current: Ben"));
        assert!(text.contains("next:    none"));
        assert!(text.contains(">  2."));
    }
}
