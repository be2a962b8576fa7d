//! Station display router.
//!
//! Tracks the single active station, the capture mode of every station and
//! the context epoch. Every request the coordinator issues is stamped with a
//! [`RequestContext`]; when the router moves on (station switch, mode change,
//! session reset) the epoch advances and older responses stop matching.

use gradcheck_core::{CaptureMode, StationId};
use tracing::info;

/// Snapshot of the routing state a request was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestContext {
    pub station: StationId,
    pub mode: CaptureMode,
    pub epoch: u64,
}

/// What an activation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationChange {
    pub from: StationId,
    pub to: StationId,
    pub mode: CaptureMode,
}

impl StationChange {
    /// `true` when the active station changed (not just its mode).
    pub fn switched(&self) -> bool {
        self.from != self.to
    }

    /// `true` when `station` was active before and is not anymore.
    pub fn left(&self, station: StationId) -> bool {
        self.switched() && self.from == station
    }

    /// `true` when `station` is now active and was not before.
    pub fn entered(&self, station: StationId) -> bool {
        self.switched() && self.to == station
    }
}

/// Owner of the active station and per-station modes.
///
/// The active station is a single value, so two stations can never be
/// marked active at once.
#[derive(Debug, Clone)]
pub struct StationRouter {
    active: StationId,
    modes: [CaptureMode; 3],
    epoch: u64,
}

impl Default for StationRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl StationRouter {
    /// Station 1 active in face mode.
    pub fn new() -> Self {
        Self {
            active: StationId::CheckIn,
            modes: [CaptureMode::Face; 3],
            epoch: 0,
        }
    }

    pub fn active(&self) -> StationId {
        self.active
    }

    pub fn is_active(&self, station: StationId) -> bool {
        self.active == station
    }

    /// Mode of the active station.
    pub fn mode(&self) -> CaptureMode {
        self.mode_of(self.active)
    }

    pub fn mode_of(&self, station: StationId) -> CaptureMode {
        self.modes[slot(station)]
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Context for a request issued now.
    pub fn context(&self) -> RequestContext {
        RequestContext {
            station: self.active,
            mode: self.mode(),
            epoch: self.epoch,
        }
    }

    /// Whether a response issued under `context` may still be applied.
    pub fn is_current(&self, context: &RequestContext) -> bool {
        *context == self.context()
    }

    /// Make `station` the only active station, in `mode`.
    ///
    /// Always advances the epoch, even when re-activating the same
    /// station and mode.
    pub fn activate(&mut self, station: StationId, mode: CaptureMode) -> StationChange {
        let from = self.active;
        self.active = station;
        self.modes[slot(station)] = mode;
        self.epoch += 1;

        info!(from = %from, station = %station, mode = %mode, epoch = self.epoch, "station activated");
        StationChange {
            from,
            to: station,
            mode,
        }
    }

    /// Change the active station's mode. Advances the epoch.
    pub fn set_mode(&mut self, mode: CaptureMode) -> RequestContext {
        self.modes[slot(self.active)] = mode;
        self.epoch += 1;
        info!(station = %self.active, mode = %mode, epoch = self.epoch, "capture mode changed");
        self.context()
    }

    /// Invalidate every outstanding request without changing routing.
    pub fn bump(&mut self) -> RequestContext {
        self.epoch += 1;
        self.context()
    }

    /// Every station with its active flag and mode, in display order.
    pub fn stations(&self) -> [(StationId, bool, CaptureMode); 3] {
        StationId::ALL.map(|station| (station, self.is_active(station), self.mode_of(station)))
    }
}

fn slot(station: StationId) -> usize {
    usize::from(station.to_u8() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_at_check_in_face() {
        let router = StationRouter::new();
        assert_eq!(router.active(), StationId::CheckIn);
        assert_eq!(router.mode(), CaptureMode::Face);
        assert_eq!(router.epoch(), 0);
    }

    #[test]
    fn test_activate_reports_change() {
        let mut router = StationRouter::new();

        let change = router.activate(StationId::Confirmation, CaptureMode::Code);
        assert!(change.switched());
        assert!(change.left(StationId::CheckIn));
        assert!(change.entered(StationId::Confirmation));

        let change = router.activate(StationId::Confirmation, CaptureMode::Face);
        assert!(!change.switched());
        assert!(!change.entered(StationId::Confirmation));
        assert_eq!(router.mode(), CaptureMode::Face);
    }

    #[test]
    fn test_modes_are_per_station() {
        let mut router = StationRouter::new();
        router.activate(StationId::Confirmation, CaptureMode::Code);
        router.activate(StationId::CheckIn, CaptureMode::Face);

        assert_eq!(router.mode_of(StationId::Confirmation), CaptureMode::Code);
        assert_eq!(router.mode(), CaptureMode::Face);
    }

    #[test]
    fn test_stale_context_detected() {
        let mut router = StationRouter::new();
        let issued = router.context();
        assert!(router.is_current(&issued));

        router.set_mode(CaptureMode::Code);
        assert!(!router.is_current(&issued));

        let issued = router.context();
        router.bump();
        assert!(!router.is_current(&issued));
    }

    #[test]
    fn test_reactivating_same_station_invalidates() {
        let mut router = StationRouter::new();
        let issued = router.context();
        router.activate(StationId::CheckIn, CaptureMode::Face);
        assert!(!router.is_current(&issued));
    }

    fn station() -> impl Strategy<Value = StationId> {
        prop::sample::select(StationId::ALL.to_vec())
    }

    fn mode() -> impl Strategy<Value = CaptureMode> {
        prop_oneof![Just(CaptureMode::Face), Just(CaptureMode::Code)]
    }

    proptest! {
        #[test]
        fn prop_exactly_one_active(steps in prop::collection::vec((station(), mode()), 0..40)) {
            let mut router = StationRouter::new();
            let mut last_epoch = router.epoch();
            for (station, mode) in steps {
                router.activate(station, mode);
                let active: Vec<_> = router.stations().iter().filter(|(_, on, _)| *on).map(|(s, _, _)| *s).collect();
                prop_assert_eq!(active, vec![station]);
                prop_assert_eq!(router.mode(), mode);
                prop_assert!(router.epoch() > last_epoch);
                last_epoch = router.epoch();
            }
        }
    }
}
