//! Station 2 scan debouncer.
//!
//! Remembers the identity currently shown at station 2 so a code held in
//! front of the camera is surfaced and queued once per appearance. The
//! auto-clear deadline lives in the timer registry under
//! `TimerPurpose::Station2Clear`.

use gradcheck_core::Identity;
use tracing::debug;

/// What to do with a station 2 reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDecision {
    /// New identity: show it, restart the dwell timer, enqueue it.
    Fresh,
    /// Already on screen, or nothing scanned.
    Ignore,
}

#[derive(Debug, Clone, Default)]
pub struct Station2Debouncer {
    displayed: Option<Identity>,
}

impl Station2Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity currently shown, if any.
    pub fn displayed(&self) -> Option<&Identity> {
        self.displayed.as_ref()
    }

    pub fn is_displayed(&self, identity: &Identity) -> bool {
        self.displayed
            .as_ref()
            .is_some_and(|shown| shown.same_person(identity))
    }

    /// Classify a scan and, when fresh, mark it as displayed.
    pub fn on_scan(&mut self, identity: &Identity) -> ScanDecision {
        if identity.is_sentinel() || self.is_displayed(identity) {
            debug!(identity = %identity, "station 2 scan ignored");
            return ScanDecision::Ignore;
        }
        self.displayed = Some(identity.clone());
        ScanDecision::Fresh
    }

    /// Forget the displayed identity.
    pub fn clear(&mut self) {
        self.displayed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_scan_ignored() {
        let mut debouncer = Station2Debouncer::new();
        let ada = Identity::new("2201", "Ada");

        assert_eq!(debouncer.on_scan(&ada), ScanDecision::Fresh);
        assert_eq!(debouncer.on_scan(&ada), ScanDecision::Ignore);
        assert_eq!(debouncer.displayed(), Some(&ada));
    }

    #[test]
    fn test_new_identity_replaces() {
        let mut debouncer = Station2Debouncer::new();
        debouncer.on_scan(&Identity::new("2201", "Ada"));

        let eve = Identity::new("9", "Eve");
        assert_eq!(debouncer.on_scan(&eve), ScanDecision::Fresh);
        assert!(debouncer.is_displayed(&eve));
    }

    #[test]
    fn test_sentinel_never_displayed() {
        let mut debouncer = Station2Debouncer::new();
        assert_eq!(debouncer.on_scan(&Identity::sentinel()), ScanDecision::Ignore);
        assert!(debouncer.displayed().is_none());
    }

    #[test]
    fn test_clear_allows_same_identity_again() {
        let mut debouncer = Station2Debouncer::new();
        let ada = Identity::new("2201", "Ada");
        debouncer.on_scan(&ada);
        debouncer.clear();
        assert_eq!(debouncer.on_scan(&ada), ScanDecision::Fresh);
    }
}
