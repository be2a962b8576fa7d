//! Recognition poll gating and routing.
//!
//! A poll tick issues at most one request per purpose and routing context; a
//! tick that finds its previous request unresolved is skipped, not queued. A
//! request left over from an earlier context never holds up the current one.
//! Where a reading goes depends on the station and mode it was requested for.

use std::collections::HashSet;

use gradcheck_core::{CaptureMode, StationId};
use tracing::debug;

use crate::router::RequestContext;
use crate::timers::TimerPurpose;

/// Destination of a recognition reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollRoute {
    /// Station 1 face: latch into the handshake.
    CheckInFace,
    /// Station 1 code: the handshake's code capture step.
    CheckInCode,
    /// Station 2: the scan debouncer.
    Confirmation,
    /// Station 3 is fed by queue refreshes, not recognition.
    Suppressed,
}

/// Where readings for `(station, mode)` go.
pub fn route(station: StationId, mode: CaptureMode) -> PollRoute {
    match (station, mode) {
        (StationId::CheckIn, CaptureMode::Face) => PollRoute::CheckInFace,
        (StationId::CheckIn, CaptureMode::Code) => PollRoute::CheckInCode,
        (StationId::Confirmation, _) => PollRoute::Confirmation,
        (StationId::QueueMonitor, _) => PollRoute::Suppressed,
    }
}

/// In-flight tracking for poll purposes.
#[derive(Debug, Clone, Default)]
pub struct RecognitionPoller {
    in_flight: HashSet<(TimerPurpose, RequestContext)>,
    skipped: u64,
}

impl RecognitionPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `purpose` under `context`. Returns `false` (and counts a skip) if
    /// the previous request for the same pair is still outstanding.
    pub fn try_begin(&mut self, purpose: TimerPurpose, context: RequestContext) -> bool {
        if self.in_flight.insert((purpose, context)) {
            return true;
        }
        self.skipped += 1;
        debug!(purpose = %purpose, station = %context.station, skipped = self.skipped, "poll tick skipped, request in flight");
        false
    }

    /// Release the slot a resolved request held.
    pub fn finish(&mut self, purpose: TimerPurpose, context: RequestContext) {
        self.in_flight.remove(&(purpose, context));
    }

    #[cfg(test)]
    fn is_in_flight(&self, purpose: TimerPurpose, context: RequestContext) -> bool {
        self.in_flight.contains(&(purpose, context))
    }

    /// Ticks skipped so far.
    pub(crate) fn skipped(&self) -> u64 {
        self.skipped
    }
}
