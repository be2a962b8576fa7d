//! Timer registry keyed by purpose.
//!
//! Every periodic poll and every deadline the coordinator runs is registered
//! here under a [`TimerPurpose`]. Starting a purpose that is already live
//! aborts the previous task first, so a purpose can never have two timers.
//!
//! Timer tasks do not call back into the coordinator. They send a
//! [`TimerFired`] on a channel the coordinator drains from its event loop.
//! A firing that was already queued when its timer was cancelled carries an
//! old generation and is refused by [`TimerRegistry::accept`].
//!
//! ```
//! use std::time::Duration;
//! use gradcheck_coordinator::timers::{Schedule, TimerPurpose, TimerRegistry};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let (mut timers, mut fired) = TimerRegistry::new();
//! timers.start(TimerPurpose::Station2Clear, Schedule::once(Duration::from_secs(5)));
//!
//! let tick = fired.recv().await.unwrap();
//! assert!(timers.accept(tick));
//! assert!(!timers.is_active(TimerPurpose::Station2Clear));
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

const FIRED_CHANNEL_CAPACITY: usize = 64;

/// What a timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerPurpose {
    /// Recognition poll for station 1 (face) or station 2.
    RecognitionPoll,
    /// Code poll while the handshake waits for the scanned code.
    CodeWaitPoll,
    /// Visible countdown after a successful verification.
    Countdown,
    /// Station 2 auto-clear after the dwell time.
    Station2Clear,
    /// Queue refresh while the queue monitor is active.
    QueueRefresh,
}

impl TimerPurpose {
    pub const ALL: [TimerPurpose; 5] = [
        TimerPurpose::RecognitionPoll,
        TimerPurpose::CodeWaitPoll,
        TimerPurpose::Countdown,
        TimerPurpose::Station2Clear,
        TimerPurpose::QueueRefresh,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TimerPurpose::RecognitionPoll => "recognition-poll",
            TimerPurpose::CodeWaitPoll => "code-wait-poll",
            TimerPurpose::Countdown => "countdown",
            TimerPurpose::Station2Clear => "station2-clear",
            TimerPurpose::QueueRefresh => "queue-refresh",
        }
    }
}

impl fmt::Display for TimerPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Fire once after `delay`.
    Once { delay: Duration },
    /// Fire every `period`; the first firing is immediate when `immediate`.
    Repeating { period: Duration, immediate: bool },
}

impl Schedule {
    pub fn once(delay: Duration) -> Self {
        Schedule::Once { delay }
    }

    /// Repeating, first firing after one full period.
    pub fn every(period: Duration) -> Self {
        Schedule::Repeating {
            period,
            immediate: false,
        }
    }

    /// Repeating, first firing right away.
    pub fn every_now(period: Duration) -> Self {
        Schedule::Repeating {
            period,
            immediate: true,
        }
    }

    fn is_once(self) -> bool {
        matches!(self, Schedule::Once { .. })
    }
}

/// Notification sent by a timer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub purpose: TimerPurpose,
    generation: u64,
}

#[derive(Debug)]
struct ActiveTimer {
    generation: u64,
    once: bool,
    task: JoinHandle<()>,
}

/// Owns every live timer task.
///
/// Must be used from inside a Tokio runtime. Dropping the registry aborts
/// every task it started.
#[derive(Debug)]
pub struct TimerRegistry {
    timers: HashMap<TimerPurpose, ActiveTimer>,
    next_generation: u64,
    fired_tx: mpsc::Sender<TimerFired>,
}

impl TimerRegistry {
    /// Create an empty registry and the receiver its timers fire into.
    pub fn new() -> (Self, mpsc::Receiver<TimerFired>) {
        let (fired_tx, fired_rx) = mpsc::channel(FIRED_CHANNEL_CAPACITY);
        (
            Self {
                timers: HashMap::new(),
                next_generation: 0,
                fired_tx,
            },
            fired_rx,
        )
    }

    /// Start `purpose`, replacing any timer already running under it.
    pub fn start(&mut self, purpose: TimerPurpose, schedule: Schedule) {
        if self.cancel(purpose) {
            trace!(purpose = %purpose, "replaced live timer");
        }

        self.next_generation += 1;
        let fired = TimerFired {
            purpose,
            generation: self.next_generation,
        };
        let task = tokio::spawn(run_timer(fired, schedule, self.fired_tx.clone()));

        debug!(purpose = %purpose, ?schedule, "timer started");
        self.timers.insert(
            purpose,
            ActiveTimer {
                generation: fired.generation,
                once: schedule.is_once(),
                task,
            },
        );
    }

    /// Cancel `purpose`. Returns `true` if a timer was live.
    ///
    /// Cancelling an idle purpose is a no-op.
    pub fn cancel(&mut self, purpose: TimerPurpose) -> bool {
        match self.timers.remove(&purpose) {
            Some(timer) => {
                timer.task.abort();
                debug!(purpose = %purpose, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every purpose in `purposes`.
    pub fn cancel_each(&mut self, purposes: &[TimerPurpose]) {
        for purpose in purposes {
            self.cancel(*purpose);
        }
    }

    /// Cancel everything.
    pub fn cancel_all(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.task.abort();
        }
    }

    pub fn is_active(&self, purpose: TimerPurpose) -> bool {
        self.timers.contains_key(&purpose)
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Live purposes, sorted.
    pub fn active(&self) -> Vec<TimerPurpose> {
        let mut purposes: Vec<_> = self.timers.keys().copied().collect();
        purposes.sort();
        purposes
    }

    /// Decide whether a firing should be acted on.
    ///
    /// Returns `false` for firings of cancelled or replaced timers. A one-shot
    /// timer is retired once its firing is accepted.
    pub fn accept(&mut self, fired: TimerFired) -> bool {
        let Some(timer) = self.timers.get(&fired.purpose) else {
            trace!(purpose = %fired.purpose, "dropped firing of cancelled timer");
            return false;
        };
        if timer.generation != fired.generation {
            trace!(purpose = %fired.purpose, "dropped firing of replaced timer");
            return false;
        }
        if timer.once {
            self.timers.remove(&fired.purpose);
        }
        true
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn run_timer(fired: TimerFired, schedule: Schedule, tx: mpsc::Sender<TimerFired>) {
    match schedule {
        Schedule::Once { delay } => {
            tokio::time::sleep(delay).await;
            let _ = tx.send(fired).await;
        }
        Schedule::Repeating { period, immediate } => {
            let start = if immediate {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(fired).await.is_err() {
                    break;
                }
            }
        }
    }
}
