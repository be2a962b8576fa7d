//! Two-factor verification handshake.
//!
//! Station 1 pairs a recognized face with a scanned code and asks the
//! verification service whether they belong to the same person. This module
//! holds the session and the state machine; timers and requests are driven by
//! the coordinator.
//!
//! # States
//!
//! - `Idle`: no face yet
//! - `FaceCaptured`: a face is latched, the "scan code" action is enabled
//! - `AwaitingCode`: station 1 is in code mode, polling for the code
//! - `Submitting`: the pair was sent to the verification service
//! - `Verified`: the service confirmed the pair, countdown running
//! - `Rejected`: the service refused the pair, or the code never came
//!
//! # Valid Transitions
//!
//! - Idle → FaceCaptured → AwaitingCode → Submitting → Verified/Rejected
//! - AwaitingCode → Rejected (code wait timed out)
//! - any → Idle (reset)
//!
//! # Examples
//!
//! ```
//! use gradcheck_core::Identity;
//! use gradcheck_coordinator::handshake::{Handshake, HandshakeStatus};
//! use tokio::time::Instant;
//!
//! let mut handshake = Handshake::new();
//! handshake.observe_face(&Identity::new("2201", "Ada"));
//! assert!(handshake.scan_enabled());
//!
//! handshake.begin_code_wait(Instant::now()).unwrap();
//! let submission = handshake.observe_code(&Identity::new("2201", "Ada")).unwrap();
//! assert_eq!(submission.face.id, "2201");
//! assert_eq!(handshake.status(), HandshakeStatus::Submitting);
//!
//! // A late code reading never produces a second submission.
//! assert!(handshake.observe_code(&Identity::new("2201", "Ada")).is_none());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use gradcheck_core::{Error, Identity, Result};
use gradcheck_services::Verdict;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Transitions kept for diagnostics.
const MAX_HISTORY_SIZE: usize = 32;

/// Handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeStatus {
    /// No face latched.
    #[default]
    Idle,
    /// Face latched, waiting for the operator to request the code scan.
    FaceCaptured,
    /// Polling station 1 in code mode.
    AwaitingCode,
    /// Verification request in flight.
    Submitting,
    /// Face and code matched.
    Verified,
    /// Face and code did not match, or no code arrived in time.
    Rejected,
}

impl fmt::Display for HandshakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeStatus::Idle => "idle",
            HandshakeStatus::FaceCaptured => "face_captured",
            HandshakeStatus::AwaitingCode => "awaiting_code",
            HandshakeStatus::Submitting => "submitting",
            HandshakeStatus::Verified => "verified",
            HandshakeStatus::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

impl HandshakeStatus {
    /// Check if moving to `target` is allowed.
    ///
    /// Resetting to `Idle` is allowed from every other state.
    ///
    /// ```
    /// use gradcheck_coordinator::handshake::HandshakeStatus;
    ///
    /// assert!(HandshakeStatus::Idle.can_transition_to(&HandshakeStatus::FaceCaptured));
    /// assert!(!HandshakeStatus::Idle.can_transition_to(&HandshakeStatus::AwaitingCode));
    /// assert!(HandshakeStatus::Verified.can_transition_to(&HandshakeStatus::Idle));
    /// ```
    pub fn can_transition_to(&self, target: &HandshakeStatus) -> bool {
        matches!(
            (self, target),
            (HandshakeStatus::Idle, HandshakeStatus::FaceCaptured)
                | (HandshakeStatus::FaceCaptured, HandshakeStatus::AwaitingCode)
                | (
                    HandshakeStatus::AwaitingCode,
                    HandshakeStatus::Submitting | HandshakeStatus::Rejected
                )
                | (
                    HandshakeStatus::Submitting,
                    HandshakeStatus::Verified | HandshakeStatus::Rejected
                )
                | (
                    HandshakeStatus::FaceCaptured
                        | HandshakeStatus::AwaitingCode
                        | HandshakeStatus::Submitting
                        | HandshakeStatus::Verified
                        | HandshakeStatus::Rejected,
                    HandshakeStatus::Idle
                )
        )
    }

    /// `true` once the session has a verdict.
    pub fn is_resolved(&self) -> bool {
        matches!(self, HandshakeStatus::Verified | HandshakeStatus::Rejected)
    }

    /// `true` while the latched face can still be replaced.
    pub fn accepts_face(&self) -> bool {
        matches!(self, HandshakeStatus::Idle | HandshakeStatus::FaceCaptured)
    }
}

/// One recorded status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeTransition {
    pub from: HandshakeStatus,
    pub to: HandshakeStatus,
    pub timestamp: Instant,
}

/// What happened to a face reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceObservation {
    /// Sentinel reading; nothing latched.
    Empty,
    /// First face of the session.
    Captured,
    /// A different face while one is latched; the first capture stays.
    Ignored,
    /// Same face as already latched.
    Unchanged,
    /// Session is past the face step; the latched face stays.
    Frozen,
}

/// Face and code pair ready for the verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub session: Uuid,
    pub face: Identity,
    pub code: Identity,
}

/// The live verification session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationSession {
    id: Uuid,
    face: Identity,
    code: Identity,
    status: HandshakeStatus,
    message: Option<String>,
    verified: Option<Identity>,
    awaiting_since: Option<Instant>,
    countdown: Option<u32>,
}

impl VerificationSession {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            face: Identity::sentinel(),
            code: Identity::sentinel(),
            status: HandshakeStatus::Idle,
            message: None,
            verified: None,
            awaiting_since: None,
            countdown: None,
        }
    }

    /// Session id; changes on every reset.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Latched face, or the sentinel.
    pub fn face(&self) -> &Identity {
        &self.face
    }

    /// Captured code, or the sentinel.
    pub fn code(&self) -> &Identity {
        &self.code
    }

    pub fn status(&self) -> HandshakeStatus {
        self.status
    }

    /// Verdict message or timeout reason.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Who was verified, once `Verified`.
    pub fn verified(&self) -> Option<&Identity> {
        self.verified.as_ref()
    }

    /// Remaining countdown ticks, once `Verified`.
    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }
}

/// Handshake state machine for station 1.
#[derive(Debug, Clone)]
pub struct Handshake {
    session: VerificationSession,
    history: VecDeque<HandshakeTransition>,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    pub fn new() -> Self {
        Self {
            session: VerificationSession::new(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn session(&self) -> &VerificationSession {
        &self.session
    }

    pub fn status(&self) -> HandshakeStatus {
        self.session.status
    }

    pub fn is_idle(&self) -> bool {
        self.session.status == HandshakeStatus::Idle
    }

    /// `true` while waiting for the scanned code.
    pub fn awaiting_code(&self) -> bool {
        self.session.status == HandshakeStatus::AwaitingCode
    }

    /// Whether the "scan code" action is offered.
    pub fn scan_enabled(&self) -> bool {
        self.session.status == HandshakeStatus::FaceCaptured
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<HandshakeTransition> {
        &self.history
    }

    /// Feed a station 1 face reading.
    ///
    /// The first face captured in a session is kept until the session resets;
    /// any other face seen afterwards is ignored.
    pub fn observe_face(&mut self, identity: &Identity) -> FaceObservation {
        if identity.is_sentinel() {
            return FaceObservation::Empty;
        }
        match self.session.status {
            HandshakeStatus::Idle => {
                self.session.face = identity.clone();
                self.record(HandshakeStatus::FaceCaptured);
                info!(face = %identity, "face captured");
                FaceObservation::Captured
            }
            HandshakeStatus::FaceCaptured if self.session.face == *identity => {
                FaceObservation::Unchanged
            }
            HandshakeStatus::FaceCaptured => {
                debug!(latched = %self.session.face, seen = %identity, "second face ignored");
                FaceObservation::Ignored
            }
            _ => FaceObservation::Frozen,
        }
    }

    /// Operator asked for the code scan.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless a face is captured.
    pub fn begin_code_wait(&mut self, now: Instant) -> Result<()> {
        self.transition_to(HandshakeStatus::AwaitingCode)?;
        self.session.awaiting_since = Some(now);
        Ok(())
    }

    /// Whether the code wait has run past `max`.
    pub fn code_wait_expired(&self, now: Instant, max: Duration) -> bool {
        self.awaiting_code()
            && self
                .session
                .awaiting_since
                .is_some_and(|since| now.saturating_duration_since(since) >= max)
    }

    /// Feed a station 1 code reading.
    ///
    /// Returns the pair to verify on the first non-sentinel code while
    /// awaiting it, and `None` otherwise.
    pub fn observe_code(&mut self, identity: &Identity) -> Option<Submission> {
        if identity.is_sentinel() || !self.awaiting_code() {
            return None;
        }
        self.session.code = identity.clone();
        self.record(HandshakeStatus::Submitting);
        info!(face = %self.session.face, code = %identity, "code captured, submitting");

        Some(Submission {
            session: self.session.id,
            face: self.session.face.clone(),
            code: identity.clone(),
        })
    }

    /// Give up waiting for the code.
    ///
    /// Returns `false` if the session was not waiting.
    pub fn time_out(&mut self, reason: impl Into<String>) -> bool {
        if !self.awaiting_code() {
            return false;
        }
        let reason = reason.into();
        info!(reason = %reason, "code wait timed out");
        self.session.message = Some(reason);
        self.record(HandshakeStatus::Rejected);
        true
    }

    /// Apply the verification service's verdict for `session`.
    ///
    /// Returns the verified identity on success. Verdicts for another session,
    /// or arriving when nothing is being submitted, are ignored.
    pub fn resolve(&mut self, session: Uuid, verdict: &Verdict) -> Option<Identity> {
        if !self.is_submitting(session) {
            return None;
        }
        match verdict {
            Verdict::Verified { message, identity } => {
                let who = identity
                    .clone()
                    .filter(|identity| !identity.is_sentinel())
                    .unwrap_or_else(|| self.session.face.clone());
                self.session.message = Some(message.clone());
                self.session.verified = Some(who.clone());
                self.record(HandshakeStatus::Verified);
                info!(identity = %who, "verified");
                Some(who)
            }
            Verdict::Rejected { message } => {
                self.session.message = Some(message.clone());
                self.record(HandshakeStatus::Rejected);
                info!(reason = %message, "verification rejected");
                None
            }
        }
    }

    /// The verification request itself failed.
    ///
    /// Returns `false` if the failure belongs to another session.
    pub fn fail(&mut self, session: Uuid, reason: impl Into<String>) -> bool {
        if !self.is_submitting(session) {
            return false;
        }
        self.session.message = Some(reason.into());
        self.record(HandshakeStatus::Rejected);
        true
    }

    /// Start the visible countdown. Only meaningful once `Verified`.
    pub fn start_countdown(&mut self, ticks: u32) {
        if self.session.status == HandshakeStatus::Verified {
            self.session.countdown = Some(ticks);
        }
    }

    /// Count one tick down. Returns the remaining ticks.
    pub fn tick_countdown(&mut self) -> Option<u32> {
        let remaining = self.session.countdown.as_mut()?;
        *remaining = remaining.saturating_sub(1);
        Some(*remaining)
    }

    /// Return to `Idle` with a fresh session.
    ///
    /// Returns `false` if the session was already idle.
    pub fn reset(&mut self) -> bool {
        let from = self.session.status;
        self.session = VerificationSession::new();
        if from == HandshakeStatus::Idle {
            return false;
        }
        self.push_history(from, HandshakeStatus::Idle);
        info!(from = %from, "session reset");
        true
    }

    fn is_submitting(&self, session: Uuid) -> bool {
        self.session.id == session && self.session.status == HandshakeStatus::Submitting
    }

    fn transition_to(&mut self, target: HandshakeStatus) -> Result<()> {
        let from = self.session.status;
        if !from.can_transition_to(&target) {
            return Err(Error::InvalidStateTransition {
                from: from.to_string(),
                to: target.to_string(),
            });
        }
        self.record(target);
        Ok(())
    }

    /// Set the status and record it. Callers have checked the transition.
    fn record(&mut self, target: HandshakeStatus) {
        let from = self.session.status;
        debug_assert!(from.can_transition_to(&target), "{from} -> {target}");
        self.session.status = target;
        self.push_history(from, target);
    }

    fn push_history(&mut self, from: HandshakeStatus, to: HandshakeStatus) {
        if self.history.len() == MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(HandshakeTransition {
            from,
            to,
            timestamp: Instant::now(),
        });
    }
}
