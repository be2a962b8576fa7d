//! The coordinator actor and its handle.
//!
//! One task owns every piece of kiosk state. It reacts to three sources:
//!
//! ```text
//! ┌──────────────────┐  Command   ┌─────────────────┐   KioskView
//! │ CoordinatorHandle│───────────►│                 │──────────────► watch
//! └──────────────────┘            │                 │
//! ┌──────────────────┐ TimerFired │   Coordinator   │
//! │ TimerRegistry    │───────────►│   (one task)    │
//! └──────────────────┘            │                 │
//! ┌──────────────────┐ Completion │                 │
//! │ JoinSet requests │───────────►│                 │
//! └──────────────────┘            └─────────────────┘
//! ```
//!
//! Collaborator requests run on their own tasks so a slow server never
//! blocks timers or operator commands. Every completion is checked against
//! the current routing context or session before it is applied.
//!
//! # Examples
//!
//! ```
//! use gradcheck_core::{CaptureMode, Identity, StationId};
//! use gradcheck_coordinator::{CoordinatorConfig, spawn_coordinator};
//! use gradcheck_services::mock::MockBackend;
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() -> gradcheck_coordinator::Result<()> {
//! let (backend, server) = MockBackend::new();
//! server.set_reading(StationId::CheckIn, CaptureMode::Face, Identity::new("2201", "Ada"));
//!
//! let (kiosk, task) = spawn_coordinator(backend, CoordinatorConfig::default())?;
//! tokio::time::sleep(std::time::Duration::from_millis(100)).await;
//!
//! let view = kiosk.view();
//! assert_eq!(view.handshake().unwrap().face.id, "2201");
//!
//! kiosk.shutdown();
//! task.await.unwrap();
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use gradcheck_core::{CaptureMode, Identity, ModelSelection, QueueEntry, StationId};
use gradcheck_services::{KioskBackend, Outcome, StreamHandle, Verdict};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::CoordinatorConfig;
use crate::debouncer::{ScanDecision, Station2Debouncer};
use crate::display::{HandshakePanel, KioskView, QueuePanel, StationDisplays};
use crate::error::{CoordinatorError, Result};
use crate::handshake::{Handshake, Submission};
use crate::poller::{PollRoute, RecognitionPoller, route};
use crate::queue::QueueCoordinator;
use crate::router::{RequestContext, StationRouter};
use crate::timers::{Schedule, TimerFired, TimerPurpose, TimerRegistry};

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Message shown when the verification request itself fails.
const VERIFICATION_UNAVAILABLE: &str = "Verification service unavailable";

type Reply<T> = oneshot::Sender<Result<T>>;
type ServiceResult<T> = gradcheck_services::Result<T>;

/// Operator commands.
#[derive(Debug)]
enum Command {
    Activate {
        station: StationId,
        mode: CaptureMode,
        reply: Reply<()>,
    },
    RequestCodeScan {
        reply: Reply<()>,
    },
    DismissVerification {
        reply: Reply<()>,
    },
    AdvanceQueue {
        reply: Reply<Outcome>,
    },
    RefreshQueue {
        reply: Reply<()>,
    },
    LoadSettings {
        reply: Reply<ModelSelection>,
    },
    SaveSettings {
        selection: ModelSelection,
        reply: Reply<ModelSelection>,
    },
}

/// A finished collaborator request.
enum Completion {
    Stream {
        context: RequestContext,
        result: ServiceResult<StreamHandle>,
    },
    Reading {
        purpose: TimerPurpose,
        context: RequestContext,
        result: ServiceResult<Identity>,
    },
    Verification {
        submission: Submission,
        result: ServiceResult<Verdict>,
    },
    ScanReset {
        result: ServiceResult<()>,
    },
    Enqueued {
        identity: Identity,
        result: ServiceResult<Outcome>,
    },
    QueueFetched {
        result: ServiceResult<Vec<QueueEntry>>,
    },
    Advanced {
        result: ServiceResult<Outcome>,
        reply: Reply<Outcome>,
    },
    Notified {
        identity: Identity,
        result: ServiceResult<Outcome>,
    },
    SettingsLoaded {
        result: ServiceResult<ModelSelection>,
        reply: Reply<ModelSelection>,
    },
    SettingsSaved {
        result: ServiceResult<ModelSelection>,
        reply: Reply<ModelSelection>,
    },
}

/// Clone-safe handle to the coordinator task.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<KioskView>,
    shutdown: CancellationToken,
}

impl CoordinatorHandle {
    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)?;
        response.await.map_err(|_| CoordinatorError::ChannelClosed)?
    }

    /// Make `station` the active station in `mode`.
    ///
    /// Cancels every timer of the previous context, selects the camera
    /// stream, and starts polling (or queue refresh for station 3).
    pub async fn activate_station(&self, station: StationId, mode: CaptureMode) -> Result<()> {
        self.request(|reply| Command::Activate {
            station,
            mode,
            reply,
        })
        .await
    }

    /// Operator confirms the captured face and asks for the code scan.
    ///
    /// # Errors
    ///
    /// - `WrongStation` unless station 1 is active
    /// - `NoFaceCaptured` if no face is latched
    /// - `Core(InvalidStateTransition)` once the session is submitting or resolved
    pub async fn request_code_scan(&self) -> Result<()> {
        self.request(|reply| Command::RequestCodeScan { reply })
            .await
    }

    /// Close the verification result and return station 1 to idle.
    ///
    /// # Errors
    ///
    /// Returns `WrongStation` unless station 1 is active.
    pub async fn dismiss_verification(&self) -> Result<()> {
        self.request(|reply| Command::DismissVerification { reply })
            .await
    }

    /// Move the queue's current pointer forward and refresh.
    ///
    /// A server refusal comes back as `Outcome::Rejected`.
    ///
    /// # Errors
    ///
    /// Returns `Service` if the request could not be completed.
    pub async fn advance_queue(&self) -> Result<Outcome> {
        self.request(|reply| Command::AdvanceQueue { reply }).await
    }

    /// Fetch a fresh queue snapshot.
    pub async fn refresh_queue(&self) -> Result<()> {
        self.request(|reply| Command::RefreshQueue { reply }).await
    }

    /// Read the recognition model selection from the server.
    pub async fn load_settings(&self) -> Result<ModelSelection> {
        self.request(|reply| Command::LoadSettings { reply }).await
    }

    /// Store a recognition model selection and reselect the active stream.
    pub async fn save_settings(&self, selection: ModelSelection) -> Result<ModelSelection> {
        self.request(|reply| Command::SaveSettings { selection, reply })
            .await
    }

    /// Latest published view.
    pub fn view(&self) -> KioskView {
        self.view.borrow().clone()
    }

    /// Receiver that wakes on every published view.
    pub fn subscribe(&self) -> watch::Receiver<KioskView> {
        self.view.clone()
    }

    /// Ask the coordinator to stop. Timers and requests are aborted.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Start the coordinator on the current Tokio runtime.
///
/// Station 1 is activated in face mode before the first command is read.
///
/// # Errors
///
/// Returns `Core(Config)` if `config` does not validate.
pub fn spawn_coordinator<B: KioskBackend>(
    backend: B,
    config: CoordinatorConfig,
) -> Result<(CoordinatorHandle, JoinHandle<()>)> {
    config.validate()?;

    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let shutdown = CancellationToken::new();
    let coordinator = Coordinator::new(backend, config, commands_rx, shutdown.clone());
    let view = coordinator.view_tx.subscribe();
    let task = tokio::spawn(coordinator.run());

    Ok((
        CoordinatorHandle {
            commands: commands_tx,
            view,
            shutdown,
        },
        task,
    ))
}

struct Coordinator<B> {
    backend: Arc<B>,
    config: CoordinatorConfig,
    router: StationRouter,
    timers: TimerRegistry,
    fired: mpsc::Receiver<TimerFired>,
    poller: RecognitionPoller,
    handshake: Handshake,
    queue: QueueCoordinator,
    debouncer: Station2Debouncer,
    displays: StationDisplays,
    settings: Option<ModelSelection>,
    requests: JoinSet<Completion>,
    commands: mpsc::Receiver<Command>,
    view_tx: watch::Sender<KioskView>,
    shutdown: CancellationToken,
}

impl<B: KioskBackend> Coordinator<B> {
    fn new(
        backend: B,
        config: CoordinatorConfig,
        commands: mpsc::Receiver<Command>,
        shutdown: CancellationToken,
    ) -> Self {
        let router = StationRouter::new();
        let displays = StationDisplays::new();
        let (timers, fired) = TimerRegistry::new();
        let initial = KioskView::project(
            router.active(),
            |station| router.mode_of(station),
            &displays,
            None,
            Vec::new(),
        );
        let (view_tx, _) = watch::channel(initial);

        Self {
            backend: Arc::new(backend),
            config,
            router,
            timers,
            fired,
            poller: RecognitionPoller::new(),
            handshake: Handshake::new(),
            queue: QueueCoordinator::new(),
            debouncer: Station2Debouncer::new(),
            displays,
            settings: None,
            requests: JoinSet::new(),
            commands,
            view_tx,
            shutdown,
        }
    }

    async fn run(mut self) {
        info!(server = %self.config.server_url, "coordinator started");
        self.activate(StationId::CheckIn, CaptureMode::Face);
        self.publish();

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(fired) = self.fired.recv() => self.on_timer(fired),
                Some(joined) = self.requests.join_next() => match joined {
                    Ok(completion) => self.on_completion(completion),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => error!(error = %e, "request task failed"),
                },
            }
            self.publish();
        }

        self.timers.cancel_all();
        self.requests.abort_all();
        info!(skipped_polls = self.poller.skipped(), "coordinator stopped");
    }

    /// Publish the view, then answer the caller.
    fn reply<T>(&mut self, reply: Reply<T>, result: Result<T>) {
        self.publish();
        let _ = reply.send(result);
    }

    fn publish(&mut self) {
        self.displays.set_handshake(HandshakePanel::project(
            &self.handshake,
            &self.config.code_artifact_template,
        ));
        self.displays.set_queue(QueuePanel {
            view: self.queue.view().clone(),
            message: self.queue.message().map(str::to_string),
        });

        let view = KioskView::project(
            self.router.active(),
            |station| self.router.mode_of(station),
            &self.displays,
            self.settings,
            self.timers.active(),
        );
        self.view_tx.send_if_modified(move |current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }

    fn dispatch<F, Fut>(&mut self, request: F)
    where
        F: FnOnce(Arc<B>) -> Fut,
        Fut: Future<Output = Completion> + Send + 'static,
    {
        self.requests.spawn(request(Arc::clone(&self.backend)));
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Activate {
                station,
                mode,
                reply,
            } => {
                self.activate(station, mode);
                self.reply(reply, Ok(()));
            }
            Command::RequestCodeScan { reply } => {
                let result = self.request_code_scan();
                self.reply(reply, result);
            }
            Command::DismissVerification { reply } => {
                let result = self.dismiss_verification();
                self.reply(reply, result);
            }
            Command::AdvanceQueue { reply } => {
                info!("advancing queue");
                self.dispatch(move |backend| async move {
                    let result = backend.advance_current().await;
                    Completion::Advanced { result, reply }
                });
            }
            Command::RefreshQueue { reply } => {
                self.refresh_queue(true);
                self.reply(reply, Ok(()));
            }
            Command::LoadSettings { reply } => {
                self.dispatch(move |backend| async move {
                    let result = backend.load_settings().await;
                    Completion::SettingsLoaded { result, reply }
                });
            }
            Command::SaveSettings { selection, reply } => {
                info!(?selection, "saving model settings");
                self.dispatch(move |backend| async move {
                    let result = backend.save_settings(selection).await;
                    Completion::SettingsSaved { result, reply }
                });
            }
        }
    }

    fn on_timer(&mut self, fired: TimerFired) {
        if !self.timers.accept(fired) {
            return;
        }
        match fired.purpose {
            TimerPurpose::RecognitionPoll | TimerPurpose::CodeWaitPoll => self.poll(fired.purpose),
            TimerPurpose::Countdown => self.countdown_tick(),
            TimerPurpose::Station2Clear => self.clear_station2(),
            TimerPurpose::QueueRefresh => self.refresh_queue(false),
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Stream { context, result } => self.on_stream(context, result),
            Completion::Reading {
                purpose,
                context,
                result,
            } => self.on_reading(purpose, context, result),
            Completion::Verification { submission, result } => {
                self.on_verification(submission, result)
            }
            Completion::ScanReset { result } => {
                if let Err(error) = result {
                    debug!(error = %error, "scan reset failed");
                }
            }
            Completion::Enqueued { identity, result } => self.on_enqueued(identity, result),
            Completion::QueueFetched { result } => {
                if self.queue.finish_refresh(result) {
                    self.refresh_queue(true);
                }
            }
            Completion::Advanced { result, reply } => {
                match &result {
                    Ok(outcome) => {
                        info!(accepted = outcome.is_accepted(), reply = outcome.message(), "queue advance answered");
                        self.queue.set_message(outcome.message());
                        self.refresh_queue(true);
                    }
                    Err(error) => {
                        warn!(error = %error, "queue advance failed");
                        self.queue.set_message(format!("Could not advance: {error}"));
                    }
                }
                self.reply(reply, result.map_err(CoordinatorError::from));
            }
            Completion::Notified { identity, result } => match result {
                Ok(Outcome::Accepted { message }) => {
                    info!(identity = %identity, reply = %message, "notification sent")
                }
                Ok(Outcome::Rejected { message }) => {
                    warn!(identity = %identity, reply = %message, "notification refused")
                }
                Err(error) => warn!(identity = %identity, error = %error, "notification failed"),
            },
            Completion::SettingsLoaded { result, reply } => {
                if let Ok(selection) = &result {
                    self.settings = Some(*selection);
                }
                self.reply(reply, result.map_err(CoordinatorError::from));
            }
            Completion::SettingsSaved { result, reply } => {
                match &result {
                    Ok(stored) => {
                        info!(selection = ?stored, "model settings saved");
                        self.settings = Some(*stored);
                        self.select_stream();
                    }
                    Err(error) => warn!(error = %error, "saving model settings failed"),
                }
                self.reply(reply, result.map_err(CoordinatorError::from));
            }
        }
    }

    // Station display router

    fn activate(&mut self, station: StationId, mode: CaptureMode) {
        let change = self.router.activate(station, mode);
        self.timers.cancel_each(&TimerPurpose::ALL);
        self.displays.set_reading(station, Identity::sentinel());

        let mut reset_server = false;
        if change.left(StationId::CheckIn) && self.handshake.reset() {
            info!("left station 1, session abandoned");
            reset_server = true;
        }
        if station == StationId::CheckIn && mode == CaptureMode::Face {
            self.handshake.reset();
            reset_server = true;
        }
        if station == StationId::Confirmation {
            self.debouncer.clear();
            if let Some(scan) = self.displays.scan_mut() {
                scan.clear();
            }
            reset_server = true;
        }
        if reset_server {
            self.reset_scan();
        }

        self.select_stream();
        self.start_station_work();
    }

    /// Start the timers the active station needs.
    fn start_station_work(&mut self) {
        match (self.router.active(), self.router.mode()) {
            (StationId::QueueMonitor, _) => self.timers.start(
                TimerPurpose::QueueRefresh,
                Schedule::every_now(self.config.queue_refresh()),
            ),
            (StationId::CheckIn, CaptureMode::Code) if self.handshake.awaiting_code() => {
                self.timers.start(
                    TimerPurpose::CodeWaitPoll,
                    Schedule::every_now(self.config.code_poll()),
                )
            }
            _ => self.timers.start(
                TimerPurpose::RecognitionPoll,
                Schedule::every_now(self.config.recognition_poll()),
            ),
        }
        if self.router.is_active(StationId::CheckIn) && self.handshake.session().countdown().is_some() {
            self.timers.start(
                TimerPurpose::Countdown,
                Schedule::every(self.config.countdown_tick()),
            );
        }
    }

    fn select_stream(&mut self) {
        let context = self.router.context();
        self.dispatch(move |backend| async move {
            let result = backend.select_stream(context.station, context.mode).await;
            Completion::Stream { context, result }
        });
    }

    fn on_stream(&mut self, context: RequestContext, result: ServiceResult<StreamHandle>) {
        if !self.router.is_current(&context) {
            warn!(station = %context.station, mode = %context.mode, "discarding stale stream selection");
            return;
        }
        match result {
            Ok(stream) => {
                debug!(station = %context.station, stream = %stream, "stream selected");
                self.displays.set_stream(context.station, stream);
            }
            Err(error) => warn!(station = %context.station, error = %error, "stream selection failed"),
        }
    }

    fn reset_scan(&mut self) {
        debug!("resetting server scan state");
        self.dispatch(|backend| async move {
            let result = backend.reset_scan().await;
            Completion::ScanReset { result }
        });
    }

    // Recognition poller

    fn poll(&mut self, purpose: TimerPurpose) {
        let context = self.router.context();
        if route(context.station, context.mode) == PollRoute::Suppressed {
            return;
        }
        if purpose == TimerPurpose::CodeWaitPoll
            && self
                .handshake
                .code_wait_expired(Instant::now(), self.config.code_wait_max())
        {
            self.timers.cancel(TimerPurpose::CodeWaitPoll);
            self.handshake.time_out(format!(
                "No code scanned within {}s",
                self.config.code_wait_max_secs
            ));
            return;
        }
        if !self.poller.try_begin(purpose, context) {
            return;
        }

        debug!(station = %context.station, mode = %context.mode, purpose = %purpose, "polling recognition");
        self.dispatch(move |backend| async move {
            let result = backend
                .poll_recognition(context.station, context.mode)
                .await;
            Completion::Reading {
                purpose,
                context,
                result,
            }
        });
    }

    fn on_reading(
        &mut self,
        purpose: TimerPurpose,
        context: RequestContext,
        result: ServiceResult<Identity>,
    ) {
        self.poller.finish(purpose, context);
        if !self.router.is_current(&context) {
            warn!(station = %context.station, mode = %context.mode, purpose = %purpose, "discarding stale recognition response");
            return;
        }

        let identity = match result {
            Ok(identity) => identity,
            Err(error) => {
                warn!(station = %context.station, error = %error, "recognition poll failed");
                self.displays
                    .set_reading(context.station, Identity::sentinel());
                return;
            }
        };
        self.displays
            .set_reading(context.station, identity.clone());

        match route(context.station, context.mode) {
            PollRoute::CheckInFace => {
                self.handshake.observe_face(&identity);
            }
            PollRoute::CheckInCode => {
                if let Some(submission) = self.handshake.observe_code(&identity) {
                    self.submit(submission);
                }
            }
            PollRoute::Confirmation => self.on_scan(identity),
            PollRoute::Suppressed => {}
        }
    }

    // Verification handshake

    fn request_code_scan(&mut self) -> Result<()> {
        let active = self.router.active();
        if active != StationId::CheckIn {
            return Err(CoordinatorError::WrongStation {
                expected: StationId::CheckIn,
                active,
            });
        }
        if self.handshake.is_idle() {
            return Err(CoordinatorError::NoFaceCaptured);
        }
        if self.handshake.awaiting_code() {
            debug!("code scan already requested");
            return Ok(());
        }

        self.handshake.begin_code_wait(Instant::now())?;
        self.timers.cancel(TimerPurpose::RecognitionPoll);
        self.router.set_mode(CaptureMode::Code);
        self.displays
            .set_reading(StationId::CheckIn, Identity::sentinel());
        self.select_stream();
        self.start_station_work();
        Ok(())
    }

    fn submit(&mut self, submission: Submission) {
        self.timers.cancel(TimerPurpose::CodeWaitPoll);
        self.dispatch(move |backend| async move {
            let result = backend
                .submit_verification(&submission.face, &submission.code)
                .await;
            Completion::Verification { submission, result }
        });
    }

    fn on_verification(&mut self, submission: Submission, result: ServiceResult<Verdict>) {
        let verdict = match result {
            Ok(verdict) => verdict,
            Err(error) => {
                error!(face = %submission.face, code = %submission.code, error = %error, "verification request failed");
                if !self.handshake.fail(submission.session, VERIFICATION_UNAVAILABLE) {
                    warn!(session = %submission.session, "discarding verification failure for an abandoned session");
                }
                return;
            }
        };

        let current = self.handshake.session().id() == submission.session;
        match self.handshake.resolve(submission.session, &verdict) {
            Some(verified) => {
                self.handshake.start_countdown(self.config.countdown_ticks);
                self.timers.start(
                    TimerPurpose::Countdown,
                    Schedule::every(self.config.countdown_tick()),
                );
                self.notify(verified);
            }
            None if !current => {
                warn!(session = %submission.session, "discarding verdict for an abandoned session");
            }
            None => {}
        }
    }

    fn notify(&mut self, identity: Identity) {
        self.dispatch(move |backend| async move {
            let result = backend.send_notification(&identity).await;
            Completion::Notified { identity, result }
        });
    }

    fn countdown_tick(&mut self) {
        match self.handshake.tick_countdown() {
            Some(0) | None => {
                info!("countdown finished");
                self.reset_session();
            }
            Some(remaining) => debug!(remaining, "countdown"),
        }
    }

    fn dismiss_verification(&mut self) -> Result<()> {
        let active = self.router.active();
        if active != StationId::CheckIn {
            return Err(CoordinatorError::WrongStation {
                expected: StationId::CheckIn,
                active,
            });
        }
        info!(status = %self.handshake.status(), "verification dismissed");
        self.reset_session();
        Ok(())
    }

    /// Back to idle: timers, session, server detections, and station 1 in face mode.
    fn reset_session(&mut self) {
        self.timers
            .cancel_each(&[TimerPurpose::CodeWaitPoll, TimerPurpose::Countdown]);
        self.handshake.reset();
        self.reset_scan();

        if self.router.is_active(StationId::CheckIn) {
            self.router.set_mode(CaptureMode::Face);
            self.displays
                .set_reading(StationId::CheckIn, Identity::sentinel());
            self.select_stream();
            self.start_station_work();
        } else {
            self.router.bump();
        }
    }

    // Station 2 debouncer

    fn on_scan(&mut self, identity: Identity) {
        if self.debouncer.on_scan(&identity) == ScanDecision::Ignore {
            return;
        }
        info!(identity = %identity, "station 2 scan");
        if let Some(scan) = self.displays.scan_mut() {
            scan.show(identity.clone(), &self.config.photo_url_template);
        }
        self.timers.start(
            TimerPurpose::Station2Clear,
            Schedule::once(self.config.station2_dwell()),
        );
        self.dispatch(move |backend| async move {
            let result = backend.enqueue(&identity).await;
            Completion::Enqueued { identity, result }
        });
    }

    fn on_enqueued(&mut self, identity: Identity, result: ServiceResult<Outcome>) {
        let message = match result {
            Ok(Outcome::Accepted { message }) => {
                info!(identity = %identity, "enqueued");
                self.refresh_queue(true);
                message
            }
            Ok(Outcome::Rejected { message }) => {
                info!(identity = %identity, reason = %message, "enqueue refused");
                message
            }
            Err(error) => {
                warn!(identity = %identity, error = %error, "enqueue failed");
                return;
            }
        };
        if self.debouncer.is_displayed(&identity)
            && let Some(scan) = self.displays.scan_mut()
        {
            scan.message = Some(message);
        }
    }

    fn clear_station2(&mut self) {
        info!("station 2 dwell elapsed");
        self.debouncer.clear();
        if let Some(scan) = self.displays.scan_mut() {
            scan.clear();
        }
        self.reset_scan();
    }

    // Queue coordinator

    fn refresh_queue(&mut self, coalesce: bool) {
        if !self.queue.begin_refresh(coalesce) {
            return;
        }
        self.dispatch(|backend| async move {
            let result = backend.fetch_queue().await;
            Completion::QueueFetched { result }
        });
    }
}
