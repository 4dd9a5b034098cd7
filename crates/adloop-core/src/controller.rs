// ── Reconciliation controller ──
//
// One task (the session) owns every piece of mutable client context: state,
// player and timers. The public `Controller` handle is cheap to clone and
// talks to the session over an unbounded command channel. Remote calls run
// as detached tasks that report back as events, so a slow request never
// blocks the session and overlapping requests are allowed.

use std::sync::Arc;

use adloop_api::{Branch, BranchSummary, CacheStats, SignageClient, TransportConfig, VideoItem};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::identity::{DeviceId, IdentityProvider, ResolvedIdentity};
use crate::player::{MediaSink, PlaylistPlayer, SinkEvent};
use crate::screen::{Picker, PickerStatus, Screen};
use crate::sink::ProcessSink;
use crate::state::{ClientState, Transition};
use crate::timers::{TimerKind, TimerPair};

/// Messages handled by the session task.
#[derive(Debug)]
pub(crate) enum ControlEvent {
    CheckBranch,
    SendHeartbeat,
    ReloadBranchList,
    SelectBranch(String),
    Tick { kind: TimerKind, generation: u64 },
    PollResult(Result<Option<Branch>, CoreError>),
    BranchList(Result<Vec<BranchSummary>, CoreError>),
    AssignResult(Result<(), CoreError>),
    VideoStarted(String),
    VideoFailed(String),
}

/// Point-in-time view of the session, published after every event.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ControllerSnapshot {
    pub state: ClientState,
    pub timers_active: bool,
    pub now_playing: Option<VideoItem>,
    /// Playback errors reported since startup.
    pub playback_errors: u64,
}

// ── Controller ───────────────────────────────────────────────────

/// Handle to a running signage session.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    device_id: DeviceId,
    identity: ResolvedIdentity,
    command_tx: mpsc::UnboundedSender<ControlEvent>,
    screen: watch::Receiver<Screen>,
    snapshot: watch::Receiver<ControllerSnapshot>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    /// Start a session that plays through the configured external player.
    pub fn launch(config: ControllerConfig) -> Result<Self, CoreError> {
        let (sink, sink_events) = ProcessSink::new(config.player.clone());
        Self::start(config, sink, sink_events)
    }

    /// Resolve identity, then spawn the session task.
    ///
    /// Must be called inside a tokio runtime. Startup (initial heartbeat and
    /// branch fetch) continues in the background; watch [`screen`](Self::screen)
    /// for the outcome.
    pub fn start<S>(
        config: ControllerConfig,
        sink: S,
        sink_events: mpsc::UnboundedReceiver<SinkEvent>,
    ) -> Result<Self, CoreError>
    where
        S: MediaSink + 'static,
    {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = SignageClient::new(config.base_url.clone(), &transport)?;

        let identity = IdentityProvider::new(config.identity.clone()).resolve();
        info!(device_id = %identity.id, source = %identity.source, "device identity resolved");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (screen_tx, screen) = watch::channel(Screen::default());
        let (snapshot_tx, snapshot) = watch::channel(ControllerSnapshot::default());
        let cancel = CancellationToken::new();

        let player = PlaylistPlayer::new(sink, client.media_resolver().clone());
        let session = Session {
            config,
            client,
            device_id: identity.id.clone(),
            started_at: Instant::now(),
            state: ClientState::default(),
            player,
            timers: TimerPair::default(),
            tx: command_tx.clone(),
            screen: screen_tx,
            snapshot: snapshot_tx,
            playback_errors: 0,
        };
        let task = tokio::spawn(session.run(command_rx, sink_events, cancel.clone()));

        Ok(Self {
            inner: Arc::new(ControllerInner {
                device_id: identity.id.clone(),
                identity,
                command_tx,
                screen,
                snapshot,
                cancel,
                task: Mutex::new(Some(task)),
            }),
        })
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.inner.device_id
    }

    pub fn identity(&self) -> &ResolvedIdentity {
        &self.inner.identity
    }

    /// Subscribe to screen changes.
    pub fn screen(&self) -> watch::Receiver<Screen> {
        self.inner.screen.clone()
    }

    /// Subscribe to session snapshots.
    pub fn snapshot(&self) -> watch::Receiver<ControllerSnapshot> {
        self.inner.snapshot.clone()
    }

    /// Poll the assigned branch now.
    pub fn check_branch(&self) -> Result<(), CoreError> {
        self.dispatch(ControlEvent::CheckBranch)
    }

    /// The display became visible again; poll immediately.
    pub fn visibility_regained(&self) -> Result<(), CoreError> {
        debug!("visibility regained");
        self.dispatch(ControlEvent::CheckBranch)
    }

    /// Send one heartbeat now.
    pub fn send_heartbeat(&self) -> Result<(), CoreError> {
        self.dispatch(ControlEvent::SendHeartbeat)
    }

    /// Reload the picker's branch list. Ignored unless the picker is shown.
    pub fn reload_branch_list(&self) -> Result<(), CoreError> {
        self.dispatch(ControlEvent::ReloadBranchList)
    }

    /// Assign `branch_id` to this device, then poll. Ignored unless the
    /// picker is shown.
    pub fn select_branch(&self, branch_id: impl Into<String>) -> Result<(), CoreError> {
        self.dispatch(ControlEvent::SelectBranch(branch_id.into()))
    }

    /// Stop playback and timers, and wait for the session to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let task = self.inner.task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "session task ended abnormally");
            }
        }
    }

    fn dispatch(&self, event: ControlEvent) -> Result<(), CoreError> {
        self.inner
            .command_tx
            .send(event)
            .map_err(|_| CoreError::Internal("controller has shut down".into()))
    }
}

// ── Session ──────────────────────────────────────────────────────

struct Session<S> {
    config: ControllerConfig,
    client: SignageClient,
    device_id: DeviceId,
    started_at: Instant,
    state: ClientState,
    player: PlaylistPlayer<S>,
    timers: TimerPair,
    tx: mpsc::UnboundedSender<ControlEvent>,
    screen: watch::Sender<Screen>,
    snapshot: watch::Sender<ControllerSnapshot>,
    playback_errors: u64,
}

impl<S: MediaSink + 'static> Session<S> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<ControlEvent>,
        mut sink_events: mpsc::UnboundedReceiver<SinkEvent>,
        cancel: CancellationToken,
    ) {
        let cancelled = tokio::select! {
            biased;
            () = cancel.cancelled() => true,
            () = self.startup() => false,
        };
        if cancelled {
            self.teardown();
            return;
        }
        self.publish();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                Some(event) = commands.recv() => self.handle(event),
                Some(event) = sink_events.recv() => {
                    self.player.handle_event(event);
                    self.sync_stopped();
                }
            }
            self.publish();
        }

        self.teardown();
    }

    /// Zero-uptime heartbeat, then the initial fetch.
    async fn startup(&mut self) {
        if let Err(e) = self
            .client
            .send_heartbeat(self.device_id.as_str(), "", std::time::Duration::ZERO, None)
            .await
        {
            debug!(error = %e, "startup heartbeat failed");
        }

        match self.client.fetch_assigned_branch(self.device_id.as_str()).await {
            Ok(branch) => self.apply_branch(branch.as_ref()),
            Err(e) => {
                warn!(error = %e, "startup branch fetch failed");
                self.apply_branch(None);
            }
        }
    }

    fn teardown(&mut self) {
        self.timers.stop();
        self.player.stop();
        debug!("session stopped");
    }

    fn handle(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::CheckBranch => self.spawn_poll(),
            ControlEvent::SendHeartbeat => self.spawn_heartbeat(),
            ControlEvent::ReloadBranchList => {
                if self.screen.borrow().is_picker() {
                    self.load_branch_list();
                }
            }
            ControlEvent::SelectBranch(branch_id) => self.select_branch(branch_id),
            ControlEvent::Tick { kind, generation } => {
                if !self.timers.is_current(generation) {
                    return;
                }
                match kind {
                    TimerKind::Heartbeat => self.spawn_heartbeat(),
                    TimerKind::BranchCheck => self.spawn_poll(),
                }
            }
            ControlEvent::PollResult(result) => self.on_poll(result),
            ControlEvent::BranchList(result) => self.on_branch_list(result),
            ControlEvent::AssignResult(result) => self.on_assigned(result),
            ControlEvent::VideoStarted(video_id) => self.state.record_started(&video_id),
            ControlEvent::VideoFailed(video_id) => {
                debug!(video_id = %video_id, "playback error recorded");
                self.playback_errors += 1;
                self.sync_stopped();
            }
        }
    }

    /// Drop the reported video once the player has given up.
    fn sync_stopped(&mut self) {
        if !self.player.is_active() && !self.state.current_video_id.is_empty() {
            debug!(video_id = %self.state.current_video_id, "playback stopped");
            self.state.record_stopped();
        }
    }

    /// The sole transition function.
    fn apply_branch(&mut self, branch: Option<&Branch>) {
        let transition = self.state.apply(branch);
        if let Some(b) = branch {
            info!(
                branch_id = %b.branch_id,
                videos = b.videos.len(),
                paused = b.is_paused,
                "applying branch"
            );
        }

        match transition {
            Transition::Unassigned => {
                self.player.stop();
                self.timers.stop();
                self.set_screen(Screen::BranchPicker(Picker::default()));
                self.load_branch_list();
            }
            Transition::Paused => {
                self.player.stop();
                self.timers.stop();
                self.spawn_heartbeat();
                self.set_screen(Screen::paused());
            }
            Transition::NoVideos => {
                self.player.stop();
                self.timers.stop();
                self.spawn_heartbeat();
                self.set_screen(Screen::no_videos());
            }
            Transition::Play(videos) => {
                let tx = self.tx.clone();
                self.player.set_on_started(move |video| {
                    let _ = tx.send(ControlEvent::VideoStarted(video.id.clone()));
                });
                let tx = self.tx.clone();
                self.player.set_on_error(move |video, _| {
                    let _ = tx.send(ControlEvent::VideoFailed(video.id.clone()));
                });
                self.player.load_branch(videos);
                self.timers.start(
                    self.config.heartbeat_interval,
                    self.config.branch_check_interval,
                    &self.tx,
                );
                self.set_screen(Screen::Video);
            }
        }
    }

    fn on_poll(&mut self, result: Result<Option<Branch>, CoreError>) {
        match result {
            Ok(None) => {
                self.state.record_poll();
                self.apply_branch(None);
            }
            Ok(Some(branch)) => {
                let changed = self.state.needs_apply(&branch);
                self.state.record_poll();
                if changed {
                    self.apply_branch(Some(&branch));
                } else {
                    debug!(branch_id = %branch.branch_id, "branch unchanged");
                }
            }
            Err(e) => debug!(error = %e, "branch check failed"),
        }
    }

    // ── Branch picker ────────────────────────────────────────────

    fn load_branch_list(&mut self) {
        self.update_picker(|picker| picker.status = PickerStatus::Loading);

        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.list_branches().await.map_err(CoreError::from);
            let _ = tx.send(ControlEvent::BranchList(result));
        });
    }

    fn on_branch_list(&mut self, result: Result<Vec<BranchSummary>, CoreError>) {
        if !self.screen.borrow().is_picker() {
            debug!("branch list arrived after picker closed");
            return;
        }

        match result {
            Ok(branches) => {
                let active: Vec<BranchSummary> =
                    branches.into_iter().filter(|b| b.is_active).collect();
                self.update_picker(|picker| {
                    picker.status = if active.is_empty() {
                        PickerStatus::Empty
                    } else {
                        PickerStatus::Ready
                    };
                    picker.branches = active;
                });
            }
            Err(e) => {
                warn!(error = %e, "failed to load branches");
                self.update_picker(|picker| {
                    picker.status = PickerStatus::Failed(e.to_string());
                    picker.branches.clear();
                });
            }
        }
    }

    fn select_branch(&mut self, branch_id: String) {
        if !self.screen.borrow().is_picker() {
            debug!(branch_id = %branch_id, "ignoring selection outside the picker");
            return;
        }
        info!(branch_id = %branch_id, "assigning branch");
        self.update_picker(|picker| picker.status = PickerStatus::Assigning);

        let client = self.client.clone();
        let device_id = self.device_id.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client
                .assign_branch(device_id.as_str(), &branch_id)
                .await
                .map_err(CoreError::from);
            let _ = tx.send(ControlEvent::AssignResult(result));
        });
    }

    fn on_assigned(&mut self, result: Result<(), CoreError>) {
        if !self.screen.borrow().is_picker() {
            return;
        }
        match result {
            Ok(()) => self.spawn_poll(),
            Err(e) => {
                warn!(error = %e, "branch assignment failed");
                self.update_picker(|picker| {
                    picker.status = PickerStatus::AssignFailed(e.to_string());
                });
            }
        }
    }

    // ── Remote calls ─────────────────────────────────────────────

    fn spawn_poll(&self) {
        let client = self.client.clone();
        let device_id = self.device_id.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client
                .fetch_assigned_branch(device_id.as_str())
                .await
                .map_err(CoreError::from);
            let _ = tx.send(ControlEvent::PollResult(result));
        });
    }

    fn spawn_heartbeat(&self) {
        let client = self.client.clone();
        let device_id = self.device_id.clone();
        let video_id = self.state.current_video_id.clone();
        let uptime = self.started_at.elapsed();
        tokio::spawn(async move {
            if let Err(e) = client
                .send_heartbeat(
                    device_id.as_str(),
                    &video_id,
                    uptime,
                    Some(CacheStats::default()),
                )
                .await
            {
                debug!(error = %e, "heartbeat failed");
            }
        });
    }

    // ── Publishing ───────────────────────────────────────────────

    fn set_screen(&self, screen: Screen) {
        self.screen.send_if_modified(|current| {
            if *current == screen {
                return false;
            }
            info!(from = current.name(), to = screen.name(), "screen transition");
            *current = screen;
            true
        });
    }

    fn update_picker(&self, f: impl FnOnce(&mut Picker)) {
        self.screen.send_if_modified(|current| match current {
            Screen::BranchPicker(picker) => {
                let before = picker.clone();
                f(picker);
                *picker != before
            }
            _ => false,
        });
    }

    fn publish(&self) {
        let snapshot = ControllerSnapshot {
            state: self.state.clone(),
            timers_active: self.timers.is_running(),
            now_playing: self
                .player
                .current_video()
                .filter(|_| self.player.is_active())
                .cloned(),
            playback_errors: self.playback_errors,
        };
        self.snapshot.send_replace(snapshot);
    }
}
