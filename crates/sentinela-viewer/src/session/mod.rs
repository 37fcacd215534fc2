use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, info, warn};

use crate::{
    context::Context,
    media::{MediaSession, StreamHandle, TrackKind, TransportEvent},
    retry::{FailureClass, RetryPolicy},
};

mod registry;
pub use registry::SessionRegistry;

const COMMAND_CHANNEL_DEPTH: usize = 8;

/// Lifecycle of one camera's streaming session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Negotiating,
    Connected,
    /// A connected transport dropped; a retry is about to be scheduled.
    Degraded,
    Retrying {
        attempt: u32,
    },
    /// Automatic retries are exhausted; only a manual retry restarts this.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionCommand {
    RetryNow,
    Stop,
}

/// Renderable output of a session: at most one stream per kind, first wins.
#[derive(Clone)]
pub struct Surface {
    pub camera_id: String,
    pub video: Option<StreamHandle>,
    pub audio: Option<StreamHandle>,
}

impl Surface {
    fn new(camera_id: &str) -> Self {
        Self {
            camera_id: camera_id.to_string(),
            video: None,
            audio: None,
        }
    }

    /// Returns whether the surface changed.
    fn attach(&mut self, kind: TrackKind, stream: StreamHandle) -> bool {
        let slot = match kind {
            TrackKind::Video => &mut self.video,
            TrackKind::Audio => &mut self.audio,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(stream);
        true
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn capture_frame(&self) -> Option<Vec<u8>> {
        self.video.as_ref()?.capture_frame()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub gather_timeout: Duration,
    /// Upper bound on the offer/answer exchange with the backend.
    pub signalling_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            gather_timeout: Duration::from_secs(2),
            signalling_timeout: Duration::from_secs(10),
        }
    }
}

/// Owner-side handle to a spawned [`CameraSession`].
pub struct SessionHandle {
    camera_id: String,
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<SessionState>,
    surface: watch::Receiver<Option<Surface>>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn surface(&self) -> Option<Surface> {
        self.surface.borrow().clone()
    }

    pub fn watch_surface(&self) -> watch::Receiver<Option<Surface>> {
        self.surface.clone()
    }

    /// User-initiated retry. Resets the failure counter and reconnects,
    /// including out of the [`SessionState::Unavailable`] state.
    pub async fn retry_now(&self) {
        let _ = self.commands.send(SessionCommand::RetryNow).await;
    }

    /// Stops the session and waits for the transport to be released.
    /// Cancels any pending retry timer.
    pub async fn destroy(self) {
        let _ = self.commands.send(SessionCommand::Stop).await;
        let _ = self.task.await;
    }
}

enum Flow {
    Stopped,
    Failed(FailureClass),
}

pub struct CameraSession {
    camera_id: String,
    context: Arc<Context>,
    settings: SessionSettings,
    policy: RetryPolicy,
    attempt: u32,
    commands: mpsc::Receiver<SessionCommand>,
    state_tx: watch::Sender<SessionState>,
    surface_tx: watch::Sender<Option<Surface>>,
}

impl CameraSession {
    pub fn spawn(
        context: Arc<Context>,
        camera_id: impl Into<String>,
        settings: SessionSettings,
    ) -> SessionHandle {
        let camera_id = camera_id.into();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_DEPTH);
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (surface_tx, surface_rx) = watch::channel(None);

        let session = CameraSession {
            camera_id: camera_id.clone(),
            context,
            settings,
            policy: RetryPolicy::default(),
            attempt: 0,
            commands: command_rx,
            state_tx,
            surface_tx,
        };
        let task = tokio::spawn(session.run());

        SessionHandle {
            camera_id,
            commands: command_tx,
            state: state_rx,
            surface: surface_rx,
            task,
        }
    }

    async fn run(mut self) {
        loop {
            match self.connect_once().await {
                Flow::Stopped => break,
                Flow::Failed(class) => {
                    self.attempt += 1;
                    let decision = self.policy.decide(class, self.attempt);

                    if !decision.should_retry {
                        warn!(
                            camera_id = %self.camera_id,
                            attempts = self.attempt,
                            "Retry cap reached, waiting for manual retry"
                        );
                        self.set_state(SessionState::Unavailable);
                        if !self.wait_for_manual_retry().await {
                            break;
                        }
                        self.attempt = 0;
                        continue;
                    }

                    debug!(
                        camera_id = %self.camera_id,
                        ?class,
                        attempt = self.attempt,
                        delay = ?decision.delay,
                        "Scheduling reconnect"
                    );
                    self.set_state(SessionState::Retrying {
                        attempt: self.attempt,
                    });
                    tokio::select! {
                        _ = sleep(decision.delay) => {}
                        command = self.commands.recv() => match command {
                            Some(SessionCommand::RetryNow) => self.attempt = 0,
                            Some(SessionCommand::Stop) | None => break,
                        },
                    }
                }
            }
        }
        self.surface_tx.send_replace(None);
    }

    /// One full negotiate-then-stream pass. Returns when the session should
    /// stop or has failed in a classified way.
    async fn connect_once(&mut self) -> Flow {
        self.surface_tx.send_replace(None);
        self.set_state(SessionState::Negotiating);

        let negotiation = negotiate(self.context.clone(), self.camera_id.clone(), self.settings);
        tokio::pin!(negotiation);

        let (mut media, mut events) = loop {
            tokio::select! {
                outcome = &mut negotiation => match outcome {
                    Ok(connected) => break connected,
                    Err(class) => return Flow::Failed(class),
                },
                command = self.commands.recv() => match command {
                    // A reconnect is already underway.
                    Some(SessionCommand::RetryNow) => {}
                    Some(SessionCommand::Stop) | None => return Flow::Stopped,
                },
            }
        };

        info!(camera_id = %self.camera_id, "Session connected");
        self.set_state(SessionState::Connected);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(TransportEvent::Track { kind, stream }) => self.attach_track(kind, stream),
                    Some(TransportEvent::FrameFlowing) => {
                        if self.attempt != 0 {
                            debug!(camera_id = %self.camera_id, "Media flowing, failure counter cleared");
                        }
                        self.attempt = 0;
                    }
                    Some(TransportEvent::ConnectivityLost) | None => {
                        warn!(camera_id = %self.camera_id, "Transport connectivity lost");
                        self.set_state(SessionState::Degraded);
                        media.close().await;
                        return Flow::Failed(FailureClass::ConnectivityLost);
                    }
                },
                command = self.commands.recv() => match command {
                    // Stream is live; nothing to retry.
                    Some(SessionCommand::RetryNow) => {}
                    Some(SessionCommand::Stop) | None => {
                        media.close().await;
                        return Flow::Stopped;
                    }
                },
            }
        }
    }

    fn attach_track(&mut self, kind: TrackKind, stream: StreamHandle) {
        debug!(camera_id = %self.camera_id, ?kind, stream_id = stream.id(), "Track attached");
        self.surface_tx.send_if_modified(|slot| match slot {
            Some(surface) => surface.attach(kind, stream),
            None => {
                let mut surface = Surface::new(&self.camera_id);
                surface.attach(kind, stream);
                *slot = Some(surface);
                true
            }
        });
    }

    /// Returns false when the session was told to stop instead. An accepted
    /// retry puts the session back at [`SessionState::Idle`] so watchers see
    /// the full lifecycle restart.
    async fn wait_for_manual_retry(&mut self) -> bool {
        match self.commands.recv().await {
            Some(SessionCommand::RetryNow) => {
                info!(camera_id = %self.camera_id, "Manual retry requested");
                self.set_state(SessionState::Idle);
                true
            }
            Some(SessionCommand::Stop) | None => false,
        }
    }

    fn set_state(&self, state: SessionState) {
        self.state_tx.send_replace(state);
    }
}

type Negotiated = (Box<dyn MediaSession>, mpsc::Receiver<TransportEvent>);

async fn negotiate(
    context: Arc<Context>,
    camera_id: String,
    settings: SessionSettings,
) -> std::result::Result<Negotiated, FailureClass> {
    let mut media = match context.media.open(&camera_id).await {
        Ok(media) => media,
        Err(e) => {
            warn!(camera_id = %camera_id, error = %e, "Failed to open media session");
            return Err(FailureClass::Other);
        }
    };

    let offer = match media.create_offer(settings.gather_timeout).await {
        Ok(offer) => offer,
        Err(e) => {
            warn!(camera_id = %camera_id, error = %e, "Failed to build offer");
            media.close().await;
            return Err(FailureClass::Other);
        }
    };

    let exchange = tokio::time::timeout(
        settings.signalling_timeout,
        context.signalling.negotiate(&camera_id, &offer),
    );
    let answer = match exchange.await {
        Ok(Ok(answer)) => answer,
        Ok(Err(e)) => {
            let class = FailureClass::from_signalling(&e);
            warn!(camera_id = %camera_id, error = %e, ?class, "Signalling exchange failed");
            media.close().await;
            return Err(class);
        }
        Err(_) => {
            warn!(camera_id = %camera_id, "Signalling exchange timed out");
            media.close().await;
            return Err(FailureClass::Other);
        }
    };

    if let Err(e) = media.apply_answer(&answer).await {
        warn!(camera_id = %camera_id, error = %e, "Failed to apply answer");
        media.close().await;
        return Err(FailureClass::Other);
    }

    let Some(events) = media.take_events() else {
        media.close().await;
        return Err(FailureClass::Other);
    };

    Ok((media, events))
}
