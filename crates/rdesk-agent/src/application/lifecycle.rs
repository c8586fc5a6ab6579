//! ConnectionLifecycle: connect, register, stream, recover.
//!
//! The lifecycle task owns the transport and drives the pure state machine in
//! [`crate::domain::connection`].  One iteration of the outer loop is one
//! *session*:
//!
//! ```text
//! Connecting ─▶ Connected ─▶ (geometry, cursor seed, register_client)
//!                  │
//!                  ├─ registration_success ─▶ Registered ─▶ start capture (once)
//!                  ├─ command              ─▶ CommandDispatcher
//!                  ├─ registration_fail    ─▶ Disconnected
//!                  └─ disconnect / EOF     ─▶ Disconnected
//! ```
//!
//! Every session end clears the registered flag and stops the capture task,
//! then the loop waits `reconnect_delay` and starts over.  The shutdown token
//! short-circuits every wait.

use std::sync::Arc;
use std::time::Duration;

use rdesk_core::protocol::codec::decode_inbound;
use rdesk_core::{DisplayGeometry, InboundMessage, OutboundMessage, ProtocolError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::dispatch_command::{CommandDispatcher, DispatchError};
use crate::application::display_geometry::{resolve_geometry, GeometrySource};
use crate::application::emulate_input::{InputSynthesizer, MotionSettings, PlatformInputEmulator};
use crate::application::interruptible_sleep;
use crate::application::stream_screen::{
    CapturePipeline, CaptureSettings, FrameEncoder, PipelineMetrics, ScreenGrabber,
};
use crate::application::transport::{MessageSink, Transport, TransportEvent, TransportLink};
use crate::domain::{AgentConfig, ConnectionState, ConnectionStatus, LifecycleEvent, SessionFlags};

/// Lifecycle timing and identity.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub server_url: String,
    pub token: String,
    /// Wait between a session end and the next connect attempt.
    pub reconnect_delay: Duration,
    /// How long a session end waits for the capture task before aborting it.
    pub capture_join_timeout: Duration,
    /// Same, on process shutdown.
    pub shutdown_join_timeout: Duration,
    pub capture: CaptureSettings,
    pub motion: MotionSettings,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:5000/agent".to_string(),
            token: String::new(),
            reconnect_delay: Duration::from_secs(3),
            capture_join_timeout: Duration::from_secs(2),
            shutdown_join_timeout: Duration::from_secs(3),
            capture: CaptureSettings::default(),
            motion: MotionSettings::default(),
        }
    }
}

impl From<&AgentConfig> for LifecycleConfig {
    fn from(cfg: &AgentConfig) -> Self {
        Self {
            server_url: cfg.server_url.clone(),
            token: cfg.token.clone(),
            reconnect_delay: cfg.reconnect_delay(),
            capture: CaptureSettings {
                fps: cfg.fps,
                jpeg_quality: cfg.jpeg_quality,
                ..CaptureSettings::default()
            },
            motion: MotionSettings {
                duration: cfg.move_duration(),
                steps: cfg.move_steps,
                ..MotionSettings::default()
            },
            ..Self::default()
        }
    }
}

pub struct SessionServices {
    pub emulator: Arc<dyn PlatformInputEmulator>,
    /// Tried in order; first success wins.
    pub geometry_sources: Vec<Arc<dyn GeometrySource>>,
    pub grabber: Arc<dyn ScreenGrabber>,
    pub encoder: Arc<dyn FrameEncoder>,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Ended,
    Shutdown,
}

struct CaptureHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Drives connect → register → stream → recover until shutdown.
pub struct ConnectionLifecycle {
    config: LifecycleConfig,
    transport: Arc<dyn Transport>,
    geometry_sources: Vec<Arc<dyn GeometrySource>>,
    grabber: Arc<dyn ScreenGrabber>,
    encoder: Arc<dyn FrameEncoder>,
    dispatcher: CommandDispatcher,
    flags: Arc<SessionFlags>,
    metrics: Arc<PipelineMetrics>,
    status: watch::Sender<ConnectionStatus>,
    capture: Option<CaptureHandle>,
    shutdown: CancellationToken,
    attempt: u64,
}

impl ConnectionLifecycle {
    pub fn new(
        config: LifecycleConfig,
        transport: Arc<dyn Transport>,
        services: SessionServices,
        shutdown: CancellationToken,
    ) -> Self {
        let flags = Arc::new(SessionFlags::new());
        let synthesizer = InputSynthesizer::new(services.emulator, config.motion);
        let (status, _) = watch::channel(ConnectionStatus::default());

        Self {
            dispatcher: CommandDispatcher::new(synthesizer, Arc::clone(&flags)),
            config,
            transport,
            geometry_sources: services.geometry_sources,
            grabber: services.grabber,
            encoder: services.encoder,
            flags,
            metrics: Arc::new(PipelineMetrics::new()),
            status,
            capture: None,
            shutdown,
            attempt: 0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn pipeline_metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Runs until the shutdown token is cancelled.
    pub async fn run(mut self) {
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            self.attempt += 1;
            let span = info_span!("session", id = %Uuid::new_v4(), attempt = self.attempt);
            let end = self.run_session().instrument(span).await;

            if end == SessionEnd::Shutdown {
                break;
            }

            let delay = self.config.reconnect_delay;
            info!("reconnecting in {delay:?}");
            if !interruptible_sleep(&self.shutdown, delay).await {
                break;
            }
        }

        info!("shutting down");
        self.flags.clear_registered();
        self.stop_capture(self.config.shutdown_join_timeout).await;
        self.transition(LifecycleEvent::Shutdown, None);
    }

    // ── Session ───────────────────────────────────────────────────────────────

    async fn run_session(&mut self) -> SessionEnd {
        self.transition(LifecycleEvent::ConnectRequested, None);
        info!(url = %self.config.server_url, "connecting");

        let connected = tokio::select! {
            _ = self.shutdown.cancelled() => return SessionEnd::Shutdown,
            r = self.transport.connect(&self.config.server_url) => r,
        };
        let TransportLink { sink, mut events } = match connected {
            Ok(link) => link,
            Err(e) => {
                warn!("connect failed: {e}");
                self.transition(LifecycleEvent::ConnectFailed, Some(e.to_string()));
                return SessionEnd::Ended;
            }
        };
        self.transition(LifecycleEvent::TransportConnected, None);

        let geometry = match self.begin_session(&sink).await {
            Ok(geometry) => geometry,
            Err(reason) => {
                error!("session aborted: {reason}");
                self.dispatcher.synthesizer_mut().end_session();
                sink.close().await;
                self.transition(LifecycleEvent::SessionAborted, Some(reason));
                return SessionEnd::Ended;
            }
        };

        let end = loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => break SessionEnd::Shutdown,
                ev = events.recv() => ev,
            };

            match event {
                Some(TransportEvent::Message { event, data }) => {
                    if let Some(reason) = self.handle_message(&event, data, geometry, &sink).await {
                        sink.close().await;
                        self.transition(LifecycleEvent::RegistrationRejected, Some(reason));
                        break SessionEnd::Ended;
                    }
                }
                Some(TransportEvent::Disconnected { reason }) => {
                    warn!(%reason, "transport disconnected");
                    self.transition(LifecycleEvent::TransportDropped, Some(reason));
                    break SessionEnd::Ended;
                }
                None => {
                    warn!("transport event stream ended");
                    self.transition(
                        LifecycleEvent::TransportDropped,
                        Some("event stream ended".to_string()),
                    );
                    break SessionEnd::Ended;
                }
            }
        };

        self.flags.clear_registered();
        self.dispatcher.synthesizer_mut().end_session();
        let join_timeout = match end {
            SessionEnd::Ended => self.config.capture_join_timeout,
            SessionEnd::Shutdown => self.config.shutdown_join_timeout,
        };
        self.stop_capture(join_timeout).await;
        sink.close().await;
        end
    }

    /// Resolves geometry, seeds the pointer, and sends `register_client`.
    async fn begin_session(&mut self, sink: &Arc<dyn MessageSink>) -> Result<DisplayGeometry, String> {
        let geometry = resolve_geometry(&self.geometry_sources).map_err(|e| e.to_string())?;
        let pointer = self.dispatcher.synthesizer_mut().begin_session(geometry);
        debug!(
            width = geometry.width(),
            height = geometry.height(),
            x = pointer.x,
            y = pointer.y,
            "session geometry ready"
        );

        sink.emit(OutboundMessage::register(self.config.token.clone()))
            .await
            .map_err(|e| format!("could not send registration: {e}"))?;
        info!("registration sent");
        Ok(geometry)
    }

    /// Handles one inbound message.  Returns `Some(reason)` when the server
    /// rejected the registration.
    async fn handle_message(
        &mut self,
        event: &str,
        data: serde_json::Value,
        geometry: DisplayGeometry,
        sink: &Arc<dyn MessageSink>,
    ) -> Option<String> {
        match decode_inbound(event, data) {
            Ok(InboundMessage::RegistrationSuccess) => self.on_registered(geometry, sink),
            Ok(InboundMessage::RegistrationFail(payload)) => {
                let reason = payload
                    .message
                    .unwrap_or_else(|| "registration rejected".to_string());
                error!(%reason, "registration rejected");
                return Some(reason);
            }
            Ok(InboundMessage::Command(payload)) => match self.dispatcher.dispatch(&payload).await {
                Ok(()) => {}
                Err(DispatchError::NotRegistered) => debug!("command ignored before registration"),
                Err(e) => warn!("{e}"),
            },
            Err(ProtocolError::UnknownEvent(name)) => debug!(event = %name, "ignoring unknown event"),
            Err(e) => warn!("undecodable message: {e}"),
        }
        None
    }

    fn on_registered(&mut self, geometry: DisplayGeometry, sink: &Arc<dyn MessageSink>) {
        let already = self.status.borrow().state == ConnectionState::Registered;
        self.transition(LifecycleEvent::RegistrationAccepted, None);
        self.flags.set_registered();

        if already {
            info!("duplicate registration acknowledgement ignored");
        } else {
            info!("registered");
        }

        if self.capture.as_ref().is_some_and(|c| !c.task.is_finished()) {
            debug!("capture pipeline already running");
            return;
        }

        let cancel = self.shutdown.child_token();
        let pipeline = CapturePipeline::new(
            geometry,
            Arc::clone(&self.flags),
            Arc::clone(&self.grabber),
            Arc::clone(&self.encoder),
            Arc::clone(sink),
            self.config.capture,
            Arc::clone(&self.metrics),
        );
        let task = tokio::spawn(pipeline.run(cancel.clone()).in_current_span());
        self.capture = Some(CaptureHandle { cancel, task });
    }

    async fn stop_capture(&mut self, join_timeout: Duration) {
        let Some(CaptureHandle { cancel, mut task }) = self.capture.take() else {
            return;
        };
        cancel.cancel();
        match tokio::time::timeout(join_timeout, &mut task).await {
            Ok(Ok(())) => debug!("capture pipeline joined"),
            Ok(Err(e)) => warn!("capture task ended abnormally: {e}"),
            Err(_) => {
                warn!("capture pipeline did not stop within {join_timeout:?}; aborting");
                task.abort();
            }
        }
    }

    // ── State ─────────────────────────────────────────────────────────────────

    fn transition(&self, event: LifecycleEvent, error: Option<String>) {
        let from = self.status.borrow().state;
        let next = match from.on(event) {
            Ok(next) => next,
            Err(e) => {
                error!("{e}");
                return;
            }
        };

        self.status.send_modify(|s| {
            s.state = next;
            match event {
                LifecycleEvent::ConnectFailed => s.retry_count = s.retry_count.saturating_add(1),
                LifecycleEvent::RegistrationAccepted => {
                    s.retry_count = 0;
                    s.last_error = None;
                }
                _ => {}
            }
            if let Some(e) = error {
                s.last_error = Some(e);
            }
        });

        if from != next {
            info!(from = %from, to = %next, "connection state changed");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
