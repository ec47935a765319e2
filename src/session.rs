//! Stream session lifecycle
//!
//! A [`StreamSession`] owns one input device, one output device and, once
//! the transport is open, the capture stream and playback scheduler that
//! connect them to the peer. It is driven entirely by explicit calls from
//! whoever owns the connection:
//!
//! ```text
//!  Idle ──start──▶ Connecting ──on_transport_open──▶ Capturing ◀───┐
//!                      │                              │    ▲        │
//!                      │                    interrupt │    │ audio  │
//!                      │                              ▼    │        │
//!                      │                           Interrupted      │
//!                      │                              │             │
//!                      └──── failure / stop / close ──┴─────────────┘
//!                                        │
//!                                        ▼
//!                                     Stopped
//! ```
//!
//! Terminal faults are reported once as [`SessionEvent::Terminated`]; decode
//! faults are rate-limited [`SessionEvent::Warning`]s and never stop playback.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::capture::{CaptureStats, CaptureStream};
use crate::audio::device::{InputDevice, OutputDevice};
use crate::audio::scheduler::{playback_channel, PlaybackScheduler, SchedulerStats};
use crate::config::{CaptureConfig, PlaybackConfig};
use crate::constants::DECODE_WARNING_INTERVAL_MS;
use crate::error::{AudioError, CodecError, SessionError, TransportError};
use crate::network::Transport;
use crate::protocol::{DownstreamMessage, TransportChunk};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Capturing,
    Interrupted,
    Stopped,
}

impl SessionState {
    /// Capturing or Interrupted
    pub fn is_live(self) -> bool {
        matches!(self, SessionState::Capturing | SessionState::Interrupted)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Capturing => "capturing",
            SessionState::Interrupted => "interrupted",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Notifications for the session owner
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    /// A chunk or message was dropped. `suppressed` counts faults since the
    /// previous warning that were not reported.
    Warning { error: CodecError, suppressed: u64 },
    /// The peer finished its turn
    TurnComplete,
    /// The session stopped on this fault; sent at most once
    Terminated(SessionError),
}

/// Admits at most one report per interval, counting the rest
#[derive(Debug)]
pub struct WarningLimiter {
    interval: Duration,
    last: Option<Instant>,
    suppressed: u64,
}

impl WarningLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            suppressed: 0,
        }
    }

    /// `Some(suppressed)` if a report is due at `now`
    pub fn admit(&mut self, now: Instant) -> Option<u64> {
        let due = self
            .last
            .map_or(true, |last| now.duration_since(last) >= self.interval);
        if due {
            self.last = Some(now);
            Some(std::mem::take(&mut self.suppressed))
        } else {
            self.suppressed += 1;
            None
        }
    }
}

/// One capture/playback session against one peer
pub struct StreamSession<I: InputDevice, O: OutputDevice> {
    state: SessionState,
    session_id: Option<String>,
    capture_config: CaptureConfig,
    playback_config: PlaybackConfig,
    input: Option<I>,
    output: O,
    capture: Option<CaptureStream<I>>,
    scheduler: Option<PlaybackScheduler>,
    transport: Option<Arc<dyn Transport>>,
    events: Sender<SessionEvent>,
    warnings: WarningLimiter,
}

impl<I: InputDevice, O: OutputDevice> StreamSession<I, O> {
    /// Create an idle session and the receiver for its events
    pub fn new(
        input: I,
        output: O,
        capture_config: CaptureConfig,
        playback_config: PlaybackConfig,
    ) -> (Self, Receiver<SessionEvent>) {
        let (events, rx) = unbounded();
        let session = Self {
            state: SessionState::Idle,
            session_id: None,
            capture_config,
            playback_config,
            input: Some(input),
            output,
            capture: None,
            scheduler: None,
            transport: None,
            events,
            warnings: WarningLimiter::new(Duration::from_millis(DECODE_WARNING_INTERVAL_MS)),
        };
        (session, rx)
    }

    /// Begin connecting. The session identifier is required.
    pub fn start(&mut self, session_id: &str) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState {
                state: self.state,
                operation: "start",
            });
        }
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(SessionError::MissingSessionId);
        }

        tracing::info!("Starting session {}", session_id);
        self.session_id = Some(session_id.to_string());
        self.set_state(SessionState::Connecting);
        Ok(())
    }

    /// The transport handshake succeeded; acquire both devices and go live.
    ///
    /// Any acquisition failure stops the session with a single
    /// [`SessionEvent::Terminated`] and leaves nothing running.
    pub fn on_transport_open(&mut self, transport: Arc<dyn Transport>) -> Result<(), SessionError> {
        if self.state != SessionState::Connecting {
            return Err(SessionError::InvalidState {
                state: self.state,
                operation: "open transport",
            });
        }
        self.transport = Some(transport.clone());

        let (scheduler, renderer) =
            playback_channel(&self.playback_config, self.output.sample_rate());
        if let Err(e) = self.output.start(renderer) {
            return Err(self.terminate(SessionError::DeviceAcquisition(e)));
        }
        self.scheduler = Some(scheduler);

        let Some(input) = self.input.take() else {
            let e = AudioError::DeviceUnavailable("input already in use".to_string());
            return Err(self.terminate(SessionError::DeviceAcquisition(e)));
        };
        let mut capture = CaptureStream::new(input, self.capture_config.clone());
        if let Err(e) = capture.start(transport) {
            return Err(self.terminate(SessionError::DeviceAcquisition(e)));
        }
        self.capture = Some(capture);

        tracing::info!(
            "Session {} live: output {} Hz, {:?} playback",
            self.session_id.as_deref().unwrap_or_default(),
            self.output.sample_rate(),
            self.playback_config.strategy
        );
        self.set_state(SessionState::Capturing);
        Ok(())
    }

    /// The transport could not be established or failed while live
    pub fn on_transport_failed(&mut self, error: TransportError) {
        if self.state == SessionState::Stopped {
            return;
        }
        self.terminate(SessionError::Transport(error));
    }

    /// The peer closed the connection
    pub fn on_transport_closed(&mut self, reason: Option<String>) {
        if self.state == SessionState::Stopped {
            return;
        }
        let reason = reason.unwrap_or_else(|| "closed by peer".to_string());
        self.terminate(SessionError::Transport(TransportError::Closed(reason)));
    }

    /// Dispatch one downstream text frame
    pub fn on_transport_message(&mut self, text: &str) {
        if !self.state.is_live() {
            tracing::debug!("Ignoring message while {}", self.state);
            return;
        }

        let message = match DownstreamMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                self.warn_decode(e);
                return;
            }
        };

        match message {
            DownstreamMessage::Audio {
                data,
                turn_complete,
            } => {
                match TransportChunk::from_base64(&data, self.playback_config.wire_rate) {
                    Ok(chunk) => self.on_incoming_chunk(chunk),
                    Err(e) => self.warn_decode(e),
                }
                if turn_complete {
                    self.emit(SessionEvent::TurnComplete);
                }
            }
            DownstreamMessage::TurnComplete => {
                tracing::debug!("Peer turn complete");
                self.emit(SessionEvent::TurnComplete);
            }
            DownstreamMessage::Interrupted => {
                let _ = self.interrupt();
            }
            DownstreamMessage::Error { message } => {
                tracing::error!("Peer reported error: {}", message);
                self.terminate(SessionError::Transport(TransportError::Peer(message)));
            }
            DownstreamMessage::Unknown(kind) => {
                tracing::info!("Ignoring unknown message type '{}'", kind);
            }
        }
    }

    /// Decode and schedule one downstream chunk.
    ///
    /// A non-empty chunk resumes an interrupted session.
    pub fn on_incoming_chunk(&mut self, chunk: TransportChunk) {
        if !self.state.is_live() {
            return;
        }
        let Some(scheduler) = self.scheduler.as_mut() else {
            return;
        };

        match scheduler.schedule_chunk(&chunk) {
            Ok(enqueued) => {
                if enqueued.frames > 0 && self.state == SessionState::Interrupted {
                    self.set_state(SessionState::Capturing);
                }
            }
            Err(e) => self.warn_decode(e),
        }
    }

    /// Discard all queued playback; capture keeps running
    pub fn interrupt(&mut self) -> Result<(), SessionError> {
        if !self.state.is_live() {
            return Err(SessionError::InvalidState {
                state: self.state,
                operation: "interrupt",
            });
        }
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.interrupt();
        }
        if self.state != SessionState::Interrupted {
            tracing::info!("Playback interrupted");
            self.set_state(SessionState::Interrupted);
        }
        Ok(())
    }

    /// Check both devices for asynchronous faults; a fault stops the session
    pub fn poll_devices(&mut self) {
        if !self.state.is_live() {
            return;
        }
        let fault = self
            .capture
            .as_mut()
            .and_then(|c| c.check_errors())
            .or_else(|| self.output.poll_error());
        if let Some(e) = fault {
            self.terminate(SessionError::DeviceFault(e));
        }
    }

    /// Release everything. Idempotent; the session cannot be restarted.
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        tracing::info!("Stopping session");
        self.release();
        self.set_state(SessionState::Stopped);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// True while playback audio is still queued for the speaker
    pub fn is_speaking(&self) -> bool {
        self.state.is_live() && self.scheduler.as_ref().is_some_and(|s| !s.is_idle())
    }

    pub fn capture_stats(&self) -> Option<CaptureStats> {
        self.capture.as_ref().map(|c| c.stats())
    }

    pub fn scheduler_stats(&self) -> Option<SchedulerStats> {
        self.scheduler.as_ref().map(|s| s.stats())
    }

    fn release(&mut self) {
        // Silence playback first so no stale audio is heard while capture drains
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.shutdown();
        }
        if let Some(capture) = self.capture.as_mut() {
            capture.stop();
        }
        self.output.stop();
        if let Some(transport) = self.transport.take() {
            transport.close();
        }
    }

    fn terminate(&mut self, error: SessionError) -> SessionError {
        tracing::error!("Session terminated: {}", error);
        self.release();
        self.emit(SessionEvent::Terminated(error.clone()));
        self.set_state(SessionState::Stopped);
        error
    }

    fn warn_decode(&mut self, error: CodecError) {
        if let Some(suppressed) = self.warnings.admit(Instant::now()) {
            if suppressed > 0 {
                tracing::warn!(
                    "Dropped downstream audio: {} ({} similar suppressed)",
                    error,
                    suppressed
                );
            } else {
                tracing::warn!("Dropped downstream audio: {}", error);
            }
            self.emit(SessionEvent::Warning { error, suppressed });
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!("Session state {} -> {}", self.state, state);
            self.state = state;
            self.emit(SessionEvent::StateChanged(state));
        }
    }

    fn emit(&self, event: SessionEvent) {
        // The owner may have dropped the receiver
        let _ = self.events.send(event);
    }
}

impl<I: InputDevice, O: OutputDevice> Drop for StreamSession<I, O> {
    fn drop(&mut self) {
        self.stop();
    }
}
