//! Lifecycle of one display client's event stream.
//!
//! A [`StreamSession`] moves through
//! `Created -> Registered -> Streaming -> Closed`:
//!
//! - **Registered**: a [`ListenerHandle`] and the snapshot taken at
//!   registration time are attached. The session first emits the
//!   snapshot, the reconnection delay and one heartbeat, before it reads
//!   anything pushed to the listener.
//! - **Streaming**: each call to [`StreamSession::next_event`] waits for
//!   a pushed payload or for the heartbeat interval to pass, whichever
//!   comes first.
//! - **Closed**: the listener is unregistered. This happens on
//!   [`StreamSession::close`], when the registry drops the listener, and
//!   when the session is dropped, which is what a client disconnect looks
//!   like from here.

use std::collections::VecDeque;
use std::time::Duration;

use futures::Stream;
use tracing::debug;

use crate::registry::{ListenerHandle, ListenerId, Payload};

/// Longest quiet period before a heartbeat is sent.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

/// Delay clients should wait before reconnecting after a drop.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Text of the keep-alive comment line.
pub const HEARTBEAT_COMMENT: &str = "heartbeat";

/// Timing knobs for stream sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    /// Quiet period after which a heartbeat is emitted.
    pub heartbeat: Duration,
    /// Reconnection delay advertised at stream start.
    pub retry: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            heartbeat: HEARTBEAT_INTERVAL,
            retry: RECONNECT_DELAY,
        }
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No listener attached yet.
    Created,
    /// Listener attached, opening events not yet all emitted.
    Registered,
    /// Forwarding pushed payloads and heartbeats.
    Streaming,
    /// Listener released. Terminal.
    Closed,
}

/// One item emitted to a display client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// State at the moment the session registered.
    Snapshot(Payload),
    /// Reconnection delay directive.
    Retry(Duration),
    /// Keep-alive comment. Carries no state.
    Heartbeat,
    /// State after a committed mutation.
    Update(Payload),
}

impl SessionEvent {
    /// The state line carried by this event, if any.
    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Snapshot(payload) | Self::Update(payload) => Some(payload.as_ref()),
            Self::Retry(_) | Self::Heartbeat => None,
        }
    }
}

/// Per-connection stream state machine.
#[derive(Debug)]
pub struct StreamSession {
    phase: SessionPhase,
    listener: Option<ListenerHandle>,
    pending: VecDeque<SessionEvent>,
    settings: StreamSettings,
}

impl StreamSession {
    /// A session with no listener yet.
    pub const fn new(settings: StreamSettings) -> Self {
        Self {
            phase: SessionPhase::Created,
            listener: None,
            pending: VecDeque::new(),
            settings,
        }
    }

    /// Attach the listener and the snapshot captured when it registered.
    ///
    /// Only a `Created` session accepts a listener; any other session
    /// releases the offered one immediately.
    #[must_use]
    pub fn attach(mut self, mut listener: ListenerHandle, snapshot: Payload) -> Self {
        if self.phase != SessionPhase::Created {
            debug!(listener_id = %listener.id(), phase = ?self.phase, "session already attached");
            listener.close();
            return self;
        }

        self.pending.push_back(SessionEvent::Snapshot(snapshot));
        self.pending.push_back(SessionEvent::Retry(self.settings.retry));
        self.pending.push_back(SessionEvent::Heartbeat);
        debug!(listener_id = %listener.id(), "stream session registered");
        self.listener = Some(listener);
        self.phase = SessionPhase::Registered;
        self
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Id of the attached listener, until the session closes.
    pub fn listener_id(&self) -> Option<ListenerId> {
        self.listener.as_ref().map(ListenerHandle::id)
    }

    /// Produce the next event, or `None` once the session is closed.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        if self.phase == SessionPhase::Registered {
            if let Some(event) = self.pending.pop_front() {
                if self.pending.is_empty() {
                    self.phase = SessionPhase::Streaming;
                }
                return Some(event);
            }
            self.phase = SessionPhase::Streaming;
        }

        if self.phase != SessionPhase::Streaming {
            self.close();
            return None;
        }

        let Some(listener) = self.listener.as_mut() else {
            self.close();
            return None;
        };

        match tokio::time::timeout(self.settings.heartbeat, listener.recv()).await {
            Ok(Some(payload)) => Some(SessionEvent::Update(payload)),
            Ok(None) => {
                debug!(listener_id = %listener.id(), "listener dropped by registry");
                self.close();
                None
            }
            Err(_elapsed) => Some(SessionEvent::Heartbeat),
        }
    }

    /// Release the listener and enter `Closed`. Idempotent.
    pub fn close(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        self.phase = SessionPhase::Closed;
        self.pending.clear();
        if let Some(mut listener) = self.listener.take() {
            listener.close();
            debug!(listener_id = %listener.id(), "stream session closed");
        }
    }

    /// Turn the session into a stream of events. Dropping the stream
    /// closes the session.
    pub fn into_stream(self) -> impl Stream<Item = SessionEvent> + Send + 'static {
        futures::stream::unfold(self, |mut session| async move {
            let event = session.next_event().await?;
            Some((event, session))
        })
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}
