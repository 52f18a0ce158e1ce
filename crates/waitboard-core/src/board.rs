//! The shared board: one state store plus its subscriber registry.
//!
//! [`Board`] is what request handlers and stream endpoints receive (as an
//! `Arc<Board>`). Every mutator locks the store, applies the change,
//! formats the payload and broadcasts it before the lock is released.
//! Broadcasting only uses non-blocking sends, so the lock is never held
//! across an `.await`, and listeners see mutations in commit order with
//! exactly one payload per successful mutation.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::WaitboardConfig;
use crate::error::InvalidModeError;
use crate::registry::{DEFAULT_LISTENER_CAPACITY, Payload, SubscriberRegistry};
use crate::session::{StreamSession, StreamSettings};
use crate::state::{DisplayMode, DisplayState, StateStore};

/// Shared display state and its listeners.
#[derive(Debug)]
pub struct Board {
    store: Mutex<StateStore>,
    registry: Arc<SubscriberRegistry>,
    settings: StreamSettings,
}

impl Board {
    /// Create a board seeded with `initial`.
    pub fn new(initial: DisplayState, settings: StreamSettings, listener_capacity: usize) -> Self {
        Self {
            store: Mutex::new(StateStore::new(initial)),
            registry: Arc::new(SubscriberRegistry::new(listener_capacity)),
            settings,
        }
    }

    /// Create a board from loaded configuration.
    pub fn from_config(config: &WaitboardConfig) -> Self {
        Self::new(
            config.display.initial_state(),
            config.stream.settings(),
            config.stream.listener_capacity,
        )
    }

    /// Current state.
    pub fn snapshot(&self) -> DisplayState {
        self.store.lock().get()
    }

    /// Current state as a wire line.
    pub fn payload(&self) -> String {
        self.store.lock().format_payload()
    }

    /// Number of connected listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Stream timing used for new sessions.
    pub const fn settings(&self) -> StreamSettings {
        self.settings
    }

    /// The underlying registry.
    pub const fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Set the wait time (clamped to `0..=10`) and broadcast.
    pub fn set_wait(&self, value: i64) -> u8 {
        let mut store = self.store.lock();
        let wait = store.set_wait(value);
        self.publish(&store);
        info!(requested = value, wait, "wait time updated");
        wait
    }

    /// Set the offer text and broadcast. Returns the stored text and
    /// visibility.
    pub fn set_offer(&self, text: &str) -> (String, bool) {
        let mut store = self.store.lock();
        let (offer, show) = store.set_offer(text);
        self.publish(&store);
        info!(offer = %offer, show, "offer updated");
        (offer, show)
    }

    /// Show or hide the offer banner and broadcast.
    pub fn set_offer_visibility(&self, enabled: bool) -> bool {
        let mut store = self.store.lock();
        let show = store.set_offer_visibility(enabled);
        self.publish(&store);
        info!(show, "offer visibility updated");
        show
    }

    /// Change the display mode and broadcast. Nothing is broadcast when
    /// the mode is rejected.
    pub fn set_mode(&self, value: &str) -> Result<DisplayMode, InvalidModeError> {
        let mut store = self.store.lock();
        let mode = store.set_mode(value)?;
        self.publish(&store);
        info!(%mode, "display mode updated");
        Ok(mode)
    }

    /// Store the auto-offer flag and broadcast.
    pub fn set_auto_offer(&self, enabled: bool) -> bool {
        let mut store = self.store.lock();
        let auto_offer = store.set_auto_offer(enabled);
        self.publish(&store);
        info!(auto_offer, "auto offer flag updated");
        auto_offer
    }

    /// Register a new listener and wrap it in a stream session whose
    /// first event is the current state.
    ///
    /// Registration and the snapshot happen under the store lock, so the
    /// session receives every later mutation exactly once.
    pub fn open_session(&self) -> StreamSession {
        let store = self.store.lock();
        let listener = self.registry.register();
        let snapshot: Payload = Arc::from(store.format_payload());
        drop(store);

        StreamSession::new(self.settings).attach(listener, snapshot)
    }

    /// Close every listener so open streams end. New sessions opened
    /// afterwards end right after their opening events.
    pub fn shutdown(&self) {
        self.registry.close_all();
    }

    fn publish(&self, store: &StateStore) {
        let payload = store.format_payload();
        let report = self.registry.broadcast(&payload);
        debug!(
            payload = %payload,
            delivered = report.delivered,
            dropped = report.dropped,
            "state broadcast"
        );
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(
            DisplayState::default(),
            StreamSettings::default(),
            DEFAULT_LISTENER_CAPACITY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionEvent;

    async fn data_after_opening(session: &mut StreamSession) -> Option<String> {
        loop {
            match session.next_event().await? {
                SessionEvent::Update(payload) => return Some(payload.to_string()),
                SessionEvent::Snapshot(_) | SessionEvent::Retry(_) | SessionEvent::Heartbeat => {}
            }
        }
    }

    #[tokio::test]
    async fn new_session_starts_with_current_snapshot() {
        let board = Board::default();
        board.set_wait(8);

        let mut session = board.open_session();
        let first = session.next_event().await;
        assert_eq!(first.as_ref().and_then(SessionEvent::data), Some("8|un expresso|time|1"));
    }

    #[tokio::test]
    async fn snapshot_is_sent_without_a_new_mutation() {
        let board = Board::default();
        let mut first = board.open_session();
        let mut second = board.open_session();

        assert_eq!(
            first.next_event().await.as_ref().and_then(SessionEvent::data),
            Some("5|un expresso|time|1")
        );
        assert_eq!(
            second.next_event().await.as_ref().and_then(SessionEvent::data),
            Some("5|un expresso|time|1")
        );
    }

    #[tokio::test]
    async fn mutations_arrive_in_commit_order_without_coalescing() {
        let board = Board::default();
        let mut session = board.open_session();

        board.set_wait(2);
        board.set_offer("cookie");
        board.set_mode("dual").ok();
        board.set_offer_visibility(false);
        board.set_auto_offer(true);

        let mut seen = Vec::new();
        for _ in 0..5 {
            if let Some(line) = data_after_opening(&mut session).await {
                seen.push(line);
            }
        }
        assert_eq!(
            seen,
            [
                "2|un expresso|time|1",
                "2|cookie|time|1",
                "2|cookie|dual|1",
                "2|cookie|dual|0",
                "2|cookie|dual|0",
            ]
        );
    }

    #[tokio::test]
    async fn late_joiner_sees_prior_state_then_next_mutation() {
        let board = Board::default();
        board.set_mode("logo").ok();

        let mut session = board.open_session();
        board.set_wait(0);

        assert_eq!(
            session.next_event().await.as_ref().and_then(SessionEvent::data),
            Some("5|un expresso|logo|1")
        );
        assert_eq!(
            data_after_opening(&mut session).await.as_deref(),
            Some("0|un expresso|logo|1")
        );
    }

    #[test]
    fn rejected_mode_broadcasts_nothing() {
        let board = Board::default();
        let mut listener = board.registry().register();

        assert!(board.set_mode("bogus").is_err());
        assert!(listener.try_recv().is_none());
        assert_eq!(board.snapshot().display_mode, DisplayMode::Time);

        assert_eq!(board.set_mode("LOGO"), Ok(DisplayMode::Logo));
        assert_eq!(listener.try_recv().as_deref(), Some("5|un expresso|logo|1"));
    }

    #[test]
    fn each_mutation_broadcasts_once() {
        let board = Board::default();
        let mut listener = board.registry().register();

        board.set_auto_offer(true);
        assert!(listener.try_recv().is_some());
        assert!(listener.try_recv().is_none());
    }

    #[test]
    fn default_state_scenario() {
        let board = Board::default();

        assert_eq!(board.set_offer(""), (String::new(), false));
        assert!(board.set_offer_visibility(true));
        assert_eq!(board.set_wait(15), 10);

        let state = board.snapshot();
        assert_eq!(state.offer_text, "");
        assert!(state.show_offer);
        assert_eq!(state.wait_minutes, 10);
        assert_eq!(board.payload(), "10||time|1");
    }

    #[tokio::test]
    async fn shutdown_ends_open_sessions() {
        let board = Board::default();
        let mut session = board.open_session();
        assert_eq!(board.listener_count(), 1);

        board.shutdown();
        assert_eq!(board.listener_count(), 0);
        assert!(data_after_opening(&mut session).await.is_none());
    }

    #[test]
    fn from_config_uses_display_defaults() {
        let mut config = WaitboardConfig::default();
        config.display.wait_minutes = 3;
        config.display.mode = DisplayMode::Dual;
        config.stream.heartbeat_secs = 5;

        let board = Board::from_config(&config);
        assert_eq!(board.payload(), "3|un expresso|dual|1");
        assert_eq!(board.settings().heartbeat, std::time::Duration::from_secs(5));
    }
}
