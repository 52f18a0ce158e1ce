//! Fan-out of state payloads to connected display clients.
//!
//! Each connected client gets a bounded [`mpsc`] channel. The registry
//! keeps only the sending half, keyed by [`ListenerId`]; the receiving
//! half lives in a [`ListenerHandle`] owned by the client's stream
//! session. Dropping the handle removes the registration, so membership
//! can never outlive the connection.
//!
//! Broadcasting never waits. A listener whose queue is full or whose
//! receiver is gone is removed on the spot and the broadcast carries on
//! with the others.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// A formatted state line shared by every listener of one broadcast.
pub type Payload = Arc<str>;

/// Default per-listener queue depth.
pub const DEFAULT_LISTENER_CAPACITY: usize = 64;

/// Process-unique identifier of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// The raw numeric id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Outcome of a single [`SubscriberRegistry::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Listeners that accepted the payload.
    pub delivered: usize,
    /// Listeners removed because their queue was full or closed.
    pub dropped: usize,
}

/// The set of currently connected listeners.
#[derive(Debug)]
pub struct SubscriberRegistry {
    listeners: Mutex<HashMap<ListenerId, mpsc::Sender<Payload>>>,
    next_id: AtomicU64,
    capacity: usize,
    closed: AtomicBool,
}

impl SubscriberRegistry {
    /// Create an empty registry whose listeners buffer up to `capacity`
    /// payloads each. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Add a new listener and return the handle that receives its payloads.
    ///
    /// Never fails. Once [`close_all`](Self::close_all) has run, the
    /// returned handle is already closed and is not tracked.
    pub fn register(self: &Arc<Self>) -> ListenerHandle {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.capacity);

        let mut listeners = self.listeners.lock();
        if self.closed.load(Ordering::Acquire) {
            drop(tx);
            debug!(listener_id = %id, "registry closed, handing out a closed listener");
        } else {
            listeners.insert(id, tx);
            debug!(listener_id = %id, listeners = listeners.len(), "listener registered");
        }
        drop(listeners);

        ListenerHandle {
            id,
            rx,
            registry: Arc::downgrade(self),
        }
    }

    /// Remove a listener. Returns `false` if it was not registered, which
    /// is not an error.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let removed = listeners.remove(&id).is_some();
        if removed {
            debug!(listener_id = %id, listeners = listeners.len(), "listener unregistered");
        }
        removed
    }

    /// Queue `payload` on every registered listener without waiting.
    pub fn broadcast(&self, payload: &str) -> BroadcastReport {
        let payload: Payload = Arc::from(payload);
        let mut report = BroadcastReport::default();

        self.listeners
            .lock()
            .retain(|id, tx| match tx.try_send(Arc::clone(&payload)) {
                Ok(()) => {
                    report.delivered = report.delivered.saturating_add(1);
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!(listener_id = %id, "listener queue full, dropping listener");
                    report.dropped = report.dropped.saturating_add(1);
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(listener_id = %id, "listener already gone, dropping");
                    report.dropped = report.dropped.saturating_add(1);
                    false
                }
            });

        report
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Drop every listener and refuse new ones. Used on shutdown so that
    /// all open streams end.
    pub fn close_all(&self) {
        self.closed.store(true, Ordering::Release);
        let drained = std::mem::take(&mut *self.listeners.lock());
        info!(listeners = drained.len(), "closing all listeners");
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_LISTENER_CAPACITY)
    }
}

/// The receiving end of one listener, and its registration.
///
/// Dropping the handle (or calling [`close`](Self::close)) unregisters it.
#[derive(Debug)]
pub struct ListenerHandle {
    id: ListenerId,
    rx: mpsc::Receiver<Payload>,
    registry: Weak<SubscriberRegistry>,
}

impl ListenerHandle {
    /// This listener's id.
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Wait for the next payload. Returns `None` once the registry has
    /// dropped this listener and its queue is drained.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.rx.recv().await
    }

    /// Take a queued payload without waiting.
    pub fn try_recv(&mut self) -> Option<Payload> {
        self.rx.try_recv().ok()
    }

    /// Unregister now. Safe to call more than once.
    pub fn close(&mut self) {
        let registry = std::mem::take(&mut self.registry);
        if let Some(registry) = registry.upgrade() {
            registry.unregister(self.id);
        }
        self.rx.close();
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_delivers_exactly_one_copy() {
        let registry = Arc::new(SubscriberRegistry::default());
        let mut handle = registry.register();

        let report = registry.broadcast("5|x|time|1");
        assert_eq!(report, BroadcastReport { delivered: 1, dropped: 0 });

        assert_eq!(handle.try_recv().as_deref(), Some("5|x|time|1"));
        assert!(handle.try_recv().is_none());
    }

    #[test]
    fn unregistered_listener_gets_nothing() {
        let registry = Arc::new(SubscriberRegistry::default());
        let mut handle = registry.register();

        assert!(registry.unregister(handle.id()));
        let report = registry.broadcast("payload");

        assert_eq!(report.delivered, 0);
        assert!(handle.try_recv().is_none());
    }

    #[test]
    fn unregister_twice_is_a_no_op() {
        let registry = Arc::new(SubscriberRegistry::default());
        let mut handle = registry.register();
        let other = registry.register();

        assert!(registry.unregister(handle.id()));
        assert!(!registry.unregister(handle.id()));
        handle.close();
        handle.close();

        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(other.id()));
    }

    #[test]
    fn dropping_handle_unregisters() {
        let registry = Arc::new(SubscriberRegistry::default());
        let handle = registry.register();
        let _keep = registry.register();
        assert_eq!(registry.len(), 2);

        drop(handle);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let registry = Arc::new(SubscriberRegistry::default());
        let a = registry.register();
        let b = registry.register();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn full_listener_is_dropped_without_blocking_others() {
        let registry = Arc::new(SubscriberRegistry::new(1));
        let mut slow = registry.register();
        let mut fast = registry.register();

        assert_eq!(registry.broadcast("first").delivered, 2);
        assert_eq!(fast.try_recv().as_deref(), Some("first"));

        // `slow` never drained, so its single slot is still taken.
        let report = registry.broadcast("second");
        assert_eq!(report, BroadcastReport { delivered: 1, dropped: 1 });
        assert_eq!(fast.try_recv().as_deref(), Some("second"));
        assert_eq!(registry.len(), 1);

        // The dropped listener still sees what was queued, then nothing.
        assert_eq!(slow.try_recv().as_deref(), Some("first"));
        assert!(slow.try_recv().is_none());
    }

    #[test]
    fn closed_receiver_is_dropped_and_counted() {
        let registry = Arc::new(SubscriberRegistry::default());
        let mut gone = registry.register();
        let mut live = registry.register();

        // Receiver closed while the registration stays in place.
        gone.rx.close();
        assert_eq!(registry.len(), 2);

        let report = registry.broadcast("5|x|time|1");
        assert_eq!(report, BroadcastReport { delivered: 1, dropped: 1 });
        assert_eq!(registry.len(), 1);
        assert!(!registry.unregister(gone.id()));
        assert_eq!(live.try_recv().as_deref(), Some("5|x|time|1"));
    }

    #[tokio::test]
    async fn dropped_listener_channel_ends() {
        let registry = Arc::new(SubscriberRegistry::new(1));
        let mut handle = registry.register();
        registry.broadcast("a");
        registry.broadcast("b");

        assert_eq!(handle.recv().await.as_deref(), Some("a"));
        assert!(handle.recv().await.is_none());
    }

    #[tokio::test]
    async fn close_all_ends_streams_and_refuses_new_listeners() {
        let registry = Arc::new(SubscriberRegistry::default());
        let mut before = registry.register();

        registry.close_all();
        assert!(registry.is_empty());
        assert!(before.recv().await.is_none());

        let mut after = registry.register();
        assert!(registry.is_empty());
        assert!(after.recv().await.is_none());
    }

    #[test]
    fn handle_outliving_registry_closes_quietly() {
        let registry = Arc::new(SubscriberRegistry::default());
        let mut handle = registry.register();
        drop(registry);
        handle.close();
        assert!(handle.try_recv().is_none());
    }
}
