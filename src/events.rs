//! Subscriber registries for tick and error notifications
//!
//! Each scheduler owns two channels: tick notifications (no payload) and
//! error notifications (carrying the captured failure). Subscribers are
//! invoked independently, in registration order.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;

/// Boxed future returned by a tick callback
pub type BoxTickFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// A tick callback: invoked on every tick, may fail
pub type TickCallback = Arc<dyn Fn() -> BoxTickFuture + Send + Sync>;

/// An error callback: receives the failure captured from a tick callback
pub type ErrorCallback = Arc<dyn Fn(&anyhow::Error) + Send + Sync>;

/// Handle identifying a single subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered registry of subscriber callbacks.
///
/// Snapshots are taken before invocation so callbacks never run while the
/// registry lock is held; a subscription change during a tick cycle takes
/// effect from the next cycle.
pub struct CallbackRegistry<T> {
    entries: Mutex<Vec<(SubscriptionId, T)>>,
    next_id: AtomicU64,
}

impl<T: Clone> CallbackRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a callback; later callbacks are invoked after earlier ones
    pub fn subscribe(&self, callback: T) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut entries = self.entries.lock().unwrap();
        entries.push((id, callback));
        id
    }

    /// Remove a subscription; returns false if the id was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Clone the current callbacks in registration order
    pub fn snapshot(&self) -> Vec<T> {
        let entries = self.entries.lock().unwrap();
        entries.iter().map(|(_, cb)| cb.clone()).collect()
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl<T: Clone> Default for CallbackRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
