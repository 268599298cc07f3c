//! In-process fan-out of decoded diagnostic batches.
//!
//! Delivery semantics are deliberately narrow: [`DiagnosticBus::publish`]
//! synchronously notifies every currently registered listener in
//! registration order with the full batch. Nothing is queued or merged at
//! this layer — a batch published while nobody is subscribed is simply
//! dropped, and a fresh subscriber only sees batches published after it
//! subscribed.
//!
//! Publish runs on the process reader task, so a slow listener throttles
//! delivery to every listener of that project. That backpressure is
//! intentional; listeners that need to do real work hand the batch to their
//! own [`crate::UpdateScheduler`] and return.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::types::Batch;

pub type Listener = dyn Fn(&Batch) + Send + Sync;

type Registry = Mutex<Vec<(u64, Arc<Listener>)>>;

#[derive(Default)]
pub struct DiagnosticBus {
    registry: Arc<Registry>,
    next_id: AtomicU64,
}

impl DiagnosticBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it stays registered until the returned
    /// [`Subscription`] is dropped.
    #[must_use]
    pub fn subscribe(&self, listener: impl Fn(&Batch) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Synchronously deliver `batch` to every listener, in registration
    /// order.
    ///
    /// The listener list is snapshotted before the calls, so a listener may
    /// subscribe or unsubscribe reentrantly without deadlocking; such
    /// changes take effect from the next publish.
    pub fn publish(&self, batch: &Batch) {
        let listeners: Vec<Arc<Listener>> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        if listeners.is_empty() {
            tracing::trace!(
                base_dir = %batch.base_dir().display(),
                "dropping batch with no subscribers"
            );
            return;
        }
        for listener in listeners {
            listener(batch);
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle binding a listener to the bus; dropping it unsubscribes.
///
/// The subscriber owns the lifetime — typically the subscription is stored
/// next to the consumer and dies with it.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Explicit form of dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}
