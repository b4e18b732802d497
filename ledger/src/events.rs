//! Post-commit event delivery.
//!
//! Nothing in the maintenance pass may block or call out; virtual-operation
//! notifications raised mid-pass are queued and only handed to listeners
//! after the pass has committed. Listeners run inline on the emitting
//! thread; keep handlers fast.

use crate::ops::VirtualOperation;
use tracing::debug;

type Listener = Box<dyn Fn(&VirtualOperation) + Send + Sync>;

/// Synchronous fan-out bus for maintenance events with deferred delivery.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    queued: Vec<VirtualOperation>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Queue an event for delivery after the current pass commits.
    pub fn queue(&mut self, op: VirtualOperation) {
        self.queued.push(op);
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Drop all queued events without delivering them. Used when a pass
    /// aborts so a failed pass cannot leak notifications into the next one.
    pub fn discard_queued(&mut self) {
        self.queued.clear();
    }

    /// Deliver every queued event, in queue order. Called once after the
    /// maintenance pass has committed; delivery is fire-and-forget and has
    /// no ordering dependency back into the next pass.
    pub fn flush(&mut self) {
        if self.queued.is_empty() {
            return;
        }
        debug!(count = self.queued.len(), "delivering deferred maintenance events");
        for op in self.queued.drain(..) {
            for listener in &self.listeners {
                listener(&op);
            }
        }
    }
}
