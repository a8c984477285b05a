//! Listener registry with snapshot notification
//!
//! Subscribers are kept in subscription order. Every notification pass works
//! on a snapshot taken when the pass starts, so listeners added or removed by
//! a callback only affect later passes.

use crate::event::BreakpointEvent;
use parking_lot::RwLock;
use std::sync::Arc;

/// Receives breakpoint notifications
pub trait BreakpointListener: Send + Sync {
    fn breakpoint_event(&self, event: &BreakpointEvent);
}

impl<F> BreakpointListener for F
where
    F: Fn(&BreakpointEvent) + Send + Sync,
{
    fn breakpoint_event(&self, event: &BreakpointEvent) {
        self(event)
    }
}

/// Ordered collection of listeners, deduplicated by identity
pub struct ListenerRegistry {
    listeners: RwLock<Arc<[Arc<dyn BreakpointListener>]>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Add a listener; subscribing the same listener twice has no effect
    pub fn subscribe(&self, listener: Arc<dyn BreakpointListener>) {
        let mut listeners = self.listeners.write();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return;
        }
        let mut next = listeners.to_vec();
        next.push(listener);
        *listeners = Arc::from(next);
    }

    /// Remove a listener; unknown listeners are ignored
    pub fn unsubscribe(&self, listener: &Arc<dyn BreakpointListener>) {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|l| same_listener(l, listener)) {
            return;
        }
        let next: Vec<_> = listeners
            .iter()
            .filter(|l| !same_listener(l, listener))
            .cloned()
            .collect();
        *listeners = Arc::from(next);
    }

    /// Current subscribers, in subscription order
    pub fn snapshot(&self) -> Arc<[Arc<dyn BreakpointListener>]> {
        self.listeners.read().clone()
    }

    /// Deliver `event` once to every listener subscribed when the call starts
    pub fn notify(&self, event: &BreakpointEvent) {
        let snapshot = self.snapshot();
        tracing::trace!(
            event = event.label(),
            listeners = snapshot.len(),
            "Notifying breakpoint listeners"
        );
        for listener in snapshot.iter() {
            listener.breakpoint_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn same_listener(a: &Arc<dyn BreakpointListener>, b: &Arc<dyn BreakpointListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
