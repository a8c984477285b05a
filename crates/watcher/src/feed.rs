//! Change feed contract
//!
//! The resource system delivers one [`ChangeEvent`] per completed change,
//! on whatever thread performed it.

use bp_core::ResourceDelta;
use std::fmt;
use std::sync::Arc;

/// A resource change notification
#[derive(Debug, Clone, Default)]
pub struct ChangeEvent {
    delta: Option<ResourceDelta>,
}

impl ChangeEvent {
    pub fn new(delta: ResourceDelta) -> Self {
        Self { delta: Some(delta) }
    }

    /// Notification without a delta tree
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn delta(&self) -> Option<&ResourceDelta> {
        self.delta.as_ref()
    }
}

/// Receives change notifications
pub trait ChangeListener: Send + Sync {
    fn resource_changed(&self, event: &ChangeEvent);
}

/// Handle returned by [`ChangeFeed::subscribe`]
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

/// Subscription side of the resource system
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, listener: Arc<dyn ChangeListener>) -> SubscriptionId;

    /// Returns whether the subscription existed
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
