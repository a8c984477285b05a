//! Change reconciliation for the breakpoint registry
//!
//! This crate keeps the breakpoint store in step with an external marker
//! store:
//! - Change feed contract (tree-shaped resource change notifications)
//! - Delta reconciler (container open/close resync, marker add/remove/change)
//! - Deferred worker pool for work that must not run inside a notification
//! - In-memory workspace implementing the marker store and the change feed

pub mod deferred;
pub mod feed;
pub mod memory;
pub mod reconcile;

pub use deferred::DeferredQueue;
pub use feed::{ChangeEvent, ChangeFeed, ChangeListener, SubscriptionId};
pub use memory::MemoryWorkspace;
pub use reconcile::{ReconcileCounts, Reconciler};
