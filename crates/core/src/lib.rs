//! Breakpoint Core - registry primitives for debugger breakpoints
//!
//! This crate provides the in-memory side of breakpoint management:
//! - Marker handles and the marker store contract
//! - Resource and marker deltas
//! - Breakpoint trait and the generic attribute-backed breakpoint
//! - Listener registry with snapshot notification
//! - Marker type → breakpoint factory resolution
//! - The breakpoint store with its marker reverse index

pub mod breakpoint;
pub mod delta;
pub mod error;
pub mod event;
pub mod listener;
pub mod marker;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use breakpoint::{same_breakpoint, AttributeBreakpoint, Breakpoint, BreakpointHandle};
pub use delta::{DeltaFlags, DeltaKind, MarkerDelta, ResourceDelta};
pub use error::{BreakpointError, ErrorKind, MarkerError};
pub use event::BreakpointEvent;
pub use listener::{BreakpointListener, ListenerRegistry};
pub use marker::{AttributeValue, Marker, MarkerHandle, MarkerId, MarkerStore};
pub use resolver::{
    BreakpointFactory, CapabilityEntry, CapabilityTable, StaticCapabilityTable, TypeResolver,
};
pub use store::BreakpointStore;

/// Common result type used throughout breakpoints-core
pub type Result<T> = std::result::Result<T, BreakpointError>;
