//! Breakpoint notifications

use crate::breakpoint::BreakpointHandle;
use crate::delta::MarkerDelta;

/// Notification delivered to breakpoint listeners
#[derive(Debug, Clone)]
pub enum BreakpointEvent {
    /// A breakpoint was registered
    Added(BreakpointHandle),
    /// A breakpoint was unregistered
    Removed {
        breakpoint: BreakpointHandle,
        delta: Option<MarkerDelta>,
    },
    /// The marker of a registered breakpoint changed
    Changed {
        breakpoint: BreakpointHandle,
        delta: Option<MarkerDelta>,
    },
}

impl BreakpointEvent {
    /// Breakpoint the event is about
    pub fn breakpoint(&self) -> &BreakpointHandle {
        match self {
            Self::Added(breakpoint)
            | Self::Removed { breakpoint, .. }
            | Self::Changed { breakpoint, .. } => breakpoint,
        }
    }

    /// Marker delta that caused the event, if any
    pub fn delta(&self) -> Option<&MarkerDelta> {
        match self {
            Self::Added(_) => None,
            Self::Removed { delta, .. } | Self::Changed { delta, .. } => delta.as_ref(),
        }
    }

    /// Short name for logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::Removed { .. } => "removed",
            Self::Changed { .. } => "changed",
        }
    }
}
