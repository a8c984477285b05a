//! Error types for breakpoint registration and marker access

use crate::marker::MarkerId;
use std::path::PathBuf;

/// Failure reported by a marker store while accessing a marker
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkerError {
    /// The marker no longer exists in the store
    #[error("marker {0} does not exist")]
    NotFound(MarkerId),

    /// The resource owning the marker is closed or gone
    #[error("resource {} is not accessible", .0.display())]
    ResourceInaccessible(PathBuf),

    /// Any other backend failure
    #[error("marker store failure: {0}")]
    Backend(String),
}

/// Coarse classification of a [`BreakpointError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing factory for a marker type, or a breakpoint without model identifier
    ConfigurationInvalid,
    /// The marker store operation itself failed
    BackingAccessFailure,
    /// The operation conflicts with existing registry state
    Conflict,
}

/// Main error type for breakpoint management
#[derive(Debug, thiserror::Error)]
pub enum BreakpointError {
    /// No breakpoint factory is registered for the marker type
    #[error("missing breakpoint definition for marker type `{0}`")]
    MissingDefinition(String),

    /// The breakpoint reports no (or an empty) model identifier
    #[error("breakpoint on marker {0} is missing a model identifier")]
    MissingModelIdentifier(MarkerId),

    /// A different breakpoint is already registered for the marker
    #[error("marker {marker} is already bound to another breakpoint")]
    MarkerAlreadyBound { marker: MarkerId },

    /// The type resolver was populated a second time
    #[error("breakpoint type resolver has already been populated")]
    ResolverAlreadyPopulated,

    /// Marker store access failed
    #[error("marker access failed: {0}")]
    BackingAccess(#[from] MarkerError),
}

impl BreakpointError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingDefinition(_) | Self::MissingModelIdentifier(_) => {
                ErrorKind::ConfigurationInvalid
            }
            Self::BackingAccess(_) => ErrorKind::BackingAccessFailure,
            Self::MarkerAlreadyBound { .. } | Self::ResolverAlreadyPopulated => ErrorKind::Conflict,
        }
    }

    /// True for configuration problems (missing factory or model identifier)
    pub fn is_configuration_invalid(&self) -> bool {
        self.kind() == ErrorKind::ConfigurationInvalid
    }
}
