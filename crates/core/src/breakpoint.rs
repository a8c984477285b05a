//! Breakpoint abstraction
//!
//! Each debug model supplies its own breakpoint implementation. All of them
//! are backed by exactly one marker, which carries their persisted state.

use crate::error::MarkerError;
use crate::marker::{self, AttributeValue, MarkerHandle};
use std::fmt;
use std::sync::Arc;

/// A debugger breakpoint backed by a marker
pub trait Breakpoint: Send + Sync + fmt::Debug {
    /// The marker persisting this breakpoint
    fn marker(&self) -> &MarkerHandle;

    /// Identifier of the debug model owning this breakpoint
    ///
    /// `Ok(None)` means the breakpoint does not declare a model.
    fn model_identifier(&self) -> Result<Option<String>, MarkerError>;

    /// Whether the breakpoint is enabled
    fn is_enabled(&self) -> Result<bool, MarkerError> {
        Ok(self
            .marker()
            .attribute(marker::ENABLED)?
            .and_then(|value| value.as_bool())
            .unwrap_or(true))
    }

    /// Enable or disable the breakpoint
    fn set_enabled(&self, enabled: bool) -> Result<(), MarkerError> {
        self.marker()
            .set_attribute(marker::ENABLED, AttributeValue::Bool(enabled))
    }

    /// Delete the backing marker
    fn delete(&self) -> Result<(), MarkerError> {
        self.marker().delete()
    }
}

/// Shared breakpoint handle
pub type BreakpointHandle = Arc<dyn Breakpoint>;

/// Breakpoint identity: two handles are the same breakpoint when they point
/// at the same allocation
pub fn same_breakpoint(a: &BreakpointHandle, b: &BreakpointHandle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Generic breakpoint whose whole state lives in marker attributes
///
/// The model identifier is either fixed at construction or read from the
/// `modelIdentifier` attribute of the marker.
#[derive(Debug)]
pub struct AttributeBreakpoint {
    marker: MarkerHandle,
    model: Option<String>,
}

impl AttributeBreakpoint {
    /// Breakpoint reading its model identifier from the marker
    pub fn new(marker: MarkerHandle) -> Self {
        Self { marker, model: None }
    }

    /// Breakpoint with a fixed model identifier
    pub fn with_model(marker: MarkerHandle, model: impl Into<String>) -> Self {
        Self {
            marker,
            model: Some(model.into()),
        }
    }

    /// Line number, for markers that carry one
    pub fn line_number(&self) -> Result<Option<i64>, MarkerError> {
        Ok(self
            .marker
            .attribute(marker::LINE_NUMBER)?
            .and_then(|value| value.as_int()))
    }
}

impl Breakpoint for AttributeBreakpoint {
    fn marker(&self) -> &MarkerHandle {
        &self.marker
    }

    fn model_identifier(&self) -> Result<Option<String>, MarkerError> {
        if let Some(model) = &self.model {
            return Ok(Some(model.clone()));
        }
        Ok(self
            .marker
            .attribute(marker::MODEL_IDENTIFIER)?
            .and_then(|value| value.as_str().map(str::to_string)))
    }
}
