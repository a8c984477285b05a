//! Marker handles and the marker store contract
//!
//! Markers are owned by an external resource system. The registry only
//! keeps handles to them: as lookup keys and to delegate attribute reads
//! and deletion.

use crate::error::MarkerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Attribute holding the debug model that owns a breakpoint
pub const MODEL_IDENTIFIER: &str = "modelIdentifier";

/// Attribute holding the enabled state of a breakpoint
pub const ENABLED: &str = "enabled";

/// Attribute holding the line number of a line breakpoint
pub const LINE_NUMBER: &str = "lineNumber";

/// Identity of a marker, assigned by the marker store
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MarkerId(u64);

impl MarkerId {
    /// Create a marker id from its raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value of this id
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkerId({})", self.0)
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value of a marker attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl AttributeValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Handle to a persisted marker
///
/// Implementations belong to the marker store. Two handles with the same
/// [`MarkerId`] refer to the same marker.
pub trait Marker: Send + Sync + fmt::Debug {
    /// Identity of the marker
    fn id(&self) -> MarkerId;

    /// Type tag, e.g. `debug.lineBreakpoint`
    fn marker_type(&self) -> &str;

    /// Path of the resource the marker is attached to
    fn resource(&self) -> &Path;

    /// Whether the marker still exists in the store
    fn exists(&self) -> bool;

    /// Read an attribute
    fn attribute(&self, name: &str) -> Result<Option<AttributeValue>, MarkerError>;

    /// Write an attribute
    fn set_attribute(&self, name: &str, value: AttributeValue) -> Result<(), MarkerError>;

    /// Delete the marker from the store
    fn delete(&self) -> Result<(), MarkerError>;
}

/// Shared marker handle
pub type MarkerHandle = Arc<dyn Marker>;

/// Query side of the external marker store
pub trait MarkerStore: Send + Sync {
    /// Find markers of `marker_type` on `scope` and everything below it
    fn find_markers(
        &self,
        marker_type: &str,
        include_subtypes: bool,
        scope: &Path,
    ) -> Result<Vec<MarkerHandle>, MarkerError>;

    /// Whether `marker_type` is `super_type` or declares it as a supertype
    fn is_subtype(&self, marker_type: &str, super_type: &str) -> bool;

    /// Whether the resource at `path` exists and is open
    fn is_accessible(&self, path: &Path) -> bool;
}
