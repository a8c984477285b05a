//! Marker type → breakpoint factory resolution
//!
//! The resolver is filled once at startup from one or more capability
//! tables and is read-only afterwards.

use crate::breakpoint::BreakpointHandle;
use crate::error::BreakpointError;
use crate::marker::MarkerHandle;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Creates the breakpoint implementation for a marker
pub trait BreakpointFactory: Send + Sync {
    fn create(&self, marker: MarkerHandle) -> Result<BreakpointHandle, BreakpointError>;
}

impl<F> BreakpointFactory for F
where
    F: Fn(MarkerHandle) -> Result<BreakpointHandle, BreakpointError> + Send + Sync,
{
    fn create(&self, marker: MarkerHandle) -> Result<BreakpointHandle, BreakpointError> {
        self(marker)
    }
}

/// One declared breakpoint kind
#[derive(Clone)]
pub struct CapabilityEntry {
    pub marker_type: String,
    pub factory: Arc<dyn BreakpointFactory>,
}

impl CapabilityEntry {
    pub fn new(marker_type: impl Into<String>, factory: Arc<dyn BreakpointFactory>) -> Self {
        Self {
            marker_type: marker_type.into(),
            factory,
        }
    }
}

impl std::fmt::Debug for CapabilityEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityEntry")
            .field("marker_type", &self.marker_type)
            .finish_non_exhaustive()
    }
}

/// Source of breakpoint kinds enumerated at startup
pub trait CapabilityTable: Send + Sync {
    fn entries(&self) -> Vec<CapabilityEntry>;
}

/// Capability table assembled in code
#[derive(Default, Clone, Debug)]
pub struct StaticCapabilityTable {
    entries: Vec<CapabilityEntry>,
}

impl StaticCapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a breakpoint kind
    pub fn with(mut self, marker_type: impl Into<String>, factory: Arc<dyn BreakpointFactory>) -> Self {
        self.entries.push(CapabilityEntry::new(marker_type, factory));
        self
    }
}

impl CapabilityTable for StaticCapabilityTable {
    fn entries(&self) -> Vec<CapabilityEntry> {
        self.entries.clone()
    }
}

/// Maps marker types to breakpoint factories
#[derive(Default)]
pub struct TypeResolver {
    factories: DashMap<String, Arc<dyn BreakpointFactory>>,
    populated: AtomicBool,
}

impl TypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the resolver from `tables`, in order
    ///
    /// Can only succeed once. When several entries declare the same marker
    /// type, the first one wins.
    pub fn populate(&self, tables: &[&dyn CapabilityTable]) -> Result<usize, BreakpointError> {
        if self.populated.swap(true, Ordering::SeqCst) {
            return Err(BreakpointError::ResolverAlreadyPopulated);
        }

        for table in tables {
            for entry in table.entries() {
                if self.factories.contains_key(&entry.marker_type) {
                    warn!(
                        marker_type = %entry.marker_type,
                        "Ignoring duplicate breakpoint definition"
                    );
                    continue;
                }
                self.factories.insert(entry.marker_type, entry.factory);
            }
        }

        debug!(kinds = self.factories.len(), "Breakpoint types registered");
        Ok(self.factories.len())
    }

    /// Factory for `marker_type`
    pub fn resolve(&self, marker_type: &str) -> Result<Arc<dyn BreakpointFactory>, BreakpointError> {
        self.factories
            .get(marker_type)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BreakpointError::MissingDefinition(marker_type.to_string()))
    }

    /// Instantiate the breakpoint for `marker` through its type's factory
    pub fn instantiate(&self, marker: MarkerHandle) -> Result<BreakpointHandle, BreakpointError> {
        let factory = self.resolve(marker.marker_type())?;
        factory.create(marker)
    }

    pub fn is_populated(&self) -> bool {
        self.populated.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
