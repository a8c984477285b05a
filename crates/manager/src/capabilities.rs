//! Breakpoint kinds declared in configuration

use crate::config::{BreakpointTypeConfig, ManagerConfig};
use bp_core::{
    AttributeBreakpoint, BreakpointError, BreakpointFactory, BreakpointHandle, CapabilityEntry,
    CapabilityTable, MarkerHandle,
};
use std::sync::Arc;

/// Capability table built from `[[breakpoint_types]]`
///
/// Every declared kind is served by [`AttributeBreakpoint`].
#[derive(Debug, Clone, Default)]
pub struct ConfiguredCapabilities {
    types: Vec<BreakpointTypeConfig>,
}

impl ConfiguredCapabilities {
    pub fn from_config(config: &ManagerConfig) -> Self {
        Self {
            types: config.breakpoint_types.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl CapabilityTable for ConfiguredCapabilities {
    fn entries(&self) -> Vec<CapabilityEntry> {
        self.types
            .iter()
            .map(|declared| {
                let model = declared.model.clone();
                let factory: Arc<dyn BreakpointFactory> = Arc::new(
                    move |marker: MarkerHandle| -> Result<BreakpointHandle, BreakpointError> {
                        let breakpoint = match &model {
                            Some(model) => AttributeBreakpoint::with_model(marker, model.clone()),
                            None => AttributeBreakpoint::new(marker),
                        };
                        Ok(Arc::new(breakpoint))
                    },
                );
                CapabilityEntry::new(declared.marker_type.clone(), factory)
            })
            .collect()
    }
}
