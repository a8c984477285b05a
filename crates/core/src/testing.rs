//! Test doubles shared by the unit tests of this crate

use crate::breakpoint::{AttributeBreakpoint, BreakpointHandle};
use crate::error::MarkerError;
use crate::marker::{self, AttributeValue, Marker, MarkerHandle, MarkerId};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Standalone marker keeping its attributes in memory
#[derive(Debug)]
pub struct TestMarker {
    id: MarkerId,
    marker_type: String,
    resource: PathBuf,
    attributes: Mutex<BTreeMap<String, AttributeValue>>,
    exists: AtomicBool,
    deletes: AtomicUsize,
    fail_delete: AtomicBool,
}

impl TestMarker {
    pub fn new(id: u64, marker_type: &str, resource: &str) -> Arc<Self> {
        Arc::new(Self {
            id: MarkerId::new(id),
            marker_type: marker_type.to_string(),
            resource: PathBuf::from(resource),
            attributes: Mutex::new(BTreeMap::new()),
            exists: AtomicBool::new(true),
            deletes: AtomicUsize::new(0),
            fail_delete: AtomicBool::new(false),
        })
    }

    pub fn handle(id: u64, marker_type: &str, resource: &str) -> MarkerHandle {
        Self::new(id, marker_type, resource)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn fail_deletes(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }
}

impl Marker for TestMarker {
    fn id(&self) -> MarkerId {
        self.id
    }

    fn marker_type(&self) -> &str {
        &self.marker_type
    }

    fn resource(&self) -> &Path {
        &self.resource
    }

    fn exists(&self) -> bool {
        self.exists.load(Ordering::SeqCst)
    }

    fn attribute(&self, name: &str) -> Result<Option<AttributeValue>, MarkerError> {
        if !self.exists() {
            return Err(MarkerError::NotFound(self.id));
        }
        Ok(self.attributes.lock().get(name).cloned())
    }

    fn set_attribute(&self, name: &str, value: AttributeValue) -> Result<(), MarkerError> {
        if !self.exists() {
            return Err(MarkerError::NotFound(self.id));
        }
        self.attributes.lock().insert(name.to_string(), value);
        Ok(())
    }

    fn delete(&self) -> Result<(), MarkerError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(MarkerError::Backend("delete refused".into()));
        }
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.exists.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Attribute breakpoint on a fresh test marker, owned by `model`
pub fn breakpoint(id: u64, model: &str, resource: &str) -> BreakpointHandle {
    let marker = TestMarker::handle(id, "debug.lineBreakpoint", resource);
    marker
        .set_attribute(marker::MODEL_IDENTIFIER, model.into())
        .expect("fresh marker accepts attributes");
    Arc::new(AttributeBreakpoint::new(marker))
}
