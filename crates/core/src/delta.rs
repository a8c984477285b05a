//! Resource change deltas
//!
//! A change notification carries a tree of [`ResourceDelta`] nodes, one per
//! affected resource. Each node may carry marker-level deltas.

use crate::marker::{AttributeValue, MarkerHandle, MarkerId};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Kind of change for a resource or a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Added,
    Removed,
    Changed,
}

/// Extra detail about a resource change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaFlags {
    /// The open/closed state of the resource changed
    pub open: bool,
    /// The resource was moved here from this path
    pub moved_from: Option<PathBuf>,
    /// The resource was moved away to this path
    pub moved_to: Option<PathBuf>,
}

/// Change to a single marker
#[derive(Debug, Clone)]
pub struct MarkerDelta {
    kind: DeltaKind,
    marker: MarkerHandle,
    /// Attributes before the change (for changed and removed markers)
    old_attributes: Option<BTreeMap<String, AttributeValue>>,
}

impl MarkerDelta {
    pub fn added(marker: MarkerHandle) -> Self {
        Self {
            kind: DeltaKind::Added,
            marker,
            old_attributes: None,
        }
    }

    pub fn removed(marker: MarkerHandle, old_attributes: BTreeMap<String, AttributeValue>) -> Self {
        Self {
            kind: DeltaKind::Removed,
            marker,
            old_attributes: Some(old_attributes),
        }
    }

    pub fn changed(marker: MarkerHandle, old_attributes: BTreeMap<String, AttributeValue>) -> Self {
        Self {
            kind: DeltaKind::Changed,
            marker,
            old_attributes: Some(old_attributes),
        }
    }

    pub fn kind(&self) -> DeltaKind {
        self.kind
    }

    pub fn marker(&self) -> &MarkerHandle {
        &self.marker
    }

    pub fn id(&self) -> MarkerId {
        self.marker.id()
    }

    pub fn marker_type(&self) -> &str {
        self.marker.marker_type()
    }

    /// Attribute value before the change, if a snapshot was recorded
    pub fn old_attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.old_attributes.as_ref()?.get(name)
    }
}

/// Change to one resource, with its marker changes and changed children
#[derive(Debug, Clone)]
pub struct ResourceDelta {
    resource: PathBuf,
    kind: DeltaKind,
    flags: DeltaFlags,
    marker_deltas: SmallVec<[MarkerDelta; 2]>,
    children: Vec<ResourceDelta>,
}

impl ResourceDelta {
    /// Create a delta node for `resource`
    pub fn new(resource: impl Into<PathBuf>, kind: DeltaKind) -> Self {
        Self {
            resource: resource.into(),
            kind,
            flags: DeltaFlags::default(),
            marker_deltas: SmallVec::new(),
            children: Vec::new(),
        }
    }

    pub fn changed(resource: impl Into<PathBuf>) -> Self {
        Self::new(resource, DeltaKind::Changed)
    }

    pub fn added(resource: impl Into<PathBuf>) -> Self {
        Self::new(resource, DeltaKind::Added)
    }

    pub fn removed(resource: impl Into<PathBuf>) -> Self {
        Self::new(resource, DeltaKind::Removed)
    }

    /// Mark the open/closed state of this resource as changed
    pub fn with_open_state_changed(mut self) -> Self {
        self.flags.open = true;
        self
    }

    pub fn with_moved_from(mut self, from: impl Into<PathBuf>) -> Self {
        self.flags.moved_from = Some(from.into());
        self
    }

    pub fn with_moved_to(mut self, to: impl Into<PathBuf>) -> Self {
        self.flags.moved_to = Some(to.into());
        self
    }

    pub fn with_marker_delta(mut self, delta: MarkerDelta) -> Self {
        self.marker_deltas.push(delta);
        self
    }

    pub fn with_child(mut self, child: ResourceDelta) -> Self {
        self.children.push(child);
        self
    }

    pub fn push_child(&mut self, child: ResourceDelta) {
        self.children.push(child);
    }

    pub fn resource(&self) -> &Path {
        &self.resource
    }

    pub fn kind(&self) -> DeltaKind {
        self.kind
    }

    pub fn flags(&self) -> &DeltaFlags {
        &self.flags
    }

    pub fn marker_deltas(&self) -> &[MarkerDelta] {
        &self.marker_deltas
    }

    pub fn children(&self) -> &[ResourceDelta] {
        &self.children
    }

    /// Visit this node and its descendants in pre-order
    ///
    /// The visitor returns `true` to descend into the children of the
    /// node it was just given.
    pub fn accept<F>(&self, visitor: &mut F)
    where
        F: FnMut(&ResourceDelta) -> bool,
    {
        if visitor(self) {
            for child in &self.children {
                child.accept(visitor);
            }
        }
    }

    /// Number of nodes in this tree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ResourceDelta::node_count).sum::<usize>()
    }
}
