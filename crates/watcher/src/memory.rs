//! In-memory workspace
//!
//! A self-contained resource system: containers that can be opened and
//! closed, markers with a type hierarchy, and a change feed that broadcasts
//! a delta tree after every mutation. Listeners are always called without
//! any workspace lock held.

use crate::feed::{ChangeEvent, ChangeFeed, ChangeListener, SubscriptionId};
use ahash::AHashMap;
use bp_core::{
    AttributeValue, Marker, MarkerDelta, MarkerError, MarkerHandle, MarkerId, MarkerStore,
    ResourceDelta,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

struct MarkerRecord {
    marker_type: String,
    resource: PathBuf,
    attributes: BTreeMap<String, AttributeValue>,
}

#[derive(Default)]
struct WorkspaceState {
    /// container path -> open
    containers: AHashMap<PathBuf, bool>,
    markers: BTreeMap<MarkerId, MarkerRecord>,
    /// marker type -> declared supertypes
    supertypes: AHashMap<String, Vec<String>>,
    next_marker: u64,
}

impl WorkspaceState {
    fn is_accessible(&self, path: &Path) -> bool {
        self.containers
            .iter()
            .all(|(container, open)| *open || !path.starts_with(container))
    }

    fn is_subtype(&self, marker_type: &str, super_type: &str) -> bool {
        let mut seen = HashSet::new();
        let mut queue = vec![marker_type];
        while let Some(current) = queue.pop() {
            if current == super_type {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(parents) = self.supertypes.get(current) {
                queue.extend(parents.iter().map(String::as_str));
            }
        }
        false
    }

    fn record(&self, id: MarkerId) -> Result<&MarkerRecord, MarkerError> {
        let record = self.markers.get(&id).ok_or(MarkerError::NotFound(id))?;
        if !self.is_accessible(&record.resource) {
            return Err(MarkerError::ResourceInaccessible(record.resource.clone()));
        }
        Ok(record)
    }
}

/// In-memory marker store and change feed
pub struct MemoryWorkspace {
    state: Mutex<WorkspaceState>,
    listeners: RwLock<Vec<(SubscriptionId, Arc<dyn ChangeListener>)>>,
    next_subscription: AtomicU64,
    deletes: AtomicUsize,
    this: Weak<MemoryWorkspace>,
}

impl MemoryWorkspace {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            state: Mutex::new(WorkspaceState {
                next_marker: 1,
                ..WorkspaceState::default()
            }),
            listeners: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            deletes: AtomicUsize::new(0),
            this: this.clone(),
        })
    }

    /// Declare a marker type and its direct supertypes
    pub fn define_marker_type(&self, marker_type: &str, supertypes: &[&str]) {
        self.state.lock().supertypes.insert(
            marker_type.to_string(),
            supertypes.iter().map(|s| s.to_string()).collect(),
        );
    }

    /// Register an open container
    pub fn add_container(&self, path: impl Into<PathBuf>) {
        self.state.lock().containers.insert(path.into(), true);
    }

    /// Open or close a container and broadcast the open-state change
    ///
    /// Setting the state a container already has broadcasts nothing.
    pub fn set_open(&self, path: impl Into<PathBuf>, open: bool) {
        let path = path.into();
        {
            let mut state = self.state.lock();
            let previous = state.containers.insert(path.clone(), open);
            if previous == Some(open) {
                return;
            }
        }
        debug!(container = %path.display(), open, "Container open state changed");
        self.broadcast(ChangeEvent::new(wrap_in_ancestors(
            ResourceDelta::changed(path).with_open_state_changed(),
        )));
    }

    /// Create a marker on `resource` and broadcast its addition
    pub fn create_marker<I, K>(
        &self,
        resource: impl Into<PathBuf>,
        marker_type: &str,
        attributes: I,
    ) -> Result<MarkerHandle, MarkerError>
    where
        I: IntoIterator<Item = (K, AttributeValue)>,
        K: Into<String>,
    {
        let resource = resource.into();
        let handle = {
            let mut state = self.state.lock();
            if !state.is_accessible(&resource) {
                return Err(MarkerError::ResourceInaccessible(resource));
            }
            let id = MarkerId::new(state.next_marker);
            state.next_marker += 1;
            state.markers.insert(
                id,
                MarkerRecord {
                    marker_type: marker_type.to_string(),
                    resource: resource.clone(),
                    attributes: attributes
                        .into_iter()
                        .map(|(name, value)| (name.into(), value))
                        .collect(),
                },
            );
            self.handle(id, marker_type, &resource)
        };

        self.broadcast(ChangeEvent::new(wrap_in_ancestors(
            ResourceDelta::changed(resource).with_marker_delta(MarkerDelta::added(handle.clone())),
        )));
        Ok(handle)
    }

    /// Move `from` (and everything below it) to `to`
    ///
    /// Markers keep their identity. The broadcast tree reports `from` as
    /// removed and `to` as added with a moved-from flag, carrying an added
    /// marker delta for every moved marker.
    pub fn move_resource(&self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) {
        let from = from.into();
        let to = to.into();

        let moved = {
            let mut state = self.state.lock();

            let containers: Vec<(PathBuf, bool)> = state
                .containers
                .iter()
                .filter(|(path, _)| path.starts_with(&from))
                .map(|(path, open)| (path.clone(), *open))
                .collect();
            for (path, open) in containers {
                state.containers.remove(&path);
                state.containers.insert(rebase(&path, &from, &to), open);
            }

            let mut moved = Vec::new();
            for (id, record) in state.markers.iter_mut() {
                if record.resource.starts_with(&from) {
                    record.resource = rebase(&record.resource, &from, &to);
                    moved.push((*id, record.marker_type.clone(), record.resource.clone()));
                }
            }
            moved
        };

        let mut added = ResourceDelta::added(to.clone()).with_moved_from(from.clone());
        for (id, marker_type, resource) in moved {
            added = added.with_marker_delta(MarkerDelta::added(self.handle(id, &marker_type, &resource)));
        }

        debug!(from = %from.display(), to = %to.display(), "Resource moved");
        self.broadcast(ChangeEvent::new(
            ResourceDelta::changed("/")
                .with_child(ResourceDelta::removed(from).with_moved_to(to))
                .with_child(added),
        ));
    }

    /// Deliver `event` to every subscriber, in subscription order
    pub fn broadcast(&self, event: ChangeEvent) {
        let listeners: Vec<Arc<dyn ChangeListener>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener.resource_changed(&event);
        }
    }

    /// Handle to an existing marker
    pub fn marker(&self, id: MarkerId) -> Option<MarkerHandle> {
        let state = self.state.lock();
        let record = state.markers.get(&id)?;
        Some(self.handle(id, &record.marker_type, &record.resource))
    }

    pub fn marker_count(&self) -> usize {
        self.state.lock().markers.len()
    }

    /// Number of markers deleted through their handles
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn handle(&self, id: MarkerId, marker_type: &str, resource: &Path) -> MarkerHandle {
        Arc::new(MemoryMarker {
            id,
            marker_type: marker_type.to_string(),
            resource: resource.to_path_buf(),
            workspace: self.this.clone(),
        })
    }

    fn attribute(&self, id: MarkerId, name: &str) -> Result<Option<AttributeValue>, MarkerError> {
        let state = self.state.lock();
        Ok(state.record(id)?.attributes.get(name).cloned())
    }

    fn set_attribute(&self, id: MarkerId, name: &str, value: AttributeValue) -> Result<(), MarkerError> {
        let delta = {
            let mut state = self.state.lock();
            state.record(id)?;
            let Some(record) = state.markers.get_mut(&id) else {
                return Err(MarkerError::NotFound(id));
            };
            let old = record.attributes.clone();
            if old.get(name) == Some(&value) {
                return Ok(());
            }
            record.attributes.insert(name.to_string(), value);
            let handle = self.handle(id, &record.marker_type, &record.resource);
            ResourceDelta::changed(record.resource.clone())
                .with_marker_delta(MarkerDelta::changed(handle, old))
        };

        self.broadcast(ChangeEvent::new(wrap_in_ancestors(delta)));
        Ok(())
    }

    fn delete_marker(&self, id: MarkerId) -> Result<(), MarkerError> {
        let delta = {
            let mut state = self.state.lock();
            state.record(id)?;
            let Some(record) = state.markers.remove(&id) else {
                return Err(MarkerError::NotFound(id));
            };
            let handle = self.handle(id, &record.marker_type, &record.resource);
            ResourceDelta::changed(record.resource)
                .with_marker_delta(MarkerDelta::removed(handle, record.attributes))
        };
        self.deletes.fetch_add(1, Ordering::SeqCst);

        self.broadcast(ChangeEvent::new(wrap_in_ancestors(delta)));
        Ok(())
    }

    fn exists(&self, id: MarkerId) -> bool {
        self.state.lock().markers.contains_key(&id)
    }
}

impl MarkerStore for MemoryWorkspace {
    fn find_markers(
        &self,
        marker_type: &str,
        include_subtypes: bool,
        scope: &Path,
    ) -> Result<Vec<MarkerHandle>, MarkerError> {
        let state = self.state.lock();
        if !state.is_accessible(scope) {
            return Err(MarkerError::ResourceInaccessible(scope.to_path_buf()));
        }

        Ok(state
            .markers
            .iter()
            .filter(|(_, record)| record.resource.starts_with(scope))
            .filter(|(_, record)| state.is_accessible(&record.resource))
            .filter(|(_, record)| {
                record.marker_type == marker_type
                    || (include_subtypes && state.is_subtype(&record.marker_type, marker_type))
            })
            .map(|(id, record)| self.handle(*id, &record.marker_type, &record.resource))
            .collect())
    }

    fn is_subtype(&self, marker_type: &str, super_type: &str) -> bool {
        self.state.lock().is_subtype(marker_type, super_type)
    }

    fn is_accessible(&self, path: &Path) -> bool {
        self.state.lock().is_accessible(path)
    }
}

impl ChangeFeed for MemoryWorkspace {
    fn subscribe(&self, listener: Arc<dyn ChangeListener>) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

/// Marker handle backed by a [`MemoryWorkspace`]
struct MemoryMarker {
    id: MarkerId,
    marker_type: String,
    resource: PathBuf,
    workspace: Weak<MemoryWorkspace>,
}

impl MemoryMarker {
    fn workspace(&self) -> Result<Arc<MemoryWorkspace>, MarkerError> {
        self.workspace
            .upgrade()
            .ok_or_else(|| MarkerError::Backend("workspace dropped".into()))
    }
}

impl std::fmt::Debug for MemoryMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMarker")
            .field("id", &self.id)
            .field("marker_type", &self.marker_type)
            .field("resource", &self.resource)
            .finish()
    }
}

impl Marker for MemoryMarker {
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
        self.workspace
            .upgrade()
            .is_some_and(|workspace| workspace.exists(self.id))
    }

    fn attribute(&self, name: &str) -> Result<Option<AttributeValue>, MarkerError> {
        self.workspace()?.attribute(self.id, name)
    }

    fn set_attribute(&self, name: &str, value: AttributeValue) -> Result<(), MarkerError> {
        self.workspace()?.set_attribute(self.id, name, value)
    }

    fn delete(&self) -> Result<(), MarkerError> {
        self.workspace()?.delete_marker(self.id)
    }
}

/// Nest `leaf` under changed nodes for each of its ancestors, up to `/`
fn wrap_in_ancestors(leaf: ResourceDelta) -> ResourceDelta {
    let ancestors: Vec<PathBuf> = leaf
        .resource()
        .ancestors()
        .skip(1)
        .map(Path::to_path_buf)
        .collect();
    ancestors
        .into_iter()
        .fold(leaf, |child, parent| ResourceDelta::changed(parent).with_child(child))
}

/// `path` with its `from` prefix replaced by `to`
fn rebase(path: &Path, from: &Path, to: &Path) -> PathBuf {
    match path.strip_prefix(from) {
        Ok(rest) if rest.as_os_str().is_empty() => to.to_path_buf(),
        Ok(rest) => to.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
