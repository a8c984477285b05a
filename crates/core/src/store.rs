//! Authoritative breakpoint set with its marker reverse index
//!
//! The store owns the ordered set of registered breakpoints and the index
//! from marker identity to breakpoint. Every mutate-then-notify sequence
//! runs under a reentrant sequencer, so listeners see a state consistent
//! with the event they receive and may call back into the store.

use crate::breakpoint::{same_breakpoint, BreakpointHandle};
use crate::delta::MarkerDelta;
use crate::error::BreakpointError;
use crate::event::BreakpointEvent;
use crate::listener::{BreakpointListener, ListenerRegistry};
use crate::marker::{MarkerHandle, MarkerId};
use crate::resolver::TypeResolver;
use ahash::AHashMap;
use parking_lot::{ReentrantMutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct StoreState {
    /// Registered breakpoints, in registration order
    breakpoints: Vec<BreakpointHandle>,
    /// marker identity -> breakpoint
    by_marker: AHashMap<MarkerId, BreakpointHandle>,
}

impl StoreState {
    fn position(&self, breakpoint: &BreakpointHandle) -> Option<usize> {
        self.breakpoints
            .iter()
            .position(|b| same_breakpoint(b, breakpoint))
    }
}

/// Registered breakpoints plus their listeners
pub struct BreakpointStore {
    state: RwLock<StoreState>,
    sequencer: ReentrantMutex<()>,
    listeners: ListenerRegistry,
}

impl BreakpointStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            sequencer: ReentrantMutex::new(()),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Register a breakpoint
    ///
    /// Adding a registered breakpoint again is a no-op. The breakpoint must
    /// report a non-empty model identifier, and its marker must not be bound
    /// to a different breakpoint.
    pub fn add(&self, breakpoint: BreakpointHandle) -> Result<(), BreakpointError> {
        let _sequence = self.sequencer.lock();

        let marker = breakpoint.marker().id();
        {
            let state = self.state.read();
            if state.position(&breakpoint).is_some() {
                return Ok(());
            }
            if state.by_marker.contains_key(&marker) {
                return Err(BreakpointError::MarkerAlreadyBound { marker });
            }
        }

        verify(&breakpoint)?;

        {
            let mut state = self.state.write();
            state.breakpoints.push(breakpoint.clone());
            state.by_marker.insert(marker, breakpoint.clone());
        }
        debug!(%marker, "Breakpoint registered");

        self.listeners.notify(&BreakpointEvent::Added(breakpoint));
        Ok(())
    }

    /// Unregister a breakpoint, optionally deleting its marker
    ///
    /// Returns whether the breakpoint was registered. The marker is deleted
    /// after the in-memory removal; a failed deletion is reported but the
    /// breakpoint stays unregistered.
    pub fn remove(
        &self,
        breakpoint: &BreakpointHandle,
        delete_marker: bool,
    ) -> Result<bool, BreakpointError> {
        {
            let _sequence = self.sequencer.lock();
            let removed = {
                let mut state = self.state.write();
                match state.position(breakpoint) {
                    Some(index) => {
                        let removed = state.breakpoints.remove(index);
                        let marker = removed.marker().id();
                        let indexed = state
                            .by_marker
                            .get(&marker)
                            .is_some_and(|b| same_breakpoint(b, &removed));
                        if indexed {
                            state.by_marker.remove(&marker);
                        }
                        true
                    }
                    None => false,
                }
            };
            if !removed {
                return Ok(false);
            }
            debug!(marker = %breakpoint.marker().id(), "Breakpoint unregistered");

            self.listeners.notify(&BreakpointEvent::Removed {
                breakpoint: breakpoint.clone(),
                delta: None,
            });
        }

        if delete_marker {
            breakpoint.delete()?;
        }
        Ok(true)
    }

    /// Unregister every breakpoint whose marker lives on `scope` or below it
    ///
    /// Selection and removal happen in one step with respect to other store
    /// mutations, so a registration already in progress is either removed
    /// here or completes after it. Markers are never deleted. Returns the
    /// removed breakpoints, each of which got a `Removed` event.
    pub fn remove_under(&self, scope: &Path) -> Vec<BreakpointHandle> {
        let _sequence = self.sequencer.lock();

        let removed: Vec<BreakpointHandle> = {
            let mut state = self.state.write();
            let (doomed, kept): (Vec<_>, Vec<_>) = state
                .breakpoints
                .drain(..)
                .partition(|b| b.marker().resource().starts_with(scope));
            state.breakpoints = kept;
            for breakpoint in &doomed {
                let marker = breakpoint.marker().id();
                let indexed = state
                    .by_marker
                    .get(&marker)
                    .is_some_and(|b| same_breakpoint(b, breakpoint));
                if indexed {
                    state.by_marker.remove(&marker);
                }
            }
            doomed
        };
        if !removed.is_empty() {
            debug!(scope = %scope.display(), count = removed.len(), "Breakpoints unregistered");
        }

        for breakpoint in &removed {
            self.listeners.notify(&BreakpointEvent::Removed {
                breakpoint: breakpoint.clone(),
                delta: None,
            });
        }
        removed
    }

    /// Breakpoint for `marker`, creating and registering it when unknown
    ///
    /// The lookup, creation and registration happen as one step with respect
    /// to other store mutations.
    pub fn create_from_marker(
        &self,
        marker: MarkerHandle,
        resolver: &TypeResolver,
    ) -> Result<BreakpointHandle, BreakpointError> {
        let _sequence = self.sequencer.lock();

        if let Some(existing) = self.lookup_by_marker(marker.id()) {
            return Ok(existing);
        }

        let breakpoint = resolver.instantiate(marker)?;
        self.add(breakpoint.clone())?;
        Ok(breakpoint)
    }

    /// Notify listeners that the marker of a registered breakpoint changed
    ///
    /// Returns whether an event was sent.
    pub fn fire_changed(&self, breakpoint: &BreakpointHandle, delta: Option<MarkerDelta>) -> bool {
        let _sequence = self.sequencer.lock();
        if !self.contains(breakpoint) {
            return false;
        }
        self.listeners.notify(&BreakpointEvent::Changed {
            breakpoint: breakpoint.clone(),
            delta,
        });
        true
    }

    pub fn lookup_by_marker(&self, marker: MarkerId) -> Option<BreakpointHandle> {
        self.state.read().by_marker.get(&marker).cloned()
    }

    pub fn contains(&self, breakpoint: &BreakpointHandle) -> bool {
        self.state.read().position(breakpoint).is_some()
    }

    /// Snapshot of all breakpoints, in registration order
    pub fn all(&self) -> Vec<BreakpointHandle> {
        self.state.read().breakpoints.clone()
    }

    /// Breakpoints whose model identifier is exactly `model`
    ///
    /// Breakpoints whose identifier cannot be read are skipped.
    pub fn for_model(&self, model: &str) -> Vec<BreakpointHandle> {
        self.all()
            .into_iter()
            .filter(|b| matches!(b.model_identifier(), Ok(Some(id)) if id == model))
            .collect()
    }

    /// Breakpoints whose marker lives on `scope` or below it
    pub fn breakpoints_under(&self, scope: &Path) -> Vec<BreakpointHandle> {
        self.all()
            .into_iter()
            .filter(|b| b.marker().resource().starts_with(scope))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self, listener: Arc<dyn BreakpointListener>) {
        self.listeners.subscribe(listener);
    }

    pub fn unsubscribe(&self, listener: &Arc<dyn BreakpointListener>) {
        self.listeners.unsubscribe(listener);
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Check that the set and the reverse index agree
    ///
    /// Every registered breakpoint is indexed under its marker and the index
    /// holds nothing else.
    pub fn is_consistent(&self) -> bool {
        let state = self.state.read();
        state.breakpoints.len() == state.by_marker.len()
            && state.breakpoints.iter().all(|b| {
                state
                    .by_marker
                    .get(&b.marker().id())
                    .is_some_and(|indexed| same_breakpoint(indexed, b))
            })
    }
}

impl Default for BreakpointStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A breakpoint needs a non-empty model identifier to be registered
fn verify(breakpoint: &BreakpointHandle) -> Result<(), BreakpointError> {
    match breakpoint.model_identifier()? {
        Some(id) if !id.is_empty() => Ok(()),
        _ => Err(BreakpointError::MissingModelIdentifier(
            breakpoint.marker().id(),
        )),
    }
}
