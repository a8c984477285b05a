//! Delta reconciliation
//!
//! Walks every change notification and brings the breakpoint store in line
//! with the marker changes it describes. A failure on one entry is logged
//! and counted; the walk always continues with the rest of the tree.

use crate::deferred::DeferredQueue;
use crate::feed::{ChangeEvent, ChangeListener};
use bp_core::{
    BreakpointError, BreakpointStore, DeltaKind, MarkerDelta, MarkerStore, ResourceDelta,
    TypeResolver,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Running totals of reconciler activity
#[derive(Default)]
struct ReconcileStats {
    created: AtomicU64,
    removed: AtomicU64,
    changed: AtomicU64,
    moves_deferred: AtomicU64,
    failures: AtomicU64,
}

/// Snapshot of reconciler activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    /// Breakpoints created from rescanned markers
    pub created: u64,
    /// Breakpoints unregistered because their marker or container went away
    pub removed: u64,
    /// Change events sent for registered breakpoints
    pub changed: u64,
    /// Moved markers handed to the deferred queue
    pub moves_deferred: u64,
    /// Entries that failed and were skipped
    pub failures: u64,
}

/// Keeps the breakpoint store in step with marker changes
pub struct Reconciler {
    store: Arc<BreakpointStore>,
    resolver: Arc<TypeResolver>,
    markers: Arc<dyn MarkerStore>,
    deferred: Arc<DeferredQueue>,

    /// Marker type every breakpoint marker derives from
    breakpoint_type: String,

    stats: ReconcileStats,
}

impl Reconciler {
    pub fn new(
        store: Arc<BreakpointStore>,
        resolver: Arc<TypeResolver>,
        markers: Arc<dyn MarkerStore>,
        deferred: Arc<DeferredQueue>,
        breakpoint_type: impl Into<String>,
    ) -> Self {
        Self {
            store,
            resolver,
            markers,
            deferred,
            breakpoint_type: breakpoint_type.into(),
            stats: ReconcileStats::default(),
        }
    }

    /// Process one delta tree, visiting every node in pre-order
    pub fn reconcile(&self, delta: &ResourceDelta) {
        debug!(resource = %delta.resource().display(), nodes = delta.node_count(), "Reconciling delta");
        delta.accept(&mut |node: &ResourceDelta| {
            self.visit(node);
            true
        });
    }

    /// Create breakpoints for every breakpoint marker on `scope` or below
    ///
    /// Markers that already have a breakpoint are left alone. A marker that
    /// fails to produce a breakpoint is logged and skipped; only a failing
    /// marker query is returned as an error.
    pub fn rescan(&self, scope: &Path) -> Result<usize, BreakpointError> {
        let markers = self
            .markers
            .find_markers(&self.breakpoint_type, true, scope)?;

        let mut created = 0;
        for marker in markers {
            let id = marker.id();
            let known = self.store.lookup_by_marker(id).is_some();
            match self.store.create_from_marker(marker, &self.resolver) {
                Ok(_) if !known => {
                    created += 1;
                    self.stats.created.fetch_add(1, Ordering::Relaxed);
                }
                Ok(_) => {}
                Err(e) => self.log_failure("create breakpoint", &e),
            }
        }

        debug!(scope = %scope.display(), created, "Rescan finished");
        Ok(created)
    }

    pub fn stats(&self) -> ReconcileCounts {
        ReconcileCounts {
            created: self.stats.created.load(Ordering::Relaxed),
            removed: self.stats.removed.load(Ordering::Relaxed),
            changed: self.stats.changed.load(Ordering::Relaxed),
            moves_deferred: self.stats.moves_deferred.load(Ordering::Relaxed),
            failures: self.stats.failures.load(Ordering::Relaxed),
        }
    }

    pub fn breakpoint_type(&self) -> &str {
        &self.breakpoint_type
    }

    fn visit(&self, node: &ResourceDelta) {
        if node.flags().open {
            self.handle_open_state_change(node.resource());
            return;
        }

        for marker_delta in node.marker_deltas() {
            if !self
                .markers
                .is_subtype(marker_delta.marker_type(), &self.breakpoint_type)
            {
                continue;
            }
            match marker_delta.kind() {
                DeltaKind::Added => self.handle_added(node, marker_delta),
                DeltaKind::Removed => self.handle_removed(marker_delta),
                DeltaKind::Changed => self.handle_changed(marker_delta),
            }
        }
    }

    /// A container was opened or closed
    fn handle_open_state_change(&self, container: &Path) {
        if !self.markers.is_accessible(container) {
            let removed = self.store.remove_under(container);
            info!(
                container = %container.display(),
                breakpoints = removed.len(),
                "Container closed, unregistered its breakpoints"
            );
            self.stats
                .removed
                .fetch_add(removed.len() as u64, Ordering::Relaxed);
            return;
        }

        info!(container = %container.display(), "Container opened, rescanning breakpoints");
        if let Err(e) = self.rescan(container) {
            self.log_failure("rescan container", &e);
        }
    }

    /// Breakpoints are only created on request, except when a marker
    /// arrives through a move: the moved breakpoint is discarded
    fn handle_added(&self, node: &ResourceDelta, marker_delta: &MarkerDelta) {
        let Some(from) = &node.flags().moved_from else {
            return;
        };

        let store = self.store.clone();
        let marker = marker_delta.marker().clone();
        debug!(
            marker = %marker.id(),
            from = %from.display(),
            to = %node.resource().display(),
            "Breakpoint marker moved, scheduling removal"
        );
        self.stats.moves_deferred.fetch_add(1, Ordering::Relaxed);
        self.deferred.submit("remove-moved-breakpoint", move || {
            if let Some(breakpoint) = store.lookup_by_marker(marker.id()) {
                store.remove(&breakpoint, true)?;
            }
            Ok(())
        });
    }

    fn handle_removed(&self, marker_delta: &MarkerDelta) {
        let Some(breakpoint) = self.store.lookup_by_marker(marker_delta.id()) else {
            return;
        };
        match self.store.remove(&breakpoint, false) {
            Ok(true) => {
                self.stats.removed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(false) => {}
            Err(e) => self.log_failure("remove breakpoint", &e),
        }
    }

    fn handle_changed(&self, marker_delta: &MarkerDelta) {
        let Some(breakpoint) = self.store.lookup_by_marker(marker_delta.id()) else {
            return;
        };
        if self.store.fire_changed(&breakpoint, Some(marker_delta.clone())) {
            self.stats.changed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn log_failure(&self, action: &str, e: &BreakpointError) {
        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        error!(action, error = %e, "Breakpoint reconciliation step failed");
    }
}

impl ChangeListener for Reconciler {
    fn resource_changed(&self, event: &ChangeEvent) {
        if let Some(delta) = event.delta() {
            self.reconcile(delta);
        }
    }
}
