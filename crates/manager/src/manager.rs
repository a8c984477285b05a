//! Breakpoint manager
//!
//! One explicitly constructed instance owns the store, the resolver and
//! the reconciler. `startup` attaches the reconciler to the change feed and
//! registers a breakpoint for every breakpoint marker already present;
//! `shutdown` detaches it again. Registry operations delegate to the store.

use crate::capabilities::ConfiguredCapabilities;
use crate::config::ManagerConfig;
use anyhow::Context;
use bp_core::{
    BreakpointError, BreakpointHandle, BreakpointListener, BreakpointStore, CapabilityTable,
    MarkerHandle, MarkerStore, TypeResolver,
};
use bp_watcher::{ChangeFeed, DeferredQueue, ReconcileCounts, Reconciler, SubscriptionId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Point-in-time view of manager activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerStats {
    pub registered: usize,
    pub listeners: usize,
    pub deferred_pending: usize,
    pub reconcile: ReconcileCounts,
}

pub struct BreakpointManager {
    config: ManagerConfig,
    feed: Arc<dyn ChangeFeed>,
    store: Arc<BreakpointStore>,
    resolver: Arc<TypeResolver>,
    deferred: Arc<DeferredQueue>,
    reconciler: Arc<Reconciler>,

    /// Tables registered in code, consulted after the configured one
    extra_tables: Vec<Arc<dyn CapabilityTable>>,

    /// Change feed subscription while started
    subscription: Mutex<Option<SubscriptionId>>,
    started: AtomicBool,
}

impl BreakpointManager {
    pub fn new(
        config: ManagerConfig,
        markers: Arc<dyn MarkerStore>,
        feed: Arc<dyn ChangeFeed>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Arc::new(BreakpointStore::new());
        let resolver = Arc::new(TypeResolver::new());
        let deferred = Arc::new(
            DeferredQueue::new(config.deferred_workers)
                .context("Failed to start deferred workers")?,
        );
        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            resolver.clone(),
            markers,
            deferred.clone(),
            config.breakpoint_marker_type.clone(),
        ));

        Ok(Self {
            config,
            feed,
            store,
            resolver,
            deferred,
            reconciler,
            extra_tables: Vec::new(),
            subscription: Mutex::new(None),
            started: AtomicBool::new(false),
        })
    }

    /// Add a capability table consulted at the first startup
    pub fn with_capabilities(mut self, table: Arc<dyn CapabilityTable>) -> Self {
        self.extra_tables.push(table);
        self
    }

    /// Populate the resolver, attach to the change feed and scan the workspace
    ///
    /// Calling this while already started does nothing. Markers that cannot
    /// produce a breakpoint are logged and skipped; a failing marker query
    /// is returned and leaves the manager stopped. No lock is held during
    /// the scan, so listeners may call back into the manager.
    pub fn startup(&self) -> Result<(), BreakpointError> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Breakpoint manager already started");
            return Ok(());
        }

        if !self.resolver.is_populated() {
            let configured = ConfiguredCapabilities::from_config(&self.config);
            let mut tables: Vec<&dyn CapabilityTable> = vec![&configured];
            tables.extend(self.extra_tables.iter().map(|table| table.as_ref()));
            match self.resolver.populate(&tables) {
                Ok(kinds) => debug!(kinds, "Breakpoint kinds registered"),
                Err(e) => {
                    self.started.store(false, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }

        let id = self.feed.subscribe(self.reconciler.clone());
        *self.subscription.lock() = Some(id);

        let created = match self.reconciler.rescan(&self.config.workspace_root) {
            Ok(created) => created,
            Err(e) => {
                self.detach(id);
                return Err(e);
            }
        };

        info!(
            root = %self.config.workspace_root.display(),
            breakpoints = created,
            "Breakpoint manager started"
        );
        Ok(())
    }

    /// Detach from the change feed
    ///
    /// Registered breakpoints stay registered. Calling this while stopped
    /// does nothing.
    pub fn shutdown(&self) {
        let Some(id) = self.subscription.lock().take() else {
            debug!("Breakpoint manager not started, nothing to shut down");
            return;
        };
        if !self.feed.unsubscribe(id) {
            warn!(subscription = ?id, "Change feed subscription already gone");
        }
        self.started.store(false, Ordering::SeqCst);
        info!("Breakpoint manager stopped");
    }

    /// Undo a failed startup unless a shutdown already did
    fn detach(&self, id: SubscriptionId) {
        let mut subscription = self.subscription.lock();
        if *subscription == Some(id) {
            subscription.take();
            self.feed.unsubscribe(id);
            self.started.store(false, Ordering::SeqCst);
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn register_breakpoint(&self, breakpoint: BreakpointHandle) -> Result<(), BreakpointError> {
        self.store.add(breakpoint)
    }

    /// Returns whether the breakpoint was registered
    pub fn unregister_breakpoint(
        &self,
        breakpoint: &BreakpointHandle,
        delete_marker: bool,
    ) -> Result<bool, BreakpointError> {
        self.store.remove(breakpoint, delete_marker)
    }

    /// Breakpoint registered for `marker`
    pub fn lookup(&self, marker: &MarkerHandle) -> Option<BreakpointHandle> {
        self.store.lookup_by_marker(marker.id())
    }

    /// Every registered breakpoint, in registration order
    pub fn list_all(&self) -> Vec<BreakpointHandle> {
        self.store.all()
    }

    pub fn list_for_model(&self, model: &str) -> Vec<BreakpointHandle> {
        self.store.for_model(model)
    }

    pub fn is_registered(&self, breakpoint: &BreakpointHandle) -> bool {
        self.store.contains(breakpoint)
    }

    pub fn subscribe(&self, listener: Arc<dyn BreakpointListener>) {
        self.store.subscribe(listener);
    }

    pub fn unsubscribe(&self, listener: &Arc<dyn BreakpointListener>) {
        self.store.unsubscribe(listener);
    }

    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            registered: self.store.len(),
            listeners: self.store.listeners().len(),
            deferred_pending: self.deferred.pending(),
            reconcile: self.reconciler.stats(),
        }
    }

    /// Wait for deferred reconciliation to finish, up to `timeout`
    pub fn deferred_idle(&self, timeout: Duration) -> bool {
        self.deferred.wait_idle(timeout)
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }
}

impl Drop for BreakpointManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
