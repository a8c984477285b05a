//! Common utilities for integration tests

use bp_core::marker::MODEL_IDENTIFIER;
use bp_core::{AttributeValue, BreakpointEvent, BreakpointListener, MarkerHandle, MarkerId};
use bp_manager::{BreakpointManager, LoggingConfig, ManagerConfig};
use bp_watcher::MemoryWorkspace;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub const BREAKPOINT: &str = "debug.breakpoint";
pub const LINE: &str = "debug.lineBreakpoint";
pub const WATCH: &str = "debug.watchpoint";
pub const MODEL: &str = "example.pda";

/// Upper bound for waiting on deferred work
pub const WAIT: Duration = Duration::from_secs(5);

/// A workspace with `/proj` and `/other` containers and a manager over it
///
/// Only line breakpoints have a configured factory; watchpoint markers
/// belong to the breakpoint family but cannot be instantiated.
pub struct TestWorkspace {
    pub workspace: Arc<MemoryWorkspace>,
    pub manager: Arc<BreakpointManager>,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let _ = bp_manager::logging::init(&LoggingConfig {
            level: "debug".into(),
            ansi: false,
        });

        let workspace = MemoryWorkspace::new();
        workspace.define_marker_type(BREAKPOINT, &[]);
        workspace.define_marker_type(LINE, &[BREAKPOINT]);
        workspace.define_marker_type(WATCH, &[BREAKPOINT]);
        workspace.define_marker_type("problem", &[]);
        workspace.add_container("/proj");
        workspace.add_container("/other");

        let config = ManagerConfig::from_toml_str(&format!(
            r#"
            breakpoint_marker_type = "{BREAKPOINT}"
            deferred_workers = 2

            [[breakpoint_types]]
            marker_type = "{LINE}"
            "#
        ))
        .expect("valid config");

        let manager = BreakpointManager::new(config, workspace.clone(), workspace.clone())
            .expect("manager");
        Self {
            workspace,
            manager: Arc::new(manager),
        }
    }

    /// Fixture whose manager has already started
    pub fn started() -> Self {
        let fixture = Self::new();
        fixture.manager.startup().expect("startup");
        fixture
    }

    /// Line breakpoint marker carrying a model identifier
    pub fn line_marker(&self, resource: &str) -> MarkerHandle {
        self.workspace
            .create_marker(resource, LINE, [(MODEL_IDENTIFIER, AttributeValue::from(MODEL))])
            .expect("create marker")
    }

    /// Line breakpoint marker with no model identifier
    pub fn bare_marker(&self, resource: &str) -> MarkerHandle {
        self.workspace
            .create_marker(resource, LINE, Vec::<(&str, AttributeValue)>::new())
            .expect("create marker")
    }

    pub fn watch_marker(&self, resource: &str) -> MarkerHandle {
        self.workspace
            .create_marker(resource, WATCH, [(MODEL_IDENTIFIER, AttributeValue::from(MODEL))])
            .expect("create marker")
    }

    /// Subscribe a fresh event log to the manager
    pub fn event_log(&self) -> Arc<EventLog> {
        let log = Arc::new(EventLog::default());
        self.manager.subscribe(log.clone());
        log
    }
}

/// Records every breakpoint event as (label, marker)
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<(&'static str, MarkerId)>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<(&'static str, MarkerId)> {
        self.events.lock().clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|(seen, _)| *seen == label)
            .count()
    }
}

impl BreakpointListener for EventLog {
    fn breakpoint_event(&self, event: &BreakpointEvent) {
        self.events
            .lock()
            .push((event.label(), event.breakpoint().marker().id()));
    }
}
