//! Registration edge cases

use crate::common::{TestWorkspace, MODEL};
use bp_core::{same_breakpoint, AttributeBreakpoint, BreakpointHandle, ErrorKind};
use std::sync::Arc;

#[test]
fn test_register_twice_is_a_noop() {
    let t = TestWorkspace::started();
    let log = t.event_log();
    let marker = t.line_marker("/proj/a.pda");
    let bp: BreakpointHandle = Arc::new(AttributeBreakpoint::new(marker.clone()));

    t.manager.register_breakpoint(bp.clone()).unwrap();
    t.manager.register_breakpoint(bp.clone()).unwrap();

    assert_eq!(t.manager.list_all().len(), 1);
    assert_eq!(log.count("added"), 1);
    assert!(same_breakpoint(&t.manager.lookup(&marker).unwrap(), &bp));
}

#[test]
fn test_unregister_twice_is_a_noop() {
    let t = TestWorkspace::started();
    let marker = t.line_marker("/proj/a.pda");
    let bp: BreakpointHandle = Arc::new(AttributeBreakpoint::new(marker.clone()));
    t.manager.register_breakpoint(bp.clone()).unwrap();
    let log = t.event_log();

    assert!(t.manager.unregister_breakpoint(&bp, true).unwrap());
    assert!(!t.manager.unregister_breakpoint(&bp, true).unwrap());

    assert_eq!(log.count("removed"), 1);
    assert_eq!(t.workspace.deletes(), 1);
    assert!(t.manager.lookup(&marker).is_none());
}

#[test]
fn test_missing_model_identifier_leaves_registry_unchanged() {
    let t = TestWorkspace::started();
    let log = t.event_log();
    let marker = t.bare_marker("/proj/a.pda");

    let err = t
        .manager
        .register_breakpoint(Arc::new(AttributeBreakpoint::new(marker.clone())))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);
    assert!(t.manager.list_all().is_empty());
    assert!(t.manager.lookup(&marker).is_none());
    assert!(log.events().is_empty());
}

#[test]
fn test_second_breakpoint_for_bound_marker_conflicts() {
    let t = TestWorkspace::started();
    let marker = t.line_marker("/proj/a.pda");
    let first: BreakpointHandle = Arc::new(AttributeBreakpoint::new(marker.clone()));
    let second: BreakpointHandle = Arc::new(AttributeBreakpoint::new(marker.clone()));

    t.manager.register_breakpoint(first.clone()).unwrap();
    let err = t.manager.register_breakpoint(second.clone()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(t.manager.is_registered(&first));
    assert!(!t.manager.is_registered(&second));
}

#[test]
fn test_startup_skips_markers_without_factory_or_model() {
    let t = TestWorkspace::new();
    let good = t.line_marker("/proj/a.pda");
    let watch = t.watch_marker("/proj/w.pda");
    let bare = t.bare_marker("/other/b.pda");

    t.manager.startup().unwrap();

    assert!(t.manager.lookup(&good).is_some());
    assert!(t.manager.lookup(&watch).is_none());
    assert!(t.manager.lookup(&bare).is_none());
    let stats = t.manager.stats();
    assert_eq!(stats.registered, 1);
    assert_eq!(stats.reconcile.created, 1);
    assert_eq!(stats.reconcile.failures, 2);
}

#[test]
fn test_list_for_model_matches_exactly() {
    let t = TestWorkspace::started();
    let a = t.line_marker("/proj/a.pda");
    let b = t.line_marker("/proj/b.pda");
    let c = t.bare_marker("/proj/c.pda");
    t.manager
        .register_breakpoint(Arc::new(AttributeBreakpoint::new(a)))
        .unwrap();
    t.manager
        .register_breakpoint(Arc::new(AttributeBreakpoint::with_model(b, "other.model")))
        .unwrap();
    t.manager
        .register_breakpoint(Arc::new(AttributeBreakpoint::with_model(c, MODEL)))
        .unwrap();

    assert_eq!(t.manager.list_for_model(MODEL).len(), 2);
    assert_eq!(t.manager.list_for_model("other.model").len(), 1);
    assert!(t.manager.list_for_model("example").is_empty());
    assert_eq!(t.manager.list_all().len(), 3);
}
