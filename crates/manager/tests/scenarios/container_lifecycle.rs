//! Container close and reopen

use crate::common::{TestWorkspace, LINE, MODEL};
use bp_core::{same_breakpoint, AttributeValue};

#[test]
fn test_close_removes_contained_breakpoints_without_deleting_markers() {
    let t = TestWorkspace::new();
    let b1 = t.line_marker("/proj/a.pda");
    let b2 = t.line_marker("/proj/nested/b.pda");
    let b3 = t.line_marker("/other/c.pda");
    t.manager.startup().unwrap();
    assert_eq!(t.manager.list_all().len(), 3);
    let outside = t.manager.lookup(&b3).unwrap();

    let log = t.event_log();
    t.workspace.set_open("/proj", false);

    assert_eq!(t.manager.list_all().len(), 1);
    assert!(t.manager.lookup(&b1).is_none());
    assert!(t.manager.lookup(&b2).is_none());
    assert!(same_breakpoint(&t.manager.lookup(&b3).unwrap(), &outside));
    assert_eq!(log.count("removed"), 2);
    assert_eq!(t.workspace.deletes(), 0);
    assert_eq!(t.workspace.marker_count(), 3);
}

#[test]
fn test_reopen_recreates_breakpoints_from_markers() {
    let t = TestWorkspace::new();
    let b1 = t.line_marker("/proj/a.pda");
    let b2 = t.line_marker("/proj/nested/b.pda");
    t.line_marker("/other/c.pda");
    t.manager.startup().unwrap();
    let before = t.manager.lookup(&b1).unwrap();

    t.workspace.set_open("/proj", false);
    let log = t.event_log();
    t.workspace.set_open("/proj", true);

    assert_eq!(t.manager.list_all().len(), 3);
    assert_eq!(t.manager.list_for_model(MODEL).len(), 3);
    let after = t.manager.lookup(&b1).unwrap();
    assert!(!same_breakpoint(&before, &after));
    assert!(t.manager.lookup(&b2).is_some());

    let mut added: Vec<_> = log.events().into_iter().map(|(_, id)| id).collect();
    added.sort();
    let mut expected = vec![b1.id(), b2.id()];
    expected.sort();
    assert_eq!(added, expected);
    assert_eq!(log.count("added"), 2);
}

#[test]
fn test_changes_inside_closed_container_are_not_applied() {
    let t = TestWorkspace::started();
    t.workspace.set_open("/proj", false);
    let late = t
        .workspace
        .create_marker("/proj/late.pda", LINE, Vec::<(&str, AttributeValue)>::new());
    assert!(late.is_err());

    t.workspace.set_open("/proj", true);
    assert!(t.manager.list_all().is_empty());
    assert_eq!(t.manager.stats().reconcile.failures, 0);
}

#[test]
fn test_shutdown_stops_following_container_changes() {
    let t = TestWorkspace::new();
    let marker = t.line_marker("/proj/a.pda");
    t.manager.startup().unwrap();

    t.manager.shutdown();
    t.workspace.set_open("/proj", false);

    assert!(t.manager.lookup(&marker).is_some());
}
