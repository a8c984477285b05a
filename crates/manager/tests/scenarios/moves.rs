//! Resource moves

use crate::common::{TestWorkspace, WAIT};

#[test]
fn test_moved_breakpoint_is_removed_and_its_marker_deleted() {
    let t = TestWorkspace::new();
    let marker = t.line_marker("/proj/src/a.pda");
    let stays = t.line_marker("/proj/b.pda");
    t.manager.startup().unwrap();
    let log = t.event_log();

    t.workspace.move_resource("/proj/src", "/proj/lib");
    assert!(t.manager.deferred_idle(WAIT));

    assert!(t.manager.lookup(&marker).is_none());
    assert!(t.manager.lookup(&stays).is_some());
    assert!(!marker.exists());
    assert_eq!(t.workspace.deletes(), 1);
    assert_eq!(log.events(), vec![("removed", marker.id())]);

    let stats = t.manager.stats();
    assert_eq!(stats.reconcile.moves_deferred, 1);
    assert_eq!(stats.deferred_pending, 0);
    assert_eq!(stats.registered, 1);
}

#[test]
fn test_move_of_unregistered_marker_deletes_nothing() {
    let t = TestWorkspace::started();
    let marker = t.line_marker("/proj/src/a.pda");

    t.workspace.move_resource("/proj/src", "/proj/lib");
    assert!(t.manager.deferred_idle(WAIT));

    assert!(marker.exists());
    assert_eq!(t.workspace.deletes(), 0);
    assert!(t.manager.list_all().is_empty());
}

#[test]
fn test_move_of_non_breakpoint_markers_is_ignored() {
    let t = TestWorkspace::started();
    t.workspace
        .create_marker("/proj/src/a.pda", "problem", Vec::<(&str, bp_core::AttributeValue)>::new())
        .unwrap();

    t.workspace.move_resource("/proj/src", "/proj/lib");

    assert!(t.manager.deferred_idle(WAIT));
    assert_eq!(t.manager.stats().reconcile.moves_deferred, 0);
    assert_eq!(t.workspace.deletes(), 0);
}
