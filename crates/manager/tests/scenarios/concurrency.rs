//! Concurrent registry use

use crate::common::{TestWorkspace, LINE, WAIT};
use bp_core::marker::{ENABLED, MODEL_IDENTIFIER};
use bp_core::{
    same_breakpoint, AttributeBreakpoint, AttributeValue, BreakpointHandle, ErrorKind, MarkerId,
};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_register_unregister_keeps_index_consistent() {
    let t = TestWorkspace::started();
    let log = t.event_log();

    let handles: Vec<_> = (0..6)
        .map(|worker| {
            let manager = t.manager.clone();
            let workspace = t.workspace.clone();
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                let mut kept = HashSet::new();
                for i in 0..50 {
                    let resource = format!("/proj/w{}/{}.pda", worker, i);
                    let marker = workspace
                        .create_marker(
                            resource.as_str(),
                            LINE,
                            [(MODEL_IDENTIFIER, AttributeValue::from("m"))],
                        )
                        .unwrap();
                    let bp: BreakpointHandle = Arc::new(AttributeBreakpoint::new(marker.clone()));
                    manager.register_breakpoint(bp.clone()).unwrap();

                    if rng.gen_bool(0.3) {
                        manager.unregister_breakpoint(&bp, false).unwrap();
                    } else {
                        if rng.gen_bool(0.5) {
                            marker.set_attribute(ENABLED, AttributeValue::Bool(false)).unwrap();
                        }
                        kept.insert(marker.id());
                    }
                }
                kept
            })
        })
        .collect();

    let mut expected: HashSet<MarkerId> = HashSet::new();
    for handle in handles {
        expected.extend(handle.join().unwrap());
    }

    assert!(t.manager.deferred_idle(WAIT));
    let registered = t.manager.list_all();
    assert_eq!(registered.len(), expected.len());
    for breakpoint in &registered {
        let marker = breakpoint.marker();
        assert!(expected.contains(&marker.id()));
        assert!(same_breakpoint(&t.manager.lookup(marker).unwrap(), breakpoint));
    }
    assert_eq!(log.count("added"), 300);
    assert_eq!(log.count("removed"), 300 - expected.len());
}

#[test]
fn test_reconcile_races_with_direct_registration() {
    let t = TestWorkspace::started();
    let markers: Vec<_> = (0..40)
        .map(|i| t.line_marker(&format!("/proj/r/{}.pda", i)))
        .collect();

    let closer = {
        let workspace = t.workspace.clone();
        let manager = t.manager.clone();
        thread::spawn(move || {
            for _ in 0..10 {
                workspace.set_open("/proj", false);
                // nothing under a closed container stays registered
                assert!(manager.list_all().is_empty());
                workspace.set_open("/proj", true);
            }
        })
    };
    for marker in &markers {
        let bp: BreakpointHandle = Arc::new(AttributeBreakpoint::new(marker.clone()));
        if let Err(e) = t.manager.register_breakpoint(bp) {
            // already bound by a reopen rescan, or the container is closed
            assert!(
                matches!(e.kind(), ErrorKind::Conflict | ErrorKind::BackingAccessFailure),
                "unexpected registration failure: {e}"
            );
        }
    }
    closer.join().unwrap();

    // the last reopen rescans everything back in
    assert_eq!(t.manager.list_all().len(), markers.len());
    for marker in &markers {
        assert!(t.manager.lookup(marker).is_some());
    }
}
