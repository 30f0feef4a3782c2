//! Listener fault specs
//!
//! Verify isolate and propagate policies.

use crate::prelude::*;
use similar_asserts::assert_eq;
use std::sync::{Arc, Mutex};

fn failing() -> Listener<Value> {
    Listener::fallible(|_| Err(ListenerError::failed("listener broke")))
}

#[test]
fn isolated_fault_does_not_starve_siblings() {
    let registry = Registry::new();
    let recorder = Recorder::new();
    registry.subscribe("x", failing());
    registry.subscribe("x", recorder.listener());

    let report = registry.dispatch("x", Some(&json!(1))).unwrap();

    assert_eq!(report.faults, 1);
    assert_eq!(recorder.count(), 1);
}

#[test]
fn isolated_fault_reaches_handler() {
    let registry: Registry = Registry::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    registry.set_fault_handler(move |fault| {
        sink.lock()
            .unwrap()
            .push(format!("{} {} {}", fault.event, fault.key, fault.error));
    });
    registry.subscribe("x.*", failing());

    registry.dispatch("x.y", None).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["x.y x.* listener broke".to_string()]);
}

#[test]
fn propagated_fault_aborts_dispatch() {
    let config = RegistryConfig::default().with_fault_policy(FaultPolicy::Propagate);
    let registry = Registry::with_config(config);
    let recorder = Recorder::new();
    registry.subscribe("x", failing());
    registry.subscribe("x", recorder.listener());

    let err = registry.dispatch("x", None).unwrap_err();

    assert!(matches!(err, DispatchError::Listener { ref key, .. } if key == "x"));
    assert_eq!(recorder.count(), 0);
}
