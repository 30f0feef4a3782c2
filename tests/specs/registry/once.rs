//! Once-subscription specs
//!
//! Verify fire-once semantics and cancellation by id.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn once_listener_runs_for_first_dispatch_only() {
    let registry = Registry::new();
    let recorder = Recorder::new();
    registry.subscribe_once("x", recorder.listener());

    registry.dispatch("x", Some(&json!(1))).unwrap();
    assert_eq!(registry.listener_count("x"), 0);

    registry.dispatch("x", Some(&json!(2))).unwrap();
    assert_eq!(recorder.calls(), vec![Some(json!(1))]);
}

#[test]
fn original_listener_cannot_cancel_once() {
    let registry = Registry::new();
    let recorder = Recorder::new();
    registry.subscribe_once("x", recorder.listener());

    registry.unsubscribe("x", Some(&recorder.listener()));

    assert_eq!(registry.listener_count("x"), 1);
}

#[test]
fn returned_id_cancels_once() {
    let registry = Registry::new();
    let recorder = Recorder::new();
    let id = registry.subscribe_once("x", recorder.listener());

    assert!(registry.cancel("x", id));
    registry.dispatch("x", None).unwrap();

    assert_eq!(recorder.count(), 0);
}

#[test]
fn once_on_pattern_fires_for_first_match() {
    let registry = Registry::new();
    let recorder = Recorder::new();
    registry.subscribe_once("boot.*", recorder.listener());

    registry.dispatch("boot.db", Some(&json!("db"))).unwrap();
    registry.dispatch("boot.cache", Some(&json!("cache"))).unwrap();

    assert_eq!(recorder.calls(), vec![Some(json!("db"))]);
}
