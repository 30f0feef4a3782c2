//! Subscription specs
//!
//! Verify subscribe, unsubscribe, counts and clearing.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn subscribing_twice_stores_two_entries() {
    let registry = Registry::new();
    let recorder = Recorder::new();

    registry.subscribe("user.login", recorder.listener());
    assert_eq!(registry.listener_count("user.login"), 1);

    registry.subscribe("user.login", recorder.listener());
    assert_eq!(registry.listener_count("user.login"), 2);
}

#[test]
fn unsubscribe_after_subscribe_leaves_nothing() {
    let registry = Registry::new();
    let recorder = Recorder::new();

    registry.subscribe("user.login", recorder.listener());
    registry.unsubscribe("user.login", Some(&recorder.listener()));

    assert_eq!(registry.listener_count("user.login"), 0);
}

#[test]
fn unsubscribe_removes_all_duplicates() {
    let registry = Registry::new();
    let recorder = Recorder::new();

    registry.subscribe("x", recorder.listener());
    registry.subscribe("x", recorder.listener());
    registry.unsubscribe("x", Some(&recorder.listener()));

    assert_eq!(registry.listener_count("x"), 0);
}

#[test]
fn unsubscribe_unknown_key_does_nothing() {
    let registry = Registry::new();
    let recorder = Recorder::new();

    registry.unsubscribe("nothing", Some(&recorder.listener()));
    registry.unsubscribe("nothing", None);

    assert!(registry.is_empty());
}

#[test]
fn unsubscribe_without_listener_drops_key() {
    let registry = Registry::new();
    registry.subscribe("x", Recorder::new().listener());
    registry.subscribe("x", Recorder::new().listener());

    registry.unsubscribe("x", None);

    assert_eq!(registry.listener_count("x"), 0);
}

#[test]
fn clear_all_forgets_every_key() {
    let registry = Registry::new();
    let recorder = Recorder::new();
    for key in ["a", "b.*", "c.?"] {
        registry.subscribe(key, recorder.listener());
    }

    registry.clear_all();

    for key in ["a", "b.*", "c.?"] {
        assert_eq!(registry.listener_count(key), 0);
    }
}

#[test]
fn clear_event_only_touches_one_key() {
    let registry = Registry::new();
    let recorder = Recorder::new();
    registry.subscribe("a", recorder.listener());
    registry.subscribe("b", recorder.listener());

    registry.clear_event("a");

    assert_eq!(registry.event_keys(), vec!["b".to_string()]);
}

#[test]
fn count_of_absent_key_is_zero() {
    let registry: Registry = Registry::new();
    assert_eq!(registry.listener_count("never"), 0);
}
