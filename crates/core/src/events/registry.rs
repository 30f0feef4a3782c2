// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener registry for routing events to subscribers
//!
//! Listeners are stored per key in registration order. A dispatch first runs
//! the listeners stored under the exact event name, then those of every other
//! key whose wildcard pattern matches the name. The map lock is released
//! before any listener runs, so listeners may subscribe, unsubscribe and
//! dispatch re-entrantly.

use super::listener::{Listener, ListenerError, ListenerId};
use super::pattern::{EventPattern, DEFAULT_SIZE_LIMIT};
use crate::config::{FaultPolicy, RegistryConfig};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{id} on '{key}' failed for event '{event}': {source}")]
    Listener {
        event: String,
        key: String,
        id: ListenerId,
        #[source]
        source: ListenerError,
    },
}

/// Outcome of a single dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners invoked, including those that failed
    pub invoked: usize,
    /// Failures isolated under `FaultPolicy::Isolate`
    pub faults: usize,
}

/// A listener failure observed during dispatch
#[derive(Debug)]
pub struct ListenerFault<'a> {
    pub event: &'a str,
    pub key: &'a str,
    pub id: ListenerId,
    pub error: &'a ListenerError,
}

/// Receives isolated listener failures
pub type FaultHandler = Arc<dyn Fn(&ListenerFault<'_>) + Send + Sync>;

struct Entry<P> {
    id: ListenerId,
    listener: Listener<P>,
    /// Cleared when the entry leaves its list; shared with dispatch snapshots
    alive: Arc<AtomicBool>,
}

impl<P> Entry<P> {
    fn new(id: ListenerId, listener: Listener<P>) -> Self {
        Self {
            id,
            listener,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn retire(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl<P> Clone for Entry<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: self.listener.clone(),
            alive: Arc::clone(&self.alive),
        }
    }
}

struct ListenerList<P> {
    pattern: EventPattern,
    entries: Vec<Entry<P>>,
    /// Set once the capacity warning has been logged for this key
    over_capacity: bool,
}

impl<P> ListenerList<P> {
    fn new(key: &str, size_limit: usize) -> Self {
        let pattern = EventPattern::compile_with_limit(key, size_limit).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "pattern rejected, matching key literally");
            EventPattern::literal(key)
        });
        Self {
            pattern,
            entries: Vec::new(),
            over_capacity: false,
        }
    }

    fn retire_all(&self) {
        self.entries.iter().for_each(Entry::retire);
    }
}

/// Removes a once-entry when the adapter call ends, including on unwind
struct OnceRemoval<'a, P> {
    lists: &'a Weak<Lists<P>>,
    key: &'a str,
    id: ListenerId,
}

impl<P> Drop for OnceRemoval<'_, P> {
    fn drop(&mut self) {
        if let Some(lists) = self.lists.upgrade() {
            remove_entry(&lists, self.key, self.id);
        }
    }
}

type Lists<P> = RwLock<HashMap<String, ListenerList<P>>>;

/// The registry maps event keys to ordered listener lists.
///
/// Clones share the same storage.
pub struct Registry<P = serde_json::Value> {
    lists: Arc<Lists<P>>,
    next_id: Arc<AtomicU64>,
    config: RegistryConfig,
    fault_handler: Arc<RwLock<Option<FaultHandler>>>,
}

impl<P> Registry<P> {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            lists: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            config,
            fault_handler: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Set the handler that receives isolated listener failures
    pub fn set_fault_handler<F>(&self, handler: F)
    where
        F: Fn(&ListenerFault<'_>) + Send + Sync + 'static,
    {
        let mut slot = self
            .fault_handler
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(handler));
    }

    /// Append a listener to the list for `key`.
    ///
    /// The same listener may be subscribed more than once; each subscription
    /// is a separate entry.
    pub fn subscribe(&self, key: impl Into<String>, listener: Listener<P>) -> ListenerId {
        let id = self.next_id();
        self.insert(key.into(), id, listener);
        id
    }

    /// Subscribe a listener that runs for the first matching dispatch only.
    ///
    /// The stored entry is an adapter around `listener`, so unsubscribing
    /// `listener` itself does not cancel it. Use [`Registry::cancel`] with the
    /// returned id instead.
    pub fn subscribe_once(&self, key: impl Into<String>, listener: Listener<P>) -> ListenerId
    where
        P: 'static,
    {
        let key = key.into();
        let id = self.next_id();
        let lists = Arc::downgrade(&self.lists);
        let owner = key.clone();
        let fired = AtomicBool::new(false);

        let adapter = Listener::fallible(move |payload| {
            if fired.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            let _removal = OnceRemoval {
                lists: &lists,
                key: &owner,
                id,
            };
            listener.call(payload)
        });

        self.insert(key, id, adapter);
        id
    }

    /// Remove every entry under `key` identical to `listener`, or the whole
    /// list when `listener` is `None`.
    pub fn unsubscribe(&self, key: &str, listener: Option<&Listener<P>>) {
        let Some(listener) = listener else {
            self.clear_event(key);
            return;
        };

        let mut lists = self.write();
        let Some(list) = lists.get_mut(key) else {
            return;
        };

        let before = list.entries.len();
        list.entries.retain(|e| {
            let keep = !e.listener.same(listener);
            if !keep {
                e.retire();
            }
            keep
        });
        let removed = before - list.entries.len();
        let empty = list.entries.is_empty();

        if empty {
            lists.remove(key);
        }
        if removed > 0 {
            tracing::debug!(key, removed, "listener unsubscribed");
        }
    }

    /// Remove the entry registered under `id`. Returns false if it is gone.
    pub fn cancel(&self, key: &str, id: ListenerId) -> bool {
        remove_entry(&self.lists, key, id)
    }

    /// Invoke every listener whose key matches `event`
    pub fn dispatch(
        &self,
        event: &str,
        payload: Option<&P>,
    ) -> Result<DispatchReport, DispatchError> {
        let targets = self.targets(event);
        tracing::trace!(event, keys = targets.len(), "dispatching event");

        let mut report = DispatchReport::default();
        for (key, entries) in &targets {
            for entry in entries {
                // Removed by an earlier listener in this dispatch
                if !entry.is_alive() {
                    continue;
                }

                report.invoked += 1;
                let Err(error) = entry.listener.call(payload) else {
                    continue;
                };

                match self.config.fault_policy {
                    FaultPolicy::Propagate => {
                        return Err(DispatchError::Listener {
                            event: event.to_string(),
                            key: key.clone(),
                            id: entry.id,
                            source: error,
                        });
                    }
                    FaultPolicy::Isolate => {
                        report.faults += 1;
                        self.report_fault(&ListenerFault {
                            event,
                            key,
                            id: entry.id,
                            error: &error,
                        });
                    }
                }
            }
        }

        Ok(report)
    }

    /// Number of entries stored under exactly `key`
    pub fn listener_count(&self, key: &str) -> usize {
        self.read().get(key).map_or(0, |list| list.entries.len())
    }

    pub fn clear_event(&self, key: &str) {
        if let Some(list) = self.write().remove(key) {
            list.retire_all();
            tracing::debug!(key, removed = list.entries.len(), "event cleared");
        }
    }

    pub fn clear_all(&self) {
        let mut lists = self.write();
        lists.values().for_each(ListenerList::retire_all);
        lists.clear();
        drop(lists);
        tracing::debug!("registry cleared");
    }

    /// Registered keys, sorted
    pub fn event_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn total_listener_count(&self) -> usize {
        self.read().values().map(|list| list.entries.len()).sum()
    }

    /// Whether dispatching `event` would invoke at least one listener
    pub fn has_listeners(&self, event: &str) -> bool {
        self.read()
            .values()
            .any(|list| list.pattern.matches(event))
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, key: String, id: ListenerId, listener: Listener<P>) {
        let mut lists = self.write();
        let size_limit = self.config.pattern_size_limit.unwrap_or(DEFAULT_SIZE_LIMIT);
        let list = lists
            .entry(key)
            .or_insert_with_key(|key| ListenerList::new(key, size_limit));
        list.entries.push(Entry::new(id, listener));

        let count = list.entries.len();
        tracing::debug!(key = list.pattern.as_str(), %id, count, "listener subscribed");

        if let Some(max) = self.config.max_listeners {
            if count > max && !list.over_capacity {
                list.over_capacity = true;
                tracing::warn!(
                    key = list.pattern.as_str(),
                    count,
                    max,
                    "listener count exceeds limit, possible leak"
                );
            }
        }
    }

    /// Snapshot the entries to run: the exact key first, then matching patterns
    fn targets(&self, event: &str) -> Vec<(String, Vec<Entry<P>>)> {
        let lists = self.read();
        let mut targets = Vec::new();

        if let Some(list) = lists.get(event) {
            targets.push((event.to_string(), list.entries.clone()));
        }

        for (key, list) in lists.iter() {
            // The exact key was taken above
            if key != event && list.pattern.matches(event) {
                targets.push((key.clone(), list.entries.clone()));
            }
        }

        targets
    }

    fn report_fault(&self, fault: &ListenerFault<'_>) {
        tracing::warn!(
            event = fault.event,
            key = fault.key,
            id = %fault.id,
            error = %fault.error,
            "listener failed"
        );

        let handler = self
            .fault_handler
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(handler) = handler {
            handler(fault);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ListenerList<P>>> {
        self.lists.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ListenerList<P>>> {
        self.lists.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn remove_entry<P>(lists: &Lists<P>, key: &str, id: ListenerId) -> bool {
    let mut lists = lists.write().unwrap_or_else(|e| e.into_inner());
    let Some(list) = lists.get_mut(key) else {
        return false;
    };

    let before = list.entries.len();
    list.entries.retain(|e| {
        let keep = e.id != id;
        if !keep {
            e.retire();
        }
        keep
    });
    let removed = list.entries.len() < before;
    let empty = list.entries.is_empty();

    if empty {
        lists.remove(key);
    }
    if removed {
        tracing::debug!(key, %id, "listener removed");
    }
    removed
}

impl<P> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for Registry<P> {
    fn clone(&self) -> Self {
        Self {
            lists: Arc::clone(&self.lists),
            next_id: Arc::clone(&self.next_id),
            config: self.config.clone(),
            fault_handler: Arc::clone(&self.fault_handler),
        }
    }
}

impl<P> fmt::Debug for Registry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.event_keys())
            .field("listeners", &self.total_listener_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
