// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener callables and their identity

use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by a fallible listener
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("{0}")]
    Failed(String),
    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ListenerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Signature stored behind every listener
pub type ListenerFn<P> = dyn Fn(Option<&P>) -> Result<(), ListenerError> + Send + Sync;

/// Handle for a single stored registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// An identity-comparable callback.
///
/// Clones share identity with the original; wrapping the same closure twice
/// produces two distinct listeners.
pub struct Listener<P>(Arc<ListenerFn<P>>);

impl<P> Listener<P> {
    /// Wrap an infallible callback
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&P>) + Send + Sync + 'static,
    {
        Self(Arc::new(move |payload| {
            f(payload);
            Ok(())
        }))
    }

    /// Wrap a callback that may fail
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(Option<&P>) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, payload: Option<&P>) -> Result<(), ListenerError> {
        (self.0)(payload)
    }

    /// True if both handles refer to the same registration callable
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Listener<serde_json::Value> {
    /// Decode JSON payloads into `T` before calling `f`.
    ///
    /// A payload that does not decode is reported as `ListenerError::Payload`.
    pub fn decoding<T, F>(f: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(Option<T>) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self::fallible(move |payload| {
            let decoded = payload.map(|value| T::deserialize(value)).transpose()?;
            f(decoded)
        })
    }
}

impl<P> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<P> PartialEq for Listener<P> {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl<P> Eq for Listener<P> {}

impl<P> fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
