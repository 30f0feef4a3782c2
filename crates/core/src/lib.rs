// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tidings-core: in-process publish/subscribe registry
//!
//! This crate provides:
//! - A listener registry keyed by event names and wildcard patterns
//! - Synchronous dispatch with once-only subscriptions
//! - Configurable handling of failing listeners

pub mod config;
pub mod events;

// Re-exports
pub use config::{ConfigError, FaultPolicy, RegistryConfig};
pub use events::{
    DispatchError, DispatchReport, EventPattern, Listener, ListenerError, ListenerFault,
    ListenerId, PatternError, Registry,
};
