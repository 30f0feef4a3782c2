// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events system for decoupling components within a process
//!
//! This module provides:
//! - `Registry` - Store listeners per key and dispatch events to them
//! - `Listener` - Identity-comparable callback
//! - `EventPattern` - Wildcard matching for subscription keys

mod listener;
mod pattern;
mod registry;

pub use listener::{Listener, ListenerError, ListenerFn, ListenerId};
pub use pattern::{is_wildcard, EventPattern, PatternError, ANY_ONE, ANY_RUN, DEFAULT_SIZE_LIMIT};
pub use registry::{DispatchError, DispatchReport, FaultHandler, ListenerFault, Registry};
