// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration modules

mod registry;

pub use registry::{ConfigError, FaultPolicy, RegistryConfig};
