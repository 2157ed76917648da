// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration of the mapping contexts: the instance name every context persists its records
//! under, and the prefix it uses to make up names for objects it only learns from the dataplane.

#![deny(
    unsafe_code,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::missing_errors_doc)]

pub mod contexts;
pub mod errors;

pub use contexts::{ContextConfig, ContextsConfig, ContextsConfigBuilder, MultiContextConfig}; // re-export
pub use errors::{ConfigError, ConfigResult}; // re-export
