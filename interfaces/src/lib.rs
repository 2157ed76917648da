// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Mapping of interfaces.

#![deny(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod dump;
pub mod gre;
pub mod manager;

pub use gre::GreTunnelWriter;
pub use manager::InterfaceCacheDumpManager;
