// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Mapping of access control lists.
//!
//! The dataplane has two kinds of ACL, standard (L3/L4) and MAC-IP, each allocated from a pool of
//! its own. This crate names them, names their rules, and translates their assignment to
//! interfaces in both directions.

#![deny(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod context;
pub mod dump;
pub mod iface;
pub mod manager;
pub mod reader;
pub mod writer;

pub use context::AclContext;
pub use iface::{
    AclInterfaceAssignment, AclInterfaceAssignmentBuilder, InterfaceAclReader, InterfaceAclWriter,
};
pub use manager::{AclContextManager, AclIndex, AclKind};
pub use reader::{AclReader, AclState};
pub use writer::{MacIpAclWriter, StandardAclWriter};
