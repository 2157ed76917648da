// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Mapping of classify tables and of the graph nodes they send packets to.

#![deny(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod context;
pub mod dump;
pub mod node;
pub mod resolver;
pub mod session;
pub mod table;

pub use context::{TableRecord, VppClassifierContextManager};
pub use node::{PacketHandlingAction, VppNode};
pub use resolver::NodeResolver;
pub use session::{ClassifySessionReader, ClassifySessionWriter, Session, SessionBuilder};
pub use table::{ClassifyTableReader, ClassifyTableWriter, Table, TableBuilder, TableState};
