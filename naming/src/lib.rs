// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Persistent name/index mappings.
//!
//! The management model names objects; the dataplane identifies them with small integers it
//! assigns at creation time and reuses after deletion. The contexts of this crate keep the
//! association between the two in a [`store::MappingStore`], one transaction at a time.

#![deny(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod context;
pub mod errors;
pub mod multi;

pub use context::{Mapping, NamingContext};
pub use errors::{MappingError, MappingResult, reply_for_read, reply_for_write};
pub use multi::{MultiNamingContext, SEPARATOR};
