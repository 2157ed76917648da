// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPsec security associations.
//!
//! An SA is known to the dataplane by the id it was created with. Configuration knows it by its
//! direction and SPI, so the pair is mapped to the id in a [`naming::MultiNamingContext`], the
//! direction being the parent.

#![deny(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod algorithm;
pub mod dump;
pub mod sad;

pub use algorithm::{CryptoAlgorithm, IntegrityAlgorithm, UnknownAlgorithm};
pub use sad::{
    Direction, SadEntry, SadEntryBuilder, SadEntryReader, SadEntryWriter, SecurityProtocol, Tunnel,
};
