// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The dataplane (VPP) binary API, as seen by the management plane.
//!
//! This crate does not implement the wire protocol. It only declares the request/reply pairs the
//! mapping layer issues, grouped into one client trait per API area ([`InterfaceApi`],
//! [`ClassifyApi`], [`AclApi`], [`IpsecApi`]). Every call is blocking, bounded by the transport's
//! timeout, and never retried at this level.
//!
//! Fields are kept as raw `u32` indices, exactly as the dataplane sends them. Giving them a type is
//! the job of the mapping layer.

#![deny(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod acl;
mod classify;
mod errors;
mod interface;
mod ipsec;

#[cfg(any(test, feature = "testing"))]
mod fake;

pub use acl::*;
pub use classify::*;
pub use errors::{ApiError, ApiResult};
pub use interface::*;
pub use ipsec::*;

#[cfg(any(test, feature = "testing"))]
pub use fake::FakeVpp;

/// The raw value the dataplane uses for "no object" in index fields (`~0`).
pub use handle::NOT_ASSIGNED;

/// A client for every API area the mapping layer uses.
pub trait VppApi: InterfaceApi + ClassifyApi + AclApi + IpsecApi {}

impl<T: InterfaceApi + ClassifyApi + AclApi + IpsecApi + ?Sized> VppApi for T {}
