// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPsec security association messages.

use crate::ApiResult;
use std::net::IpAddr;

/// Protocol codes as the dataplane expects them.
pub const IPSEC_PROTO_AH: u8 = 0;
pub const IPSEC_PROTO_ESP: u8 = 1;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IpsecSadAddDelEntry {
    pub is_add: bool,
    pub sad_id: u32,
    pub spi: u32,
    pub protocol: u8,
    pub crypto_algorithm: u8,
    pub crypto_key: Vec<u8>,
    pub integrity_algorithm: u8,
    pub integrity_key: Vec<u8>,
    pub use_anti_replay: bool,
    pub is_tunnel: bool,
    pub tunnel_src: Option<IpAddr>,
    pub tunnel_dst: Option<IpAddr>,
}

/// A security association as dumped. Keys are never reported back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IpsecSaDetails {
    pub sa_id: u32,
    pub spi: u32,
    pub protocol: u8,
    pub crypto_alg: u8,
    pub integ_alg: u8,
    pub use_anti_replay: bool,
    pub is_tunnel: bool,
    pub tunnel_src: Option<IpAddr>,
    pub tunnel_dst: Option<IpAddr>,
}

pub trait IpsecApi {
    fn ipsec_sad_add_del_entry(&self, request: &IpsecSadAddDelEntry) -> ApiResult<()>;

    /// Dump one SA, or all of them if `sa_id` is `~0`.
    fn ipsec_sa_dump(&self, sa_id: u32) -> ApiResult<Vec<IpsecSaDetails>>;
}
