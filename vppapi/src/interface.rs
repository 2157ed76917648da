// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Interface messages.

use crate::ApiResult;
use std::net::IpAddr;

/// Request to enumerate interfaces.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SwInterfaceDump {
    /// Restrict the dump to interfaces whose name contains this string.
    pub name_filter: Option<String>,
}

impl SwInterfaceDump {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name_filter: Some(name.to_owned()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwInterfaceDetails {
    pub sw_if_index: u32,
    /// The name the dataplane gave to the interface (e.g. `GigabitEthernet0/8/0`, `gre0`).
    pub interface_name: String,
    pub admin_up: bool,
    pub link_up: bool,
    pub link_mtu: u16,
}

/// The endpoints of a GRE tunnel. The dataplane identifies tunnels by them on delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GreTunnel {
    pub src: IpAddr,
    pub dst: IpAddr,
    pub outer_fib_id: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GreTunnelAddDelReply {
    pub sw_if_index: u32,
}

pub trait InterfaceApi {
    fn sw_interface_dump(&self, request: &SwInterfaceDump) -> ApiResult<Vec<SwInterfaceDetails>>;

    /// Create (`is_add`) or delete a GRE tunnel interface.
    fn gre_tunnel_add_del(&self, is_add: bool, tunnel: &GreTunnel)
    -> ApiResult<GreTunnelAddDelReply>;
}
