// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! GRE tunnel interfaces.
//!
//! The dataplane keeps the slot of a deleted tunnel and hands it to the next tunnel created. A
//! name still mapped to that slot (e.g. the dataplane name of the former tunnel, learned while
//! reading interfaces) is dropped when the new tunnel is mapped.

use handle::Handle;
use handle::kind::SwInterface;
use naming::{MappingResult, NamingContext, reply_for_write};
use std::sync::Arc;
use store::MappingStore;
use tracing::debug;
use vppapi::{GreTunnel, InterfaceApi};

pub struct GreTunnelWriter<A: ?Sized> {
    api: Arc<A>,
    interfaces: NamingContext<SwInterface>,
}

impl<A: InterfaceApi + ?Sized> GreTunnelWriter<A> {
    pub fn new(api: Arc<A>, interfaces: NamingContext<SwInterface>) -> Self {
        Self { api, interfaces }
    }

    /// Create a tunnel and map interface name `name` to it.
    ///
    /// # Errors
    ///
    /// [`naming::MappingError::WriteFailed`] if the dataplane refuses the tunnel.
    pub fn create<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        tunnel: &GreTunnel,
        store: &mut S,
    ) -> MappingResult<Handle<SwInterface>> {
        debug!("Creating GRE tunnel {name}: {tunnel:?}");
        let reply = reply_for_write(
            self.api.gre_tunnel_add_del(true, tunnel),
            &format!("create GRE tunnel {name}"),
        )?;
        let sw_if_index = Handle::from_raw(reply.sw_if_index);
        let evicted = self.interfaces.bind_created(sw_if_index, name, store)?;
        if !evicted.is_empty() {
            debug!("GRE tunnel {name} took index {sw_if_index} over from {evicted:?}");
        }
        Ok(sw_if_index)
    }

    /// Delete tunnel interface `name`.
    ///
    /// # Errors
    ///
    /// [`naming::MappingError::NotFound`] if `name` is not mapped,
    /// [`naming::MappingError::WriteFailed`] if the dataplane fails to delete the tunnel.
    pub fn delete<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        tunnel: &GreTunnel,
        store: &mut S,
    ) -> MappingResult<()> {
        let sw_if_index = self.interfaces.get_index(name, store)?;
        reply_for_write(
            self.api.gre_tunnel_add_del(false, tunnel),
            &format!("delete GRE tunnel {name}"),
        )?;
        debug!("Deleted GRE tunnel {name} at {sw_if_index}");
        self.interfaces.remove_name(name, store)
    }
}
