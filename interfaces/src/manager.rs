// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Interface details, dumped at most once per transaction.
//!
//! The first reader needing all interfaces dumps them and maps every interface it learns of to a
//! name. Interfaces with no name yet (physical ports, interfaces created from the dataplane CLI)
//! get the name the dataplane gave them rather than an artificial one. The result is indexed by
//! name and kept in the dump cache, so that readers of single interfaces can use it.

use crate::dump::{InterfacesByName, SwInterfaces};
use config::ContextsConfig;
use handle::Handle;
use handle::kind::SwInterface;
use naming::{MappingResult, NamingContext, reply_for_read};
use std::collections::BTreeMap;
use std::sync::Arc;
use store::{MappingStore, TxContext};
use tracing::{debug, trace};
use vppapi::{InterfaceApi, SwInterfaceDetails, SwInterfaceDump};

pub struct InterfaceCacheDumpManager<A: ?Sized> {
    api: Arc<A>,
    interfaces: NamingContext<SwInterface>,
}

impl<A: InterfaceApi + ?Sized> InterfaceCacheDumpManager<A> {
    pub fn new(api: Arc<A>, interfaces: NamingContext<SwInterface>) -> Self {
        Self { api, interfaces }
    }

    pub fn from_config(api: Arc<A>, config: &ContextsConfig) -> Self {
        Self::new(api, NamingContext::from_config(&config.interface))
    }

    #[must_use]
    pub fn interfaces(&self) -> &NamingContext<SwInterface> {
        &self.interfaces
    }

    fn dump<S: MappingStore>(
        &self,
        request: &SwInterfaceDump,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Arc<Vec<SwInterfaceDetails>>> {
        tx.cache_mut()
            .get_or_dump::<SwInterfaces, _>(request, |request| {
                reply_for_read(self.api.sw_interface_dump(request), "dump interfaces")
            })
    }

    fn by_name<S: MappingStore>(
        &self,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Arc<BTreeMap<String, SwInterfaceDetails>>> {
        if let Some(index) = tx.cache().get::<InterfacesByName>(&()) {
            return Ok(index);
        }
        let dump = self.dump(&SwInterfaceDump::all(), tx)?;
        for detail in dump.iter() {
            let sw_if_index = Handle::from_raw(detail.sw_if_index);
            if !self.interfaces.contains_name(sw_if_index, tx.mapping())? {
                self.interfaces
                    .add_name(sw_if_index, &detail.interface_name, tx.mapping_mut())?;
            }
        }
        let mut index = BTreeMap::new();
        for detail in dump.iter() {
            let name = self
                .interfaces
                .get_name(Handle::from_raw(detail.sw_if_index), tx.mapping_mut())?;
            trace!(
                "Interface {name} (dataplane name {}) is at {}",
                detail.interface_name, detail.sw_if_index
            );
            index.insert(name, detail.clone());
        }
        Ok(tx.cache_mut().put::<InterfacesByName>((), index))
    }

    /// Every interface of the dataplane, by name.
    ///
    /// # Errors
    ///
    /// Fails if interfaces can not be dumped.
    pub fn get_interfaces<S: MappingStore>(
        &self,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Vec<(String, SwInterfaceDetails)>> {
        Ok(self
            .by_name(tx)?
            .iter()
            .map(|(name, detail)| (name.clone(), detail.clone()))
            .collect())
    }

    /// The details of interface `name`, if the dataplane has it.
    ///
    /// Uses the full dump if one was made in this transaction. Otherwise, asks the dataplane for
    /// that interface only.
    pub fn get_interface_detail<S: MappingStore>(
        &self,
        name: &str,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Option<SwInterfaceDetails>> {
        if let Some(index) = tx.cache().get::<InterfacesByName>(&()) {
            return Ok(index.get(name).cloned());
        }
        debug!("Interface {name} not in cached data, dumping it alone");
        Ok(self.dump(&SwInterfaceDump::named(name), tx)?.first().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use store::MemoryStore;
    use vppapi::FakeVpp;

    fn setup() -> (Arc<FakeVpp>, InterfaceCacheDumpManager<FakeVpp>) {
        let vpp = Arc::new(FakeVpp::new());
        let manager = InterfaceCacheDumpManager::from_config(vpp.clone(), &ContextsConfig::default());
        (vpp, manager)
    }

    #[test]
    fn unnamed_interfaces_take_the_dataplane_name() {
        let (vpp, manager) = setup();
        vpp.add_interface("local0");
        let eth = vpp.add_interface("GigabitEthernet0/8/0");
        let mut tx = TxContext::new(MemoryStore::new().begin());
        manager
            .interfaces()
            .add_name(Handle::from_raw(eth), "uplink", tx.mapping_mut())
            .unwrap();

        let names: Vec<String> = manager
            .get_interfaces(&mut tx)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["local0".to_owned(), "uplink".to_owned()]);
        assert_eq!(
            manager
                .interfaces()
                .get_index("local0", tx.mapping())
                .unwrap(),
            Handle::from_raw(0)
        );
    }

    #[test]
    fn full_dump_serves_single_lookups() {
        let (vpp, manager) = setup();
        vpp.add_interface("local0");
        vpp.add_interface("tap0");
        let mut tx = TxContext::new(MemoryStore::new().begin());
        manager.get_interfaces(&mut tx).unwrap();
        manager.get_interfaces(&mut tx).unwrap();
        let tap = manager.get_interface_detail("tap0", &mut tx).unwrap().unwrap();
        assert_eq!(tap.sw_if_index, 1);
        assert_eq!(manager.get_interface_detail("nope", &mut tx).unwrap(), None);
        assert_eq!(vpp.calls("sw_interface_dump"), 1);
    }

    #[test]
    fn single_lookup_without_full_dump_is_filtered() {
        let (vpp, manager) = setup();
        vpp.add_interface("local0");
        vpp.add_interface("tap0");
        let mut tx = TxContext::new(MemoryStore::new().begin());
        let tap = manager.get_interface_detail("tap0", &mut tx).unwrap().unwrap();
        assert_eq!(tap.interface_name, "tap0");
        manager.get_interface_detail("tap0", &mut tx).unwrap();
        assert_eq!(vpp.calls("sw_interface_dump"), 1);
        // the filtered dump does not count as the full one
        assert_eq!(manager.get_interfaces(&mut tx).unwrap().len(), 2);
        assert_eq!(vpp.calls("sw_interface_dump"), 2);
    }

    #[test]
    fn cache_is_not_shared_across_transactions() {
        let (vpp, manager) = setup();
        vpp.add_interface("local0");
        let store = MemoryStore::new();
        let mut tx = TxContext::new(store.begin());
        manager.get_interfaces(&mut tx).unwrap();
        tx.commit().unwrap();
        vpp.add_interface("tap0");
        let mut tx = TxContext::new(store.begin());
        assert_eq!(manager.get_interfaces(&mut tx).unwrap().len(), 2);
        assert_eq!(vpp.calls("sw_interface_dump"), 2);
    }
}
