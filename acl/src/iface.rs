// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! ACLs applied to interfaces.
//!
//! The dataplane reports the standard ACLs of an interface as one list: the first `n_input`
//! entries apply to ingress traffic, the rest to egress traffic. A MAC-IP ACL applies to ingress
//! only, and an interface has at most one, reported by a single call for all interfaces at once.
//! In both cases, `~0` marks a slot with no ACL.

use crate::dump::{AclInterfaceListDump, MacipAclDump, MacipAclInterfaceGet};
use crate::manager::AclContextManager;
use derive_builder::Builder;
use handle::Handle;
use handle::kind::SwInterface;
use naming::{MappingError, MappingResult, NamingContext, reply_for_read, reply_for_write};
use std::sync::Arc;
use store::{MappingStore, TxContext};
use tracing::debug;
use vppapi::{AclApi, AclInterfaceSetAclList};

/// The standard ACLs of an interface, by direction.
#[derive(Builder, Clone, Debug, Default, PartialEq, Eq)]
#[builder(setter(into))]
pub struct AclInterfaceAssignment {
    pub interface: String,
    #[builder(default)]
    pub ingress: Vec<String>,
    #[builder(default)]
    pub egress: Vec<String>,
}

/// Reads the ACLs applied to interfaces.
pub struct InterfaceAclReader<A: ?Sized> {
    api: Arc<A>,
    interfaces: NamingContext<SwInterface>,
    acls: AclContextManager,
}

impl<A: AclApi + ?Sized> InterfaceAclReader<A> {
    pub fn new(api: Arc<A>, interfaces: NamingContext<SwInterface>, acls: AclContextManager) -> Self {
        Self {
            api,
            interfaces,
            acls,
        }
    }

    /// Names of the standard ACLs applied to `interface`, ingress first.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if `interface` is not mapped, or a read error if the dataplane
    /// could not be dumped.
    pub fn standard_acls<S: MappingStore>(
        &self,
        interface: &str,
        tx: &mut TxContext<S>,
    ) -> MappingResult<(Vec<String>, Vec<String>)> {
        let sw_if_index = self.interfaces.get_index(interface, tx.mapping())?;
        let dump = tx
            .cache_mut()
            .get_or_dump::<AclInterfaceListDump, _>(&sw_if_index.into_raw(), |sw_if_index| {
                reply_for_read(
                    self.api.acl_interface_list_dump(*sw_if_index),
                    &format!("read ACLs of interface {interface}"),
                )
            })?;
        // one interface was asked for, one is reported
        let Some(details) = dump.first() else {
            return Ok((vec![], vec![]));
        };
        let n_input = usize::from(details.n_input).min(details.acls.len());
        let (ingress, egress) = details.acls.split_at(n_input);
        Ok((
            self.names_of(ingress, tx.mapping_mut())?,
            self.names_of(egress, tx.mapping_mut())?,
        ))
    }

    fn names_of<S: MappingStore + ?Sized>(
        &self,
        raw: &[u32],
        store: &mut S,
    ) -> MappingResult<Vec<String>> {
        raw.iter()
            .filter_map(|raw| Handle::try_from_raw(*raw))
            .map(|index| self.acls.standard().get_acl_name(index, store))
            .collect()
    }

    /// Names of the standard ACLs applied to ingress traffic of `interface`.
    pub fn ingress_acls<S: MappingStore>(
        &self,
        interface: &str,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Vec<String>> {
        Ok(self.standard_acls(interface, tx)?.0)
    }

    /// Names of the standard ACLs applied to egress traffic of `interface`.
    pub fn egress_acls<S: MappingStore>(
        &self,
        interface: &str,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Vec<String>> {
        Ok(self.standard_acls(interface, tx)?.1)
    }

    /// Name of the MAC-IP ACL applied to `interface`, if any.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if `interface` is not mapped, [`MappingError::IllegalState`] if
    /// the interface refers to a MAC-IP ACL the dataplane does not have.
    pub fn macip_acl<S: MappingStore>(
        &self,
        interface: &str,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Option<String>> {
        let sw_if_index = self.interfaces.get_index(interface, tx.mapping())?;
        let assigned = tx
            .cache_mut()
            .get_or_dump::<MacipAclInterfaceGet, _>(&(), |()| {
                reply_for_read(
                    self.api.macip_acl_interface_get(),
                    "read MAC-IP ACLs of interfaces",
                )
            })?;
        let raw = usize::try_from(sw_if_index.into_raw())
            .ok()
            .filter(|slot| *slot < assigned.count as usize)
            .and_then(|slot| assigned.acls.get(slot).copied());
        let Some(acl_index) = raw.and_then(Handle::try_from_raw) else {
            debug!("No MAC-IP ACL applied to interface {interface} ({sw_if_index})");
            return Ok(None);
        };
        let acl = tx
            .cache_mut()
            .get_or_dump::<MacipAclDump, _>(&acl_index.into_raw(), |acl_index| {
                reply_for_read(
                    self.api.macip_acl_dump(*acl_index),
                    &format!("read MAC-IP ACL {acl_index}"),
                )
            })?;
        if acl.is_empty() {
            return Err(MappingError::IllegalState(format!(
                "Interface {interface} refers to MAC-IP ACL {acl_index}, which does not exist"
            )));
        }
        Ok(Some(self.acls.macip().get_acl_name(acl_index, tx.mapping_mut())?))
    }
}

/// Applies ACLs to interfaces.
pub struct InterfaceAclWriter<A: ?Sized> {
    api: Arc<A>,
    interfaces: NamingContext<SwInterface>,
    acls: AclContextManager,
}

impl<A: AclApi + ?Sized> InterfaceAclWriter<A> {
    pub fn new(api: Arc<A>, interfaces: NamingContext<SwInterface>, acls: AclContextManager) -> Self {
        Self {
            api,
            interfaces,
            acls,
        }
    }

    fn request<S: MappingStore + ?Sized>(
        &self,
        assignment: &AclInterfaceAssignment,
        store: &S,
    ) -> MappingResult<AclInterfaceSetAclList> {
        let sw_if_index = self.interfaces.get_index(&assignment.interface, store)?;
        let n_input = u8::try_from(assignment.ingress.len()).map_err(|_| {
            MappingError::InvalidArgument(format!(
                "Too many ingress ACLs on interface {}: {}",
                assignment.interface,
                assignment.ingress.len()
            ))
        })?;
        let acls = assignment
            .ingress
            .iter()
            .chain(&assignment.egress)
            .map(|name| {
                self.acls
                    .standard()
                    .get_acl_index(name, store)
                    .map(Handle::into_raw)
            })
            .collect::<MappingResult<Vec<u32>>>()?;
        Ok(AclInterfaceSetAclList {
            sw_if_index: sw_if_index.into_raw(),
            n_input,
            acls,
        })
    }

    fn send(&self, request: &AclInterfaceSetAclList, interface: &str) -> MappingResult<()> {
        debug!(
            "Applying ACLs {:?} ({} ingress) to interface {interface}",
            request.acls, request.n_input
        );
        reply_for_write(
            self.api.acl_interface_set_acl_list(request),
            &format!("apply ACLs to interface {interface}"),
        )
    }

    /// Apply the ACLs of `assignment` to its interface.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if the interface or one of the ACLs is not mapped,
    /// [`MappingError::WriteFailed`] if the dataplane call fails.
    pub fn write<S: MappingStore + ?Sized>(
        &self,
        assignment: &AclInterfaceAssignment,
        store: &S,
    ) -> MappingResult<()> {
        let request = self.request(assignment, store)?;
        self.send(&request, &assignment.interface)
    }

    /// Replace the ACLs of an interface. The dataplane replaces the whole list at once.
    pub fn update<S: MappingStore + ?Sized>(
        &self,
        after: &AclInterfaceAssignment,
        store: &S,
    ) -> MappingResult<()> {
        self.write(after, store)
    }

    /// Remove every standard ACL of the interface of `before`.
    pub fn delete<S: MappingStore + ?Sized>(
        &self,
        before: &AclInterfaceAssignment,
        store: &S,
    ) -> MappingResult<()> {
        let cleared = AclInterfaceAssignment {
            interface: before.interface.clone(),
            ..Default::default()
        };
        self.write(&cleared, store)
    }

    fn macip_add_del<S: MappingStore + ?Sized>(
        &self,
        is_add: bool,
        interface: &str,
        acl_name: &str,
        store: &S,
    ) -> MappingResult<()> {
        let sw_if_index = self.interfaces.get_index(interface, store)?;
        let acl_index = self.acls.macip().get_acl_index(acl_name, store)?;
        reply_for_write(
            self.api
                .macip_acl_interface_add_del(is_add, sw_if_index.into_raw(), acl_index.into_raw()),
            &format!("apply MAC-IP ACL {acl_name} to interface {interface}"),
        )
    }

    /// Apply MAC-IP ACL `acl_name` to `interface`.
    pub fn assign_macip<S: MappingStore + ?Sized>(
        &self,
        interface: &str,
        acl_name: &str,
        store: &S,
    ) -> MappingResult<()> {
        self.macip_add_del(true, interface, acl_name, store)
    }

    /// Remove MAC-IP ACL `acl_name` from `interface`.
    pub fn unassign_macip<S: MappingStore + ?Sized>(
        &self,
        interface: &str,
        acl_name: &str,
        store: &S,
    ) -> MappingResult<()> {
        self.macip_add_del(false, interface, acl_name, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::AclIndex;
    use config::ContextsConfig;
    use pretty_assertions::assert_eq;
    use store::{MappingStore, MemoryStore};
    use vppapi::{AclAddReplace, FakeVpp, MacipAclAdd, NOT_ASSIGNED};

    struct Fixture {
        vpp: Arc<FakeVpp>,
        reader: InterfaceAclReader<FakeVpp>,
        writer: InterfaceAclWriter<FakeVpp>,
        interfaces: NamingContext<SwInterface>,
        acls: AclContextManager,
    }

    fn fixture() -> Fixture {
        let config = ContextsConfig::default();
        let vpp = Arc::new(FakeVpp::new());
        let interfaces = NamingContext::from_config(&config.interface);
        let acls = AclContextManager::from_config(&config);
        Fixture {
            reader: InterfaceAclReader::new(vpp.clone(), interfaces.clone(), acls.clone()),
            writer: InterfaceAclWriter::new(vpp.clone(), interfaces.clone(), acls.clone()),
            vpp,
            interfaces,
            acls,
        }
    }

    fn new_acl(vpp: &FakeVpp) -> u32 {
        vpp.acl_add_replace(&AclAddReplace {
            acl_index: NOT_ASSIGNED,
            tag: String::new(),
            rules: vec![],
        })
        .unwrap()
        .acl_index
    }

    fn map_interface<S: MappingStore>(f: &Fixture, name: &str, tx: &mut TxContext<S>) -> u32 {
        let sw_if_index = f.vpp.add_interface(name);
        f.interfaces
            .add_name(Handle::from_raw(sw_if_index), name, tx.mapping_mut())
            .unwrap();
        sw_if_index
    }

    #[test]
    fn assignment_list_is_partitioned_by_n_input() {
        let f = fixture();
        let mut tx = TxContext::new(MemoryStore::new().begin());
        let eth0 = map_interface(&f, "eth0", &mut tx);
        let indices: Vec<u32> = (0..4).map(|_| new_acl(&f.vpp)).collect();
        for (i, index) in indices.iter().enumerate() {
            f.acls
                .add_acl(
                    AclIndex::Standard(Handle::from_raw(*index)),
                    &format!("acl{i}"),
                    &[],
                    tx.mapping_mut(),
                )
                .unwrap();
        }
        f.vpp.set_interface_acls(eth0, 2, &indices);

        assert_eq!(f.reader.ingress_acls("eth0", &mut tx).unwrap(), vec!["acl0", "acl1"]);
        assert_eq!(f.reader.egress_acls("eth0", &mut tx).unwrap(), vec!["acl2", "acl3"]);
        // both directions came from one dump
        assert_eq!(f.vpp.calls("acl_interface_list_dump"), 1);
    }

    #[test]
    fn sentinel_slots_are_skipped() {
        let f = fixture();
        let mut tx = TxContext::new(MemoryStore::new().begin());
        let eth0 = map_interface(&f, "eth0", &mut tx);
        let acl = new_acl(&f.vpp);
        f.vpp
            .set_interface_acls(eth0, 2, &[NOT_ASSIGNED, acl, NOT_ASSIGNED]);
        let (ingress, egress) = f.reader.standard_acls("eth0", &mut tx).unwrap();
        assert_eq!(ingress, vec![format!("vpp-acl-{acl}")]);
        assert!(egress.is_empty());
        // the sentinel is never given a name
        assert_eq!(
            f.acls.standard().names().mappings(tx.mapping()).unwrap().len(),
            1
        );
    }

    #[test]
    fn interface_without_acls_reads_empty() {
        let f = fixture();
        let mut tx = TxContext::new(MemoryStore::new().begin());
        map_interface(&f, "eth0", &mut tx);
        assert_eq!(
            f.reader.standard_acls("eth0", &mut tx).unwrap(),
            (vec![], vec![])
        );
        assert_eq!(f.reader.macip_acl("eth0", &mut tx).unwrap(), None);
    }

    #[test]
    fn unmapped_interface_is_not_found() {
        let f = fixture();
        let mut tx = TxContext::new(MemoryStore::new().begin());
        assert!(f.reader.ingress_acls("eth9", &mut tx).unwrap_err().is_not_found());
    }

    #[test]
    fn macip_acl_is_read_with_one_call_for_all_interfaces() {
        let f = fixture();
        let mut tx = TxContext::new(MemoryStore::new().begin());
        map_interface(&f, "eth0", &mut tx);
        let eth1 = map_interface(&f, "eth1", &mut tx);
        let acl = f
            .vpp
            .macip_acl_add(&MacipAclAdd {
                tag: String::new(),
                rules: vec![],
            })
            .unwrap()
            .acl_index;
        f.acls
            .add_acl(AclIndex::MacIp(Handle::from_raw(acl)), "mac", &[], tx.mapping_mut())
            .unwrap();
        f.vpp.macip_acl_interface_add_del(true, eth1, acl).unwrap();

        assert_eq!(f.reader.macip_acl("eth0", &mut tx).unwrap(), None);
        assert_eq!(f.reader.macip_acl("eth1", &mut tx).unwrap(), Some("mac".to_owned()));
        assert_eq!(f.vpp.calls("macip_acl_interface_get"), 1);
    }

    #[test]
    fn write_sends_ingress_then_egress() {
        let f = fixture();
        let mut tx = TxContext::new(MemoryStore::new().begin());
        let eth0 = map_interface(&f, "eth0", &mut tx);
        for name in ["in0", "in1", "out0"] {
            let index = new_acl(&f.vpp);
            f.acls
                .add_acl(AclIndex::Standard(Handle::from_raw(index)), name, &[], tx.mapping_mut())
                .unwrap();
        }
        let assignment = AclInterfaceAssignmentBuilder::default()
            .interface("eth0")
            .ingress(vec!["in0".to_owned(), "in1".to_owned()])
            .egress(vec!["out0".to_owned()])
            .build()
            .unwrap();
        f.writer.write(&assignment, tx.mapping()).unwrap();
        let applied = f.vpp.acl_interface_list_dump(eth0).unwrap();
        assert_eq!(applied[0].n_input, 2);
        assert_eq!(applied[0].acls, vec![0, 1, 2]);

        f.writer.delete(&assignment, tx.mapping()).unwrap();
        assert!(f.vpp.acl_interface_list_dump(eth0).unwrap().is_empty());
    }

    #[test]
    fn write_with_unknown_acl_fails_before_calling() {
        let f = fixture();
        let mut tx = TxContext::new(MemoryStore::new().begin());
        map_interface(&f, "eth0", &mut tx);
        let assignment = AclInterfaceAssignmentBuilder::default()
            .interface("eth0")
            .ingress(vec!["nope".to_owned()])
            .build()
            .unwrap();
        assert!(f.writer.write(&assignment, tx.mapping()).unwrap_err().is_not_found());
        assert_eq!(f.vpp.calls("acl_interface_set_acl_list"), 0);
    }
}
