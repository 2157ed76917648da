// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Creation and deletion of ACLs.
//!
//! The dataplane picks the index of every ACL it creates. Writers map the name of the ACL to that
//! index right after creation, and resolve the name back to the index for every later change.

use crate::manager::{AclContextManager, AclIndex};
use handle::Handle;
use naming::{MappingError, MappingResult, reply_for_write};
use std::sync::Arc;
use store::MappingStore;
use tracing::debug;
use vppapi::{AclApi, AclAddReplace, AclRule, MacipAclAdd, MacipAclRule, NOT_ASSIGNED};

fn refuse_taken<S: MappingStore + ?Sized>(
    acls: &AclContextManager,
    name: &str,
    store: &S,
) -> MappingResult<()> {
    match acls.kind_of(name, store)? {
        Some(kind) => Err(MappingError::InvalidArgument(format!(
            "ACL name {name} is already used by a {kind} ACL"
        ))),
        None => Ok(()),
    }
}

fn split_rules<R>(rules: Vec<(String, R)>) -> (Vec<String>, Vec<R>) {
    rules.into_iter().unzip()
}

/// Writes standard (L3/L4) ACLs.
pub struct StandardAclWriter<A: ?Sized> {
    api: Arc<A>,
    acls: AclContextManager,
}

impl<A: AclApi + ?Sized> StandardAclWriter<A> {
    pub fn new(api: Arc<A>, acls: AclContextManager) -> Self {
        Self { api, acls }
    }

    /// Create ACL `name` out of `rules`, given with their names, in order.
    ///
    /// # Errors
    ///
    /// [`MappingError::InvalidArgument`] if `name` is already used by an ACL of either kind,
    /// [`MappingError::WriteFailed`] if the dataplane refuses the ACL.
    pub fn create<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        tag: &str,
        rules: Vec<(String, AclRule)>,
        store: &mut S,
    ) -> MappingResult<Handle<handle::kind::StandardAcl>> {
        refuse_taken(&self.acls, name, store)?;
        let (ace_names, rules) = split_rules(rules);
        let reply = reply_for_write(
            self.api.acl_add_replace(&AclAddReplace {
                acl_index: NOT_ASSIGNED,
                tag: tag.to_owned(),
                rules,
            }),
            &format!("create ACL {name}"),
        )?;
        let index = Handle::from_raw(reply.acl_index);
        debug!("Created ACL {name} at {index}");
        self.acls
            .add_acl(AclIndex::Standard(index), name, &ace_names, store)?;
        Ok(index)
    }

    /// Replace the rules of ACL `name`. The ACL keeps its index.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if `name` is not a standard ACL.
    pub fn update<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        tag: &str,
        rules: Vec<(String, AclRule)>,
        store: &mut S,
    ) -> MappingResult<()> {
        let index = self.acls.standard().get_acl_index(name, store)?;
        let (ace_names, rules) = split_rules(rules);
        reply_for_write(
            self.api.acl_add_replace(&AclAddReplace {
                acl_index: index.into_raw(),
                tag: tag.to_owned(),
                rules,
            }),
            &format!("update ACL {name}"),
        )?;
        self.acls
            .add_acl(AclIndex::Standard(index), name, &ace_names, store)
    }

    /// Delete ACL `name`.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if `name` is not a standard ACL. The mapping is kept if the
    /// dataplane fails to delete the ACL.
    pub fn delete<S: MappingStore + ?Sized>(&self, name: &str, store: &mut S) -> MappingResult<()> {
        let index = self.acls.standard().get_acl_index(name, store)?;
        reply_for_write(
            self.api.acl_del(index.into_raw()),
            &format!("delete ACL {name}"),
        )?;
        debug!("Deleted ACL {name} at {index}");
        self.acls.standard().remove_acl(name, store)
    }
}

/// Writes MAC-IP ACLs. The dataplane can not modify those, they are deleted and created again.
pub struct MacIpAclWriter<A: ?Sized> {
    api: Arc<A>,
    acls: AclContextManager,
}

impl<A: AclApi + ?Sized> MacIpAclWriter<A> {
    pub fn new(api: Arc<A>, acls: AclContextManager) -> Self {
        Self { api, acls }
    }

    /// # Errors
    ///
    /// [`MappingError::InvalidArgument`] if `name` is already used by an ACL of either kind,
    /// [`MappingError::WriteFailed`] if the dataplane refuses the ACL.
    pub fn create<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        tag: &str,
        rules: Vec<(String, MacipAclRule)>,
        store: &mut S,
    ) -> MappingResult<Handle<handle::kind::MacIpAcl>> {
        refuse_taken(&self.acls, name, store)?;
        let (ace_names, rules) = split_rules(rules);
        let reply = reply_for_write(
            self.api.macip_acl_add(&MacipAclAdd {
                tag: tag.to_owned(),
                rules,
            }),
            &format!("create MAC-IP ACL {name}"),
        )?;
        let index = Handle::from_raw(reply.acl_index);
        debug!("Created MAC-IP ACL {name} at {index}");
        self.acls
            .add_acl(AclIndex::MacIp(index), name, &ace_names, store)?;
        Ok(index)
    }

    pub fn delete<S: MappingStore + ?Sized>(&self, name: &str, store: &mut S) -> MappingResult<()> {
        let index = self.acls.macip().get_acl_index(name, store)?;
        reply_for_write(
            self.api.macip_acl_del(index.into_raw()),
            &format!("delete MAC-IP ACL {name}"),
        )?;
        debug!("Deleted MAC-IP ACL {name} at {index}");
        self.acls.macip().remove_acl(name, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ContextsConfig;
    use ipnet::IpNet;
    use pretty_assertions::assert_eq;
    use store::MemoryStore;
    use tracing_test::traced_test;
    use vppapi::{AclAction, ApiError, FakeVpp};

    fn deny_all() -> AclRule {
        AclRule {
            action: AclAction::Deny,
            src: "0.0.0.0/0".parse::<IpNet>().unwrap(),
            dst: "0.0.0.0/0".parse::<IpNet>().unwrap(),
            proto: 0,
            src_ports: (0, u16::MAX),
            dst_ports: (0, u16::MAX),
        }
    }

    fn mac_rule() -> MacipAclRule {
        MacipAclRule {
            action: AclAction::Permit,
            src_mac: [0x02, 0, 0, 0, 0, 1],
            src_mac_mask: [0xff; 6],
            src_prefix: "10.0.0.0/24".parse::<IpNet>().unwrap(),
        }
    }

    fn setup() -> (
        Arc<FakeVpp>,
        StandardAclWriter<FakeVpp>,
        MacIpAclWriter<FakeVpp>,
        AclContextManager,
    ) {
        let vpp = Arc::new(FakeVpp::new());
        let acls = AclContextManager::from_config(&ContextsConfig::default());
        (
            vpp.clone(),
            StandardAclWriter::new(vpp.clone(), acls.clone()),
            MacIpAclWriter::new(vpp, acls.clone()),
            acls,
        )
    }

    #[test]
    #[traced_test]
    fn created_acl_is_bound_to_dataplane_index() {
        let (vpp, standard, _, acls) = setup();
        let mut tx = MemoryStore::new().begin();
        let index = standard
            .create("block", "", vec![("all".to_owned(), deny_all())], &mut tx)
            .unwrap();
        assert_eq!(acls.get_acl_index("block", &tx).unwrap(), AclIndex::Standard(index));
        assert_eq!(acls.get_ace_name("block", 0, &mut tx).unwrap(), "all");
        assert_eq!(vpp.acl_dump(index.into_raw()).unwrap()[0].rules, vec![deny_all()]);
        assert!(logs_contain("Created ACL block"));
    }

    #[test]
    fn names_are_unique_across_kinds() {
        let (_, standard, macip, _) = setup();
        let mut tx = MemoryStore::new().begin();
        macip
            .create("shared", "", vec![("r".to_owned(), mac_rule())], &mut tx)
            .unwrap();
        let err = standard
            .create("shared", "", vec![], &mut tx)
            .unwrap_err();
        assert!(matches!(err, MappingError::InvalidArgument(_)));
    }

    #[test]
    fn update_keeps_index_and_renames_rules() {
        let (vpp, standard, _, acls) = setup();
        let mut tx = MemoryStore::new().begin();
        let index = standard
            .create("a", "", vec![("first".to_owned(), deny_all())], &mut tx)
            .unwrap();
        standard
            .update(
                "a",
                "v2",
                vec![
                    ("one".to_owned(), deny_all()),
                    ("two".to_owned(), deny_all()),
                ],
                &mut tx,
            )
            .unwrap();
        assert_eq!(
            acls.standard().ace_names("a", &tx).unwrap(),
            vec![(0, "one".to_owned()), (1, "two".to_owned())]
        );
        assert_eq!(vpp.acl_dump(index.into_raw()).unwrap()[0].tag, "v2");
    }

    #[test]
    fn failed_delete_keeps_mapping() {
        let (vpp, _, macip, acls) = setup();
        let mut tx = MemoryStore::new().begin();
        macip.create("m", "", vec![], &mut tx).unwrap();
        vpp.fail_next(
            "macip_acl_del",
            ApiError::Retval {
                op: "macip_acl_del",
                retval: -1,
            },
        );
        assert!(matches!(
            macip.delete("m", &mut tx),
            Err(MappingError::WriteFailed { .. })
        ));
        assert!(acls.contains_acl("m", &tx).unwrap());
        macip.delete("m", &mut tx).unwrap();
        assert!(!acls.contains_acl("m", &tx).unwrap());
    }

    #[test]
    fn deleted_index_is_reused_by_next_acl() {
        let (_, standard, _, acls) = setup();
        let mut tx = MemoryStore::new().begin();
        let first = standard.create("old", "", vec![], &mut tx).unwrap();
        standard.delete("old", &mut tx).unwrap();
        let second = standard.create("new", "", vec![], &mut tx).unwrap();
        assert_eq!(first, second);
        assert!(acls.get_acl_index("old", &tx).unwrap_err().is_not_found());
        assert_eq!(
            acls.get_acl_name(AclIndex::Standard(second), &mut tx).unwrap(),
            "new"
        );
    }
}
