// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Operational state of ACLs, as read from the dataplane.

use crate::dump::{AclDump, MacipAclDump};
use crate::manager::{AclContextManager, AclIndex, AclKind};
use handle::Handle;
use naming::{MappingResult, reply_for_read};
use std::sync::Arc;
use store::{MappingStore, TxContext};
#[allow(unused)]
use tracing::{debug, trace};
use vppapi::{AclApi, AclRule, MacipAclRule, NOT_ASSIGNED};

/// An ACL and its named rules, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AclState<R> {
    pub name: String,
    pub tag: String,
    pub aces: Vec<(String, R)>,
}

pub struct AclReader<A: ?Sized> {
    api: Arc<A>,
    acls: AclContextManager,
}

impl<A: AclApi + ?Sized> AclReader<A> {
    pub fn new(api: Arc<A>, acls: AclContextManager) -> Self {
        Self { api, acls }
    }

    /// The names of every ACL of the dataplane, with their kinds. ACLs created behind the back of
    /// the management plane are given artificial names.
    ///
    /// # Errors
    ///
    /// Fails if either pool can not be dumped.
    pub fn all_acls<S: MappingStore>(
        &self,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Vec<(String, AclKind)>> {
        let standard = tx
            .cache_mut()
            .get_or_dump::<AclDump, _>(&NOT_ASSIGNED, |index| {
                reply_for_read(self.api.acl_dump(*index), "dump ACLs")
            })?;
        let macip = tx
            .cache_mut()
            .get_or_dump::<MacipAclDump, _>(&NOT_ASSIGNED, |index| {
                reply_for_read(self.api.macip_acl_dump(*index), "dump MAC-IP ACLs")
            })?;
        let indices = standard
            .iter()
            .map(|acl| AclIndex::Standard(Handle::from_raw(acl.acl_index)))
            .chain(
                macip
                    .iter()
                    .map(|acl| AclIndex::MacIp(Handle::from_raw(acl.acl_index))),
            );
        let mut names = Vec::with_capacity(standard.len() + macip.len());
        for index in indices {
            let name = self.acls.get_acl_name(index, tx.mapping_mut())?;
            trace!("{index} is {name}");
            names.push((name, index.kind()));
        }
        Ok(names)
    }

    fn named_aces<S: MappingStore, R: Clone>(
        &self,
        name: &str,
        rules: &[R],
        tx: &mut TxContext<S>,
    ) -> MappingResult<Vec<(String, R)>> {
        (0u32..)
            .zip(rules)
            .map(|(position, rule)| {
                self.acls
                    .get_ace_name(name, position, tx.mapping_mut())
                    .map(|ace| (ace, rule.clone()))
            })
            .collect()
    }

    /// Read standard ACL `name`. `None` if the dataplane does not have it.
    ///
    /// # Errors
    ///
    /// [`naming::MappingError::NotFound`] if `name` is not a standard ACL.
    pub fn read_standard<S: MappingStore>(
        &self,
        name: &str,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Option<AclState<AclRule>>> {
        let index = self.acls.standard().get_acl_index(name, tx.mapping())?;
        let dump = tx
            .cache_mut()
            .get_or_dump::<AclDump, _>(&index.into_raw(), |index| {
                reply_for_read(self.api.acl_dump(*index), &format!("read ACL {name}"))
            })?;
        let Some(acl) = dump.first() else {
            debug!("ACL {name} ({index}) is not in the dataplane");
            return Ok(None);
        };
        Ok(Some(AclState {
            name: name.to_owned(),
            tag: acl.tag.clone(),
            aces: self.named_aces(name, &acl.rules, tx)?,
        }))
    }

    /// Read MAC-IP ACL `name`. `None` if the dataplane does not have it.
    pub fn read_macip<S: MappingStore>(
        &self,
        name: &str,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Option<AclState<MacipAclRule>>> {
        let index = self.acls.macip().get_acl_index(name, tx.mapping())?;
        let dump = tx
            .cache_mut()
            .get_or_dump::<MacipAclDump, _>(&index.into_raw(), |index| {
                reply_for_read(
                    self.api.macip_acl_dump(*index),
                    &format!("read MAC-IP ACL {name}"),
                )
            })?;
        let Some(acl) = dump.first() else {
            debug!("MAC-IP ACL {name} ({index}) is not in the dataplane");
            return Ok(None);
        };
        Ok(Some(AclState {
            name: name.to_owned(),
            tag: acl.tag.clone(),
            aces: self.named_aces(name, &acl.rules, tx)?,
        }))
    }
}
