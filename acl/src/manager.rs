// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! One name space over the two ACL pools of the dataplane.
//!
//! Standard ACLs and MAC-IP ACLs are allocated from independent pools whose indices overlap: index
//! 3 may well designate one ACL of each kind. Names, however, are shared: an ACL name designates
//! at most one ACL, of either kind. The manager thus merges the two pools for lookups by name, and
//! never for lookups by index, for which the kind must be known (see [`AclIndex`]).

use crate::context::AclContext;
use config::ContextsConfig;
use handle::Handle;
use handle::kind::{MacIpAcl, StandardAcl};
use naming::{MappingError, MappingResult};
use std::fmt::Display;
use store::MappingStore;

/// The kinds of ACL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AclKind {
    Standard,
    MacIp,
}

impl Display for AclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AclKind::Standard => write!(f, "standard"),
            AclKind::MacIp => write!(f, "mac-ip"),
        }
    }
}

/// The index of an ACL, along with the pool it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AclIndex {
    Standard(Handle<StandardAcl>),
    MacIp(Handle<MacIpAcl>),
}

impl AclIndex {
    #[must_use]
    pub fn kind(&self) -> AclKind {
        match self {
            AclIndex::Standard(_) => AclKind::Standard,
            AclIndex::MacIp(_) => AclKind::MacIp,
        }
    }

    #[must_use]
    pub fn into_raw(self) -> u32 {
        match self {
            AclIndex::Standard(index) => index.into_raw(),
            AclIndex::MacIp(index) => index.into_raw(),
        }
    }
}

impl Display for AclIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ACL {}", self.kind(), self.into_raw())
    }
}

#[derive(Clone, Debug)]
pub struct AclContextManager {
    standard: AclContext<StandardAcl>,
    macip: AclContext<MacIpAcl>,
}

impl AclContextManager {
    #[must_use]
    pub fn new(standard: AclContext<StandardAcl>, macip: AclContext<MacIpAcl>) -> Self {
        Self { standard, macip }
    }

    #[must_use]
    pub fn from_config(config: &ContextsConfig) -> Self {
        Self::new(
            AclContext::from_config(&config.acl),
            AclContext::from_config(&config.macip_acl),
        )
    }

    #[must_use]
    pub fn standard(&self) -> &AclContext<StandardAcl> {
        &self.standard
    }

    #[must_use]
    pub fn macip(&self) -> &AclContext<MacIpAcl> {
        &self.macip
    }

    fn not_found(&self, name: &str) -> MappingError {
        MappingError::not_found(
            &format!(
                "{}+{}",
                self.standard.names().instance_name(),
                self.macip.names().instance_name()
            ),
            name,
        )
    }

    /// The kind of the ACL named `name`, if any. Standard ACLs are looked up first.
    pub fn kind_of<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<Option<AclKind>> {
        if self.standard.contains_acl(name, store)? {
            Ok(Some(AclKind::Standard))
        } else if self.macip.contains_acl(name, store)? {
            Ok(Some(AclKind::MacIp))
        } else {
            Ok(None)
        }
    }

    /// Tell if `name` designates an ACL of either kind.
    pub fn contains_acl<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<bool> {
        Ok(self.kind_of(name, store)?.is_some())
    }

    /// Resolve `name` among standard ACLs, then among MAC-IP ACLs.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if `name` designates no ACL.
    pub fn get_acl_index<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<AclIndex> {
        match self.standard.get_acl_index(name, store) {
            Ok(index) => return Ok(AclIndex::Standard(index)),
            Err(e) if !e.is_not_found() => return Err(e),
            Err(_) => {}
        }
        match self.macip.get_acl_index(name, store) {
            Ok(index) => Ok(AclIndex::MacIp(index)),
            Err(e) if e.is_not_found() => Err(self.not_found(name)),
            Err(e) => Err(e),
        }
    }

    /// The name of the ACL at `index` in the pool of its kind, made up if it has none.
    pub fn get_acl_name<S: MappingStore + ?Sized>(
        &self,
        index: AclIndex,
        store: &mut S,
    ) -> MappingResult<String> {
        match index {
            AclIndex::Standard(index) => self.standard.get_acl_name(index, store),
            AclIndex::MacIp(index) => self.macip.get_acl_name(index, store),
        }
    }

    /// The name of rule `position` of ACL `acl_name`, made up if it has none.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if `acl_name` designates no ACL.
    pub fn get_ace_name<S: MappingStore + ?Sized>(
        &self,
        acl_name: &str,
        position: u32,
        store: &mut S,
    ) -> MappingResult<String> {
        match self.kind_of(acl_name, store)? {
            Some(AclKind::Standard) => self.standard.get_ace_name(acl_name, position, store),
            Some(AclKind::MacIp) => self.macip.get_ace_name(acl_name, position, store),
            None => Err(self.not_found(acl_name)),
        }
    }

    /// Map `name` to `index` in the pool of its kind.
    pub fn add_acl<S: MappingStore + ?Sized>(
        &self,
        index: AclIndex,
        name: &str,
        ace_names: &[String],
        store: &mut S,
    ) -> MappingResult<()> {
        match index {
            AclIndex::Standard(index) => self.standard.add_acl(index, name, ace_names, store),
            AclIndex::MacIp(index) => self.macip.add_acl(index, name, ace_names, store),
        }
    }

    /// Unmap `name`, whatever its kind. Won't fail if not mapped.
    pub fn remove_acl<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &mut S,
    ) -> MappingResult<()> {
        self.standard.remove_acl(name, store)?;
        self.macip.remove_acl(name, store)
    }
}
