// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Mapping of the ACLs of one dataplane pool, and of their rules.

use config::ContextConfig;
use handle::Handle;
use naming::{Mapping, MappingResult, NamingContext};
use store::{MappingPath, MappingStore, MappingStoreExt};
#[allow(unused)]
use tracing::{debug, trace};

/// Names of the ACLs of one pool (`T`), and names of their entries (ACEs).
///
/// ACL records are those of a [`NamingContext`]. The rules of an ACL are identified by their
/// position in the ACL; their names live at `<instance name>/aces/<acl name>/<position>`.
pub struct AclContext<T: ?Sized> {
    names: NamingContext<T>,
}

impl<T: ?Sized> Clone for AclContext<T> {
    fn clone(&self) -> Self {
        Self {
            names: self.names.clone(),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for AclContext<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AclContext").field(&self.names).finish()
    }
}

impl<T: ?Sized> AclContext<T> {
    #[must_use]
    pub fn new(instance_name: &str, artificial_name_prefix: &str) -> Self {
        Self {
            names: NamingContext::new(instance_name, artificial_name_prefix),
        }
    }

    #[must_use]
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            names: NamingContext::from_config(config),
        }
    }

    /// The ACL name mappings.
    #[must_use]
    pub fn names(&self) -> &NamingContext<T> {
        &self.names
    }

    fn aces_root(&self, acl_name: &str) -> MappingPath {
        MappingPath::root(self.names.instance_name())
            .child("aces")
            .child(acl_name)
    }

    fn artificial_ace_name(&self, position: u32) -> String {
        format!("{}rule{position}", self.names.artificial_name_prefix())
    }

    /// Map `name` to the ACL the dataplane created at `index`, naming its rules in order.
    ///
    /// A name formerly mapped to `index` is unmapped, along with its rules.
    pub fn add_acl<S: MappingStore + ?Sized>(
        &self,
        index: Handle<T>,
        name: &str,
        ace_names: &[String],
        store: &mut S,
    ) -> MappingResult<()> {
        for evicted in self.names.bind_created(index, name, store)? {
            store.delete_all(&self.aces_root(&evicted))?;
        }
        store.delete_all(&self.aces_root(name))?;
        for (position, ace_name) in (0u32..).zip(ace_names) {
            store.put_record(
                &self.aces_root(name).child(position.to_string()),
                &Mapping::new(ace_name, position),
            )?;
        }
        Ok(())
    }

    pub fn contains_acl<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<bool> {
        self.names.contains_index(name, store)
    }

    /// # Errors
    ///
    /// [`naming::MappingError::NotFound`] if `name` is not mapped.
    pub fn get_acl_index<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<Handle<T>> {
        self.names.get_index(name, store)
    }

    /// The name of the ACL at `index`, made up if it has none.
    pub fn get_acl_name<S: MappingStore + ?Sized>(
        &self,
        index: Handle<T>,
        store: &mut S,
    ) -> MappingResult<String> {
        self.names.get_name(index, store)
    }

    /// Unmap `name` and its rules. Won't fail if not mapped.
    pub fn remove_acl<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &mut S,
    ) -> MappingResult<()> {
        self.names.remove_name(name, store)?;
        store.delete_all(&self.aces_root(name))?;
        Ok(())
    }

    /// The name of the rule at `position` in ACL `acl_name`.
    ///
    /// If the rule has no name, one is made up from the prefix of this context, `rule`, and the
    /// position, and remembered.
    pub fn get_ace_name<S: MappingStore + ?Sized>(
        &self,
        acl_name: &str,
        position: u32,
        store: &mut S,
    ) -> MappingResult<String> {
        let path = self.aces_root(acl_name).child(position.to_string());
        if let Some(ace) = store.read_record::<Mapping>(&path)? {
            return Ok(ace.name);
        }
        let name = self.artificial_ace_name(position);
        debug!("Naming rule {position} of ACL {acl_name} {name}");
        store.put_record(&path, &Mapping::new(&name, position))?;
        Ok(name)
    }

    /// The named rules of ACL `acl_name`, ordered by position.
    pub fn ace_names<S: MappingStore + ?Sized>(
        &self,
        acl_name: &str,
        store: &S,
    ) -> MappingResult<Vec<(u32, String)>> {
        let mut aces: Vec<(u32, String)> = store
            .list_records::<Mapping>(&self.aces_root(acl_name))?
            .into_iter()
            .map(|(_, ace)| (ace.index, ace.name))
            .collect();
        aces.sort_unstable();
        Ok(aces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handle::kind::StandardAcl;
    use pretty_assertions::assert_eq;
    use store::MemoryStore;

    fn ctx() -> AclContext<StandardAcl> {
        AclContext::new("acl-context", "vpp-acl-")
    }

    #[test]
    fn rules_are_named_by_position() {
        let ctx = ctx();
        let mut tx = MemoryStore::new().begin();
        let aces: Vec<String> = (0..12).map(|i| format!("ace-{i}")).collect();
        ctx.add_acl(Handle::from_raw(4), "web", &aces, &mut tx).unwrap();
        assert_eq!(ctx.get_ace_name("web", 10, &mut tx).unwrap(), "ace-10");
        let listed = ctx.ace_names("web", &tx).unwrap();
        assert_eq!(listed.len(), 12);
        assert_eq!(listed[2], (2, "ace-2".to_owned()));
        assert_eq!(listed[11], (11, "ace-11".to_owned()));
    }

    #[test]
    fn unknown_rules_get_artificial_names() {
        let ctx = ctx();
        let mut tx = MemoryStore::new().begin();
        let name = ctx.get_acl_name(Handle::from_raw(3), &mut tx).unwrap();
        assert_eq!(name, "vpp-acl-3");
        assert_eq!(ctx.get_ace_name(&name, 0, &mut tx).unwrap(), "vpp-acl-rule0");
        assert_eq!(ctx.get_ace_name(&name, 0, &mut tx).unwrap(), "vpp-acl-rule0");
        assert_eq!(ctx.ace_names(&name, &tx).unwrap().len(), 1);
    }

    #[test]
    fn removal_drops_rules() {
        let ctx = ctx();
        let mut tx = MemoryStore::new().begin();
        ctx.add_acl(Handle::from_raw(0), "a", &["r".to_owned()], &mut tx)
            .unwrap();
        ctx.remove_acl("a", &mut tx).unwrap();
        assert!(!ctx.contains_acl("a", &tx).unwrap());
        assert!(ctx.ace_names("a", &tx).unwrap().is_empty());
        ctx.remove_acl("a", &mut tx).unwrap();
    }

    #[test]
    fn reused_index_drops_stale_acl() {
        let ctx = ctx();
        let mut tx = MemoryStore::new().begin();
        ctx.add_acl(Handle::from_raw(1), "old", &["r".to_owned()], &mut tx)
            .unwrap();
        ctx.add_acl(Handle::from_raw(1), "new", &[], &mut tx).unwrap();
        assert!(!ctx.contains_acl("old", &tx).unwrap());
        assert!(ctx.ace_names("old", &tx).unwrap().is_empty());
        assert_eq!(ctx.get_acl_name(Handle::from_raw(1), &mut tx).unwrap(), "new");
    }
}
