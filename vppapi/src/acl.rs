// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! ACL plugin messages.
//!
//! Standard ACLs and MAC-IP ACLs are allocated from two independent pools: the same index may
//! designate one object of each kind at the same time.

use crate::ApiResult;
use ipnet::IpNet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AclAction {
    Deny = 0,
    Permit = 1,
    PermitReflect = 2,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AclRule {
    pub action: AclAction,
    pub src: IpNet,
    pub dst: IpNet,
    pub proto: u8,
    pub src_ports: (u16, u16),
    pub dst_ports: (u16, u16),
}

/// Create an ACL (`acl_index` is `~0`) or replace the rules of an existing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AclAddReplace {
    pub acl_index: u32,
    pub tag: String,
    pub rules: Vec<AclRule>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AclAddReplaceReply {
    pub acl_index: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AclDetails {
    pub acl_index: u32,
    pub tag: String,
    pub rules: Vec<AclRule>,
}

/// The ACLs applied to one interface. The first `n_input` entries apply to ingress, the rest to
/// egress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AclInterfaceListDetails {
    pub sw_if_index: u32,
    pub n_input: u8,
    pub acls: Vec<u32>,
}

/// Replace the ACLs applied to one interface. Same layout as [`AclInterfaceListDetails`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AclInterfaceSetAclList {
    pub sw_if_index: u32,
    pub n_input: u8,
    pub acls: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacipAclRule {
    pub action: AclAction,
    pub src_mac: [u8; 6],
    pub src_mac_mask: [u8; 6],
    pub src_prefix: IpNet,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacipAclAdd {
    pub tag: String,
    pub rules: Vec<MacipAclRule>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MacipAclAddReply {
    pub acl_index: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacipAclDetails {
    pub acl_index: u32,
    pub tag: String,
    pub rules: Vec<MacipAclRule>,
}

/// The MAC-IP ACL applied to every interface: `acls[sw_if_index]`, `~0` where none is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MacipAclInterfaceGetReply {
    pub count: u32,
    pub acls: Vec<u32>,
}

pub trait AclApi {
    fn acl_add_replace(&self, request: &AclAddReplace) -> ApiResult<AclAddReplaceReply>;

    fn acl_del(&self, acl_index: u32) -> ApiResult<()>;

    /// Dump one ACL, or all of them if `acl_index` is `~0`.
    fn acl_dump(&self, acl_index: u32) -> ApiResult<Vec<AclDetails>>;

    /// Dump the ACLs of one interface, or of all of them if `sw_if_index` is `~0`.
    fn acl_interface_list_dump(&self, sw_if_index: u32)
    -> ApiResult<Vec<AclInterfaceListDetails>>;

    fn acl_interface_set_acl_list(&self, request: &AclInterfaceSetAclList) -> ApiResult<()>;

    fn macip_acl_add(&self, request: &MacipAclAdd) -> ApiResult<MacipAclAddReply>;

    fn macip_acl_del(&self, acl_index: u32) -> ApiResult<()>;

    /// Dump one MAC-IP ACL, or all of them if `acl_index` is `~0`.
    fn macip_acl_dump(&self, acl_index: u32) -> ApiResult<Vec<MacipAclDetails>>;

    fn macip_acl_interface_add_del(
        &self,
        is_add: bool,
        sw_if_index: u32,
        acl_index: u32,
    ) -> ApiResult<()>;

    fn macip_acl_interface_get(&self) -> ApiResult<MacipAclInterfaceGetReply>;
}
