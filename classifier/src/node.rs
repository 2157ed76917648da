// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Where a classify table sends packets.

use std::fmt::Display;

/// Well-known next indices, valid in any classify table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PacketHandlingAction {
    Deny = 0,
    Permit = u32::MAX,
}

impl PacketHandlingAction {
    #[must_use]
    pub const fn value(self) -> u32 {
        self as u32
    }

    /// The action `value` stands for, if any.
    #[must_use]
    pub const fn from_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(PacketHandlingAction::Deny),
            u32::MAX => Some(PacketHandlingAction::Permit),
            _ => None,
        }
    }
}

impl Display for PacketHandlingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketHandlingAction::Deny => write!(f, "deny"),
            PacketHandlingAction::Permit => write!(f, "permit"),
        }
    }
}

/// The next node of a classify table (miss next) or session (hit next).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VppNode {
    Action(PacketHandlingAction),
    /// A graph node, by name. Relative to the classifier node of the table.
    Named(String),
    /// A relative index nobody ever named.
    Index(u32),
}

impl VppNode {
    #[must_use]
    pub fn named(name: &str) -> Self {
        VppNode::Named(name.to_owned())
    }
}

impl From<PacketHandlingAction> for VppNode {
    fn from(action: PacketHandlingAction) -> Self {
        VppNode::Action(action)
    }
}

impl Display for VppNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VppNode::Action(action) => action.fmt(f),
            VppNode::Named(name) => write!(f, "{name}"),
            VppNode::Index(index) => write!(f, "#{index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_roundtrip_their_values() {
        for action in [PacketHandlingAction::Deny, PacketHandlingAction::Permit] {
            assert_eq!(PacketHandlingAction::from_value(action.value()), Some(action));
        }
        assert_eq!(PacketHandlingAction::from_value(1), None);
        assert_eq!(PacketHandlingAction::Permit.value(), vppapi::NOT_ASSIGNED);
    }
}
