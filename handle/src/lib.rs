// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A typed dataplane handle.
//!
//! The dataplane hands out small integers (`sw_if_index`, ACL index, classify table index, ...) to
//! identify the objects it creates. Those integers live in independent spaces: "ACL 3" and
//! "MAC-IP ACL 3" are unrelated objects, and both are unrelated to "interface 3".
//!
//! The goal of this crate is to create compile-time associations between such integers and the kind
//! of object they designate, so that we can not conflate them while passing them around.
//!
//! # Example
//!
//! ```
//! # use vppctx_handle::{Handle, kind::{MacIpAcl, StandardAcl}};
//! let acl: Handle<StandardAcl> = Handle::from_raw(3);
//! let macip: Handle<MacIpAcl> = Handle::from_raw(3);
//! assert_eq!(acl.into_raw(), macip.into_raw());
//! ```
//!
//! ```rust,compile_fail
//! # use vppctx_handle::{Handle, kind::{MacIpAcl, StandardAcl}};
//! fn conflate(mut acl: Handle<StandardAcl>, macip: Handle<MacIpAcl>) {
//!     acl = macip; // <- this won't compile, and that's a good thing
//! }
//! ```

#![deny(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use core::fmt::{Debug, Formatter};
use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

#[allow(unused_imports)] // re-export
#[cfg(any(test, feature = "bolero"))]
pub use contract::*;

/// The raw value the dataplane uses to signal "no object" (`~0`).
///
/// Signed views of the same 32 bits read it as `-1`.
pub const NOT_ASSIGNED: u32 = u32::MAX;

/// A dataplane index tagged with the kind of object it designates.
///
/// The tag consumes no space and has no runtime overhead whatsoever.
#[repr(transparent)]
pub struct Handle<T: ?Sized>(u32, PhantomData<fn() -> T>);

impl<T: ?Sized> Copy for Handle<T> {}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T: ?Sized> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: ?Sized> Eq for Handle<T> {}

impl<T: ?Sized> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: ?Sized> Display for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <_ as Display>::fmt(&self.0, f)
    }
}

impl<T: ?Sized> Debug for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <_ as Debug>::fmt(&self.0, f)
    }
}

impl<T: ?Sized> Handle<T> {
    /// Tag a raw dataplane index.
    ///
    /// # Note
    ///
    /// Use this only where the kind of object is conclusively known from the context the raw value
    /// was received in (e.g. the `acl_index` field of an ACL reply). Do not convert a `Handle<U>`
    /// into a `Handle<T>` by stripping and re-adding the tag.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw, PhantomData)
    }

    /// Tag a raw dataplane index unless it is the [`NOT_ASSIGNED`] sentinel.
    #[must_use]
    pub const fn try_from_raw(raw: u32) -> Option<Self> {
        if raw == NOT_ASSIGNED {
            None
        } else {
            Some(Self(raw, PhantomData))
        }
    }

    /// Strip type safety and return the wrapped (untyped) index.
    #[must_use]
    pub const fn into_raw(self) -> u32 {
        self.0
    }
}

/// Marker types for the object kinds the management plane maps.
pub mod kind {
    /// An interface (`sw_if_index`).
    pub enum SwInterface {}
    /// A bridge domain (`bd_id`).
    pub enum BridgeDomain {}
    /// A standard (L3/L4) ACL.
    pub enum StandardAcl {}
    /// A MAC-IP ACL.
    pub enum MacIpAcl {}
    /// A classify table.
    pub enum ClassifyTable {}
    /// A node index relative to some classify table's base node.
    pub enum RelativeNode {}
    /// An IPsec security association.
    pub enum SadEntry {}
}

#[cfg(feature = "serde")]
mod serde_impl {
    use crate::Handle;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl<T: ?Sized> Serialize for Handle<T> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_u32(self.0)
        }
    }

    impl<'de, T: ?Sized> Deserialize<'de> for Handle<T> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            u32::deserialize(deserializer).map(Handle::from_raw)
        }
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::Handle;
    use bolero::{Driver, TypeGenerator};
    use std::marker::PhantomData;

    impl<T: ?Sized + 'static> TypeGenerator for Handle<T> {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            Some(Handle(driver.produce()?, PhantomData))
        }
    }
}

#[cfg(test)]
mod test {
    use crate::kind::SwInterface;
    use crate::{Handle, NOT_ASSIGNED};

    #[test]
    fn raw_round_trip() {
        bolero::check!().with_type().for_each(|raw: &u32| {
            assert_eq!(Handle::<SwInterface>::from_raw(*raw).into_raw(), *raw);
        });
    }

    #[test]
    fn sentinel_is_not_a_handle() {
        assert!(Handle::<SwInterface>::try_from_raw(NOT_ASSIGNED).is_none());
        assert_eq!(
            Handle::<SwInterface>::try_from_raw(7),
            Some(Handle::from_raw(7))
        );
    }

    #[test]
    fn ordering_follows_raw_value() {
        bolero::check!()
            .with_type()
            .for_each(|(a, b): &(Handle<SwInterface>, Handle<SwInterface>)| {
                assert_eq!(a.cmp(b), a.into_raw().cmp(&b.into_raw()));
            });
    }
}
