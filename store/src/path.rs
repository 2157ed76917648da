// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Hierarchical record addresses.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The address of a record in a [`crate::MappingStore`].
///
/// A path is a list of segments, the first of which is by convention the name of the mapping
/// context owning the record (e.g. `interface-context/mappings/eth0`). Segments are kept apart
/// rather than joined so that names containing `/` can not be mistaken for deeper paths.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MappingPath(Vec<String>);

impl MappingPath {
    /// A path with a single segment, usually the name of a mapping context.
    #[must_use]
    pub fn root(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// A new path extending this one with `segment`.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The last segment, if any.
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tell if `prefix` is an ancestor of (or equal to) this path, segment-wise.
    #[must_use]
    pub fn starts_with(&self, prefix: &MappingPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl Display for MappingPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::MappingPath;

    #[test]
    fn prefix_is_segment_wise() {
        let base = MappingPath::root("ctx").child("mappings");
        let a = base.child("a/b");
        let ab = base.child("a").child("b");
        assert!(a.starts_with(&base));
        assert!(ab.starts_with(&base.child("a")));
        assert!(!a.starts_with(&base.child("a")));
        assert_eq!(a.to_string(), ab.to_string());
        assert_ne!(a, ab);
        assert_eq!(a.leaf(), Some("a/b"));
    }
}
