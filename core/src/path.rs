//! Node identities.
//!
//! A [`NodePath`] is the address the renderer uses for a node. The context root
//! is addressed by its selector and every other node by its parent's path
//! followed by the slot it was attached under, e.g. `#app/0/3`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Separator placed between path segments.
pub const SEPARATOR: char = '/';

/// Stable identity of a mounted node, unique within its tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(String);

impl NodePath {
    /// Creates a path from its textual form.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the path of the child attached under `slot`.
    #[must_use]
    pub fn child(&self, slot: u32) -> Self {
        Self(format!("{}{SEPARATOR}{slot}", self.0))
    }

    /// Returns `true` if `self` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &Self) -> bool {
        self.0
            .strip_prefix(ancestor.as_str())
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }

    /// Returns `true` if `self` equals `other` or lies below it.
    #[must_use]
    pub fn is_within(&self, other: &Self) -> bool {
        self == other || self.is_descendant_of(other)
    }

    /// Borrows the textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodePath {
    fn from(value: String) -> Self {
        Self(value)
    }
}
