//! Error types shared by every scene operation.

use thiserror::Error;

use crate::{path::NodePath, tree::NodeId};

/// Errors surfaced synchronously by scene graph operations.
///
/// None of these represent a transient condition, so nothing in this crate
/// retries after one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// An argument or payload had the wrong shape or was out of range.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// A size mode value did not name ABSOLUTE, RELATIVE or RENDER.
    #[error("invalid size mode: {0}")]
    InvalidSizeMode(String),
    /// Attaching `child` under `parent` would have created a cycle.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Node that was asked to adopt.
        parent: NodeId,
        /// Node that is already one of its ancestors.
        child: NodeId,
    },
    /// A node is already registered under this identity.
    #[error("identity `{0}` is already registered")]
    DuplicateIdentity(NodePath),
    /// The node is already mounted under this identity.
    #[error("node `{0}` is already mounted")]
    AlreadyMounted(NodePath),
    /// The identifier does not name a node in this tree.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    /// Re-entrant dispatch kept producing events past the configured limit.
    #[error("dispatch did not settle after {limit} events")]
    DispatchOverflow {
        /// Number of events drained before giving up.
        limit: usize,
    },
}

impl SceneError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = SceneError> = core::result::Result<T, E>;
