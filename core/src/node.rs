//! Per-node state and the hooks through which nodes observe events.

use alloc::{boxed::Box, string::String, vec::Vec};
use core::fmt::{self, Debug};
use std::collections::{HashMap, HashSet};

use crate::{
    error::Result,
    event::Event,
    path::NodePath,
    scene::Scene,
    size::NodeSize,
    tree::NodeId,
};

/// Whether a node is registered with its context's dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// Not reachable for routing; emits no commands.
    Unmounted,
    /// Registered and eligible to emit commands.
    Mounted,
}

/// Visibility requested for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Not drawn.
    #[default]
    Hidden,
    /// Drawn.
    Shown,
}

/// Polymorphic reaction of a node to routed events.
///
/// Nodes without a receiver ignore every event. Implementations must ignore
/// names they do not recognise rather than fail on them.
pub trait EventReceiver: Debug {
    /// Called once per routed delivery of `event` to node `id`.
    ///
    /// # Errors
    ///
    /// Errors abort the current dispatch and are returned to whoever fed the
    /// event in.
    fn on_receive(&mut self, scene: &mut Scene<'_>, id: NodeId, event: &Event) -> Result<()>;
}

/// Closure registered for a single event name.
pub type Handler = Box<dyn FnMut(&mut Scene<'_>, NodeId, &Event) -> Result<()>>;

/// Event name to handlers, each list kept in registration order.
#[derive(Default)]
pub struct HandlerTable {
    map: HashMap<String, Vec<Handler>>,
    // Names whose handlers are taken out while they run, with their count.
    running: HashMap<String, usize>,
    // Running names dropped with `remove`; their taken handlers are discarded.
    cleared: HashSet<String>,
}

impl HandlerTable {
    /// Appends a handler for `name`.
    pub fn push(&mut self, name: impl Into<String>, handler: Handler) {
        self.map.entry(name.into()).or_default().push(handler);
    }

    /// Drops every handler registered for `name`, returning how many were removed.
    ///
    /// Handlers for `name` that are running at the time are included and are
    /// not put back once they finish.
    pub fn remove(&mut self, name: &str) -> usize {
        let mut removed = self.map.remove(name).map_or(0, |handlers| handlers.len());
        if let Some(count) = self.running.get(name).copied() {
            if self.cleared.insert(name.to_owned()) {
                removed += count;
            }
        }
        removed
    }

    /// Number of handlers registered for `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.map.get(name).map_or(0, Vec::len)
    }

    /// Moves the handlers for `name` out so they can run with the scene borrowed.
    pub(crate) fn take(&mut self, name: &str) -> Vec<Handler> {
        let handlers = self.map.remove(name).unwrap_or_default();
        if !handlers.is_empty() {
            self.running.insert(name.to_owned(), handlers.len());
        }
        handlers
    }

    /// Puts handlers taken with [`take`](Self::take) back in front of any
    /// registered while they were running, unless `name` was removed meanwhile.
    pub(crate) fn restore(&mut self, name: &str, mut handlers: Vec<Handler>) {
        self.running.remove(name);
        if self.cleared.remove(name) || handlers.is_empty() {
            return;
        }
        if let Some(added) = self.map.remove(name) {
            handlers.extend(added);
        }
        self.map.insert(name.to_owned(), handlers);
    }
}

impl Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.map.iter().map(|(name, list)| (name, list.len())))
            .finish()
    }
}

/// State carried by every node of the scene graph.
///
/// Tree relations (parent, children) live in [`SceneTree`](crate::SceneTree);
/// this is what the node itself knows.
#[derive(Debug, Default)]
pub struct Node {
    pub(crate) path: Option<NodePath>,
    pub(crate) visibility: Visibility,
    pub(crate) size: NodeSize,
    pub(crate) receiver: Option<Box<dyn EventReceiver>>,
    pub(crate) handlers: HandlerTable,
}

impl Node {
    /// Creates an unmounted, hidden node that fills its parent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity under which the node is registered, while mounted.
    #[must_use]
    pub const fn path(&self) -> Option<&NodePath> {
        self.path.as_ref()
    }

    /// Current mount state.
    #[must_use]
    pub const fn mount_state(&self) -> MountState {
        if self.path.is_some() {
            MountState::Mounted
        } else {
            MountState::Unmounted
        }
    }

    /// Returns `true` while registered with the dispatcher.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.path.is_some()
    }

    /// Current visibility.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns `true` if the node is shown.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.visibility == Visibility::Shown
    }

    /// Size inputs and cached resolution.
    #[must_use]
    pub const fn size(&self) -> &NodeSize {
        &self.size
    }

    /// Handlers registered on this node.
    #[must_use]
    pub const fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Returns `true` if an [`EventReceiver`] is installed.
    #[must_use]
    pub const fn has_receiver(&self) -> bool {
        self.receiver.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Box::new(|_, _, _| Ok(()))
    }

    #[test]
    fn test_new_node_defaults() {
        let node = Node::new();
        assert_eq!(node.mount_state(), MountState::Unmounted);
        assert_eq!(node.visibility(), Visibility::Hidden);
        assert!(!node.has_receiver());
        assert!(node.path().is_none());
    }

    #[test]
    fn test_restore_keeps_registration_order() {
        let mut table = HandlerTable::default();
        table.push("TICK", noop());
        table.push("TICK", noop());

        let taken = table.take("TICK");
        assert_eq!(table.count("TICK"), 0);
        table.push("TICK", noop());
        table.restore("TICK", taken);

        assert_eq!(table.count("TICK"), 3);
        assert_eq!(table.remove("TICK"), 3);
        assert_eq!(table.remove("TICK"), 0);
    }
    #[test]
    fn test_remove_while_running_discards_taken_handlers() {
        let mut table = HandlerTable::default();
        table.push("TICK", noop());
        table.push("TICK", noop());

        let taken = table.take("TICK");
        assert_eq!(table.remove("TICK"), 2);
        assert_eq!(table.remove("TICK"), 0);
        table.push("TICK", noop());
        table.restore("TICK", taken);
        assert_eq!(table.count("TICK"), 1);

        let taken = table.take("TICK");
        table.restore("TICK", taken);
        assert_eq!(table.count("TICK"), 1);
    }
}
