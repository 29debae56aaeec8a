//! Arena holding every node owned by one context.
//!
//! Parents own their children through the ordered `children` list; the
//! `parent` link is a non-owning back reference used for upward traversal.
//! The root and detached nodes have no parent, and traversal stops there.

use alloc::vec::Vec;

use crate::{
    error::{Result, SceneError},
    node::Node,
};

/// Identifier for a node stored inside a [`SceneTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a new [`NodeId`] from the raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index backing this identifier.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct NodeEntry {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    slot: u32,
    next_slot: u32,
    node: Node,
}

impl NodeEntry {
    const fn new(node: Node) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            slot: 0,
            next_slot: 0,
            node,
        }
    }
}

/// Arena storing the nodes of one scene graph.
#[derive(Debug, Default)]
pub struct SceneTree {
    nodes: Vec<NodeEntry>,
    root: Option<NodeId>,
}

impl SceneTree {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Stores a detached node and returns its identifier.
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeEntry::new(node));
        id
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Returns the root node identifier, if one exists.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns `true` if `id` names a node of this tree.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Borrows a node.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] if `id` is not part of this tree.
    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.entry(id).map(|entry| &entry.node)
    }

    /// Mutably borrows a node.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] if `id` is not part of this tree.
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.entry_mut(id).map(|entry| &mut entry.node)
    }

    /// Returns the parent of a node; `None` for the root and detached nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|entry| entry.parent)
    }

    /// Returns the child identifiers of a node in insertion order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map_or(&[], |entry| entry.children.as_slice())
    }

    /// Slot the node occupies under its current parent.
    #[must_use]
    pub fn slot(&self, id: NodeId) -> Option<u32> {
        self.nodes
            .get(id.index())
            .filter(|entry| entry.parent.is_some())
            .map(|entry| entry.slot)
    }

    /// Iterates the ancestors of a node, nearest first, excluding the node itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(self.parent(id), |current| self.parent(*current))
    }

    /// Returns `true` if `ancestor` lies strictly above `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|current| current == ancestor)
    }

    /// Returns `true` if the node is the root or hangs below it.
    #[must_use]
    pub fn is_reachable(&self, id: NodeId) -> bool {
        self.root
            .is_some_and(|root| root == id || self.is_ancestor(root, id))
    }

    /// Collects a node and all of its descendants in depth-first pre-order.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            order.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        order
    }

    /// Attaches `child` as the last child of `parent`.
    ///
    /// A child that already has a parent is moved. Nothing changes when an
    /// error is returned.
    ///
    /// # Errors
    ///
    /// - [`SceneError::UnknownNode`] if either node is missing.
    /// - [`SceneError::Cycle`] if `child` is `parent` or one of its ancestors.
    /// - [`SceneError::InvalidOperation`] if `child` is the root.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_attach(parent, child)?;

        if let Some(previous) = self.parent(child) {
            self.detach(previous, child);
        }

        let parent_entry = &mut self.nodes[parent.index()];
        let slot = parent_entry.next_slot;
        parent_entry.next_slot += 1;
        parent_entry.children.push(child);

        let child_entry = &mut self.nodes[child.index()];
        child_entry.parent = Some(parent);
        child_entry.slot = slot;
        Ok(())
    }

    /// Validates an [`attach`](Self::attach) without performing it.
    ///
    /// # Errors
    ///
    /// Same as [`attach`](Self::attach).
    pub fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.entry(parent)?;
        self.entry(child)?;
        if child == parent || self.is_ancestor(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        if self.root == Some(child) {
            return Err(SceneError::invalid("the context root cannot become a child"));
        }
        Ok(())
    }

    /// Detaches `child` from `parent`, returning `false` if it was not a child.
    pub fn detach(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.nodes[parent.index()]
            .children
            .retain(|current| *current != child);
        self.nodes[child.index()].parent = None;
        true
    }

    /// Returns the total number of nodes stored in this tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree stores no nodes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn entry(&self, id: NodeId) -> Result<&NodeEntry> {
        self.nodes.get(id.index()).ok_or(SceneError::UnknownNode(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry> {
        self.nodes
            .get_mut(id.index())
            .ok_or(SceneError::UnknownNode(id))
    }
}
