//! Mutable view over a tree and its dispatcher.
//!
//! Every node operation goes through [`Scene`] so that tree mutation, size
//! invalidation and command emission happen together. A scene is obtained
//! from [`Context::scene`](crate::Context::scene), or handed to receivers and
//! handlers while an event is being delivered.

use alloc::vec::Vec;
use core::fmt;

use crate::{
    command::Command,
    dispatcher::{Dispatcher, Route},
    error::{Result, SceneError},
    event::Event,
    node::{EventReceiver, Handler, Node, Visibility},
    path::NodePath,
    size::{self, Axis, AxisSet, Resolution, SizeMode, resolved_triple, validate_extents},
    tree::{NodeId, SceneTree},
};

/// Borrowed access to one scene graph.
pub struct Scene<'a> {
    tree: &'a mut SceneTree,
    dispatcher: &'a mut Dispatcher,
    root: Option<&'a mut dyn EventReceiver>,
}

impl fmt::Debug for Scene<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.tree.len())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl<'a> Scene<'a> {
    /// `root` is the receiver standing in for the root node. Scenes created
    /// during a drain pass `None` and can only queue further events.
    pub(crate) fn new(
        tree: &'a mut SceneTree,
        dispatcher: &'a mut Dispatcher,
        root: Option<&'a mut dyn EventReceiver>,
    ) -> Self {
        Self {
            tree,
            dispatcher,
            root,
        }
    }

    /// Read access to the tree.
    #[must_use]
    pub fn tree(&self) -> &SceneTree {
        self.tree
    }

    /// Read access to the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        self.dispatcher
    }

    /// Borrows a node.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] for ids outside the tree.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.tree.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.tree.get_mut(id)
    }

    /// Creates a detached, unmounted, hidden node.
    pub fn create_node(&mut self) -> NodeId {
        self.tree.insert(Node::new())
    }

    // ------------------------------------------------------------------
    // Topology
    // ------------------------------------------------------------------

    /// Attaches `child` as the last child of `parent`, mounting it when the
    /// parent is mounted.
    ///
    /// A child already attached elsewhere is moved and receives a new
    /// identity. Adding an existing child again changes nothing.
    ///
    /// # Errors
    ///
    /// [`SceneError::Cycle`] if `child` is `parent` or one of its ancestors,
    /// [`SceneError::InvalidOperation`] if `child` is the root. The tree is
    /// unchanged on error.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.tree.check_attach(parent, child)?;
        if self.tree.parent(child) == Some(parent) {
            return Ok(());
        }

        self.unmount(child)?;
        self.tree.attach(parent, child)?;
        self.invalidate(child, AxisSet::ALL)?;

        if self.node(parent)?.is_mounted() {
            self.mount(child)?;
        }
        Ok(())
    }

    /// Detaches `child` from `parent`, unmounting its subtree first.
    ///
    /// Removing a node that is not a child of `parent` is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates failures to read nodes of the subtree.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.tree.parent(child) != Some(parent) {
            return Ok(());
        }
        self.unmount(child)?;
        self.tree.detach(parent, child);
        self.invalidate(child, AxisSet::ALL)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mounting
    // ------------------------------------------------------------------

    /// Registers the node and its subtree with the dispatcher.
    ///
    /// The identity is derived from the parent's identity and the node's
    /// slot. For each mounted node, in pre-order, the renderer receives
    /// `MOUNT`, then `SHOW` if shown, then `SIZE_ABSOLUTE` if its size is
    /// resolved.
    ///
    /// # Errors
    ///
    /// [`SceneError::AlreadyMounted`] if the node is mounted, and
    /// [`SceneError::InvalidOperation`] if it is detached or its parent is
    /// not mounted.
    pub fn mount(&mut self, id: NodeId) -> Result<()> {
        if let Some(path) = self.node(id)?.path() {
            return Err(SceneError::AlreadyMounted(path.clone()));
        }
        let parent = self
            .tree
            .parent(id)
            .ok_or_else(|| SceneError::invalid(format!("{id:?} is detached and cannot mount")))?;
        let parent_path = self.node(parent)?.path().cloned().ok_or_else(|| {
            SceneError::invalid(format!("{id:?} cannot mount under unmounted {parent:?}"))
        })?;
        let slot = self
            .tree
            .slot(id)
            .ok_or_else(|| SceneError::invalid(format!("{id:?} has no slot")))?;

        self.mount_subtree(id, parent_path.child(slot))
    }

    fn mount_subtree(&mut self, id: NodeId, path: NodePath) -> Result<()> {
        let mut stack = vec![(id, path)];
        while let Some((current, path)) = stack.pop() {
            self.dispatcher.register_node(path.clone(), current)?;
            let node = self.node_mut(current)?;
            node.path = Some(path.clone());
            let shown = node.is_shown();

            tracing::debug!(%path, "mounted node");
            self.dispatcher
                .send_command(Command::Mount { path: path.clone() });
            if shown {
                self.dispatcher
                    .send_command(Command::Show { path: path.clone() });
            }
            self.emit_size(current)?;

            for child in self.tree.children(current).iter().rev() {
                if let Some(slot) = self.tree.slot(*child) {
                    stack.push((*child, path.child(slot)));
                }
            }
        }
        Ok(())
    }

    /// Deregisters the node and its mounted descendants, keeping them attached.
    ///
    /// Each unmounted node emits `DISMOUNT` in pre-order. Unmounting an
    /// unmounted node is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] for ids outside the tree.
    pub fn unmount(&mut self, id: NodeId) -> Result<()> {
        let Some(path) = self.node(id)?.path().cloned() else {
            return Ok(());
        };
        let removed = self.dispatcher.deregister_node(&path);
        tracing::debug!(%path, count = removed.len(), "unmounting subtree");

        for current in self.tree.subtree(id) {
            let node = self.node_mut(current)?;
            if let Some(path) = node.path.take() {
                node.size.set_emitted(None);
                self.dispatcher.send_command(Command::Dismount { path });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    /// Shows the node. Emits `SHOW` only on an actual transition while mounted.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] for ids outside the tree.
    pub fn show(&mut self, id: NodeId) -> Result<()> {
        self.set_visibility(id, Visibility::Shown)
    }

    /// Hides the node. Emits `HIDE` only on an actual transition while mounted.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] for ids outside the tree.
    pub fn hide(&mut self, id: NodeId) -> Result<()> {
        self.set_visibility(id, Visibility::Hidden)
    }

    fn set_visibility(&mut self, id: NodeId, visibility: Visibility) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.visibility == visibility {
            return Ok(());
        }
        node.visibility = visibility;
        if let Some(path) = node.path.clone() {
            self.dispatcher.send_command(match visibility {
                Visibility::Shown => Command::Show { path },
                Visibility::Hidden => Command::Hide { path },
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Size
    // ------------------------------------------------------------------

    /// Sets the size mode of each axis.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] for ids outside the tree.
    pub fn set_size_mode(&mut self, id: NodeId, x: SizeMode, y: SizeMode, z: SizeMode) -> Result<()> {
        let changed = self.node_mut(id)?.size.set_modes([x, y, z]);
        self.refresh(id, changed)
    }

    /// Stores absolute extents. Only axes in [`SizeMode::Absolute`] use them;
    /// the others keep the values until switched to absolute.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidOperation`] if any value is negative or not
    /// finite. Nothing is stored in that case.
    pub fn set_absolute_size(&mut self, id: NodeId, x: f32, y: f32, z: f32) -> Result<()> {
        let values = validate_extents([x, y, z], "absolute size")?;
        let changed = self.node_mut(id)?.size.set_absolute(values);
        self.refresh(id, changed)
    }

    /// Stores relative fractions of the parent's extents. Fractions above one
    /// are allowed.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidOperation`] if any fraction is negative or not
    /// finite. Nothing is stored in that case.
    pub fn set_relative_size(&mut self, id: NodeId, x: f32, y: f32, z: f32) -> Result<()> {
        let values = validate_extents([x, y, z], "relative size")?;
        let changed = self.node_mut(id)?.size.set_fraction(values);
        self.refresh(id, changed)
    }

    /// Records the content size measured by the renderer for render-sized axes.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidOperation`] if any value is negative or not
    /// finite. Nothing is stored in that case.
    pub fn set_render_size(&mut self, id: NodeId, x: f32, y: f32, z: f32) -> Result<()> {
        let values = validate_extents([x, y, z], "render size")?;
        let changed = self.node_mut(id)?.size.set_reported(values);
        self.refresh(id, changed)
    }

    /// Resolves the node's size, recomputing stale axes first.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] for ids outside the tree.
    pub fn size(&mut self, id: NodeId) -> Result<[Resolution; 3]> {
        Ok([
            self.resolve_axis(id, Axis::X)?,
            self.resolve_axis(id, Axis::Y)?,
            self.resolve_axis(id, Axis::Z)?,
        ])
    }

    fn resolve_axis(&mut self, id: NodeId, axis: Axis) -> Result<Resolution> {
        // Climb until a cached value or a node independent of its parent.
        let mut stale = Vec::new();
        let mut inherited = None;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let size = self.node(current)?.size();
            if let Some(cached) = size.cached(axis) {
                inherited = Some(cached);
                break;
            }
            stale.push(current);
            if !size.depends_on_parent(axis) {
                break;
            }
            cursor = self.tree.parent(current);
        }

        for current in stale.into_iter().rev() {
            let node = self.node_mut(current)?;
            let resolution = size::resolve_axis(node.size.axis(axis), inherited);
            node.size.cache(axis, resolution);
            inherited = Some(resolution);
        }
        Ok(inherited.unwrap_or(Resolution::Pending))
    }

    /// Marks `axes` stale on `id` and on every descendant that depends on them,
    /// returning the visited nodes in pre-order.
    fn invalidate(&mut self, id: NodeId, axes: AxisSet) -> Result<Vec<NodeId>> {
        let mut visited = Vec::new();
        let mut stack = vec![(id, axes)];
        while let Some((current, axes)) = stack.pop() {
            let node = self.node_mut(current)?;
            for axis in axes.iter() {
                node.size.invalidate(axis);
            }
            visited.push(current);

            for child in self.tree.children(current).iter().rev() {
                let size = self.tree.get(*child)?.size();
                let mut inherited = AxisSet::EMPTY;
                for axis in axes.iter().filter(|axis| size.depends_on_parent(*axis)) {
                    inherited.insert(axis);
                }
                if !inherited.is_empty() {
                    stack.push((*child, inherited));
                }
            }
        }
        Ok(visited)
    }

    fn refresh(&mut self, id: NodeId, axes: AxisSet) -> Result<()> {
        if axes.is_empty() {
            return Ok(());
        }
        for current in self.invalidate(id, axes)? {
            self.emit_size(current)?;
        }
        Ok(())
    }

    /// Sends `SIZE_ABSOLUTE` if the node is mounted, fully resolved, and its
    /// size differs from what the renderer last received.
    fn emit_size(&mut self, id: NodeId) -> Result<()> {
        if !self.node(id)?.is_mounted() {
            return Ok(());
        }
        let Some(size) = resolved_triple(self.size(id)?) else {
            return Ok(());
        };
        let node = self.node_mut(id)?;
        if node.size.emitted() == Some(size) {
            return Ok(());
        }
        node.size.set_emitted(Some(size));
        if let Some(path) = node.path.clone() {
            self.dispatcher
                .send_command(Command::SizeAbsolute { path, size });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Installs the node's receiver, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] for ids outside the tree.
    pub fn set_receiver(&mut self, id: NodeId, receiver: impl EventReceiver + 'static) -> Result<()> {
        self.node_mut(id)?.receiver = Some(Box::new(receiver));
        Ok(())
    }

    /// Registers a handler for `name` on the node. Handlers run after the
    /// node's receiver, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] for ids outside the tree.
    pub fn on(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        handler: impl FnMut(&mut Scene<'_>, NodeId, &Event) -> Result<()> + 'static,
    ) -> Result<()> {
        let handler: Handler = Box::new(handler);
        self.node_mut(id)?.handlers.push(name, handler);
        Ok(())
    }

    /// Drops every handler registered for `name` on the node.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] for ids outside the tree.
    pub fn off(&mut self, id: NodeId, name: &str) -> Result<usize> {
        Ok(self.node_mut(id)?.handlers.remove(name))
    }

    /// Dispatches an event along `route`.
    ///
    /// Inside a delivery the event is queued and runs after the current one
    /// has finished its pass.
    ///
    /// # Errors
    ///
    /// Outside a delivery, returns the first error raised while draining.
    pub fn dispatch(&mut self, event: Event, route: Route) -> Result<()> {
        match self.root.as_deref_mut() {
            Some(root) => self.dispatcher.dispatch(self.tree, root, event, route),
            None => {
                self.dispatcher.enqueue(event, route);
                Ok(())
            }
        }
    }

    /// Dispatches an event that climbs from `from` to the root.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidOperation`] if `from` is not mounted, otherwise as
    /// [`dispatch`](Self::dispatch).
    pub fn bubble(&mut self, from: NodeId, event: Event) -> Result<()> {
        let path = self.node(from)?.path().cloned().ok_or_else(|| {
            SceneError::invalid(format!("{from:?} is not mounted and cannot bubble events"))
        })?;
        self.dispatch(event, Route::Bubble(path))
    }
}
