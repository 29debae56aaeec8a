//! Routing between the node tree and the renderer.
//!
//! The [`Dispatcher`] keeps the identity → node lookup table for mounted
//! nodes, forwards outbound [`Command`]s to the renderer handle it was built
//! with, and delivers inbound [`Event`]s along a [`Route`].
//!
//! Delivery is single pass and never re-enters itself: a dispatch requested
//! while a drain is running is appended to the pending queue and handled
//! after the current event has reached every node on its route.

use alloc::{boxed::Box, collections::VecDeque, vec::Vec};
use core::fmt;
use std::collections::HashMap;

use crate::{
    command::{Command, Renderer},
    error::{Result, SceneError},
    event::{Event, RENDER_SIZE},
    node::{EventReceiver, Node},
    options::DispatchOptions,
    path::NodePath,
    scene::Scene,
    tree::{NodeId, SceneTree},
};

/// Delivery plan for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Only the addressed node.
    Target(NodePath),
    /// The root first, then every mounted descendant in depth-first pre-order.
    Broadcast,
    /// The addressed node, then each of its ancestors up to the root.
    Bubble(NodePath),
}

impl From<Option<NodePath>> for Route {
    fn from(target: Option<NodePath>) -> Self {
        target.map_or(Self::Broadcast, Self::Target)
    }
}

#[derive(Debug)]
struct Pending {
    event: Event,
    route: Route,
}

/// Routes events into the tree and commands out to the renderer.
pub struct Dispatcher {
    registry: HashMap<NodePath, NodeId>,
    renderer: Box<dyn Renderer>,
    queue: VecDeque<Pending>,
    draining: bool,
    options: DispatchOptions,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registered", &self.registry.len())
            .field("pending", &self.queue.len())
            .field("draining", &self.draining)
            .field("renderer", &self.renderer)
            .finish()
    }
}

impl Dispatcher {
    /// Creates a dispatcher delivering commands to `renderer`.
    pub fn new(renderer: impl Renderer + 'static, options: DispatchOptions) -> Self {
        Self {
            registry: HashMap::new(),
            renderer: Box::new(renderer),
            queue: VecDeque::new(),
            draining: false,
            options,
        }
    }

    /// Registers a mounted node under its identity.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateIdentity`] if the identity is taken. The
    /// existing entry is left untouched.
    pub fn register_node(&mut self, path: NodePath, id: NodeId) -> Result<()> {
        if self.registry.contains_key(&path) {
            return Err(SceneError::DuplicateIdentity(path));
        }
        tracing::trace!(%path, ?id, "registered node");
        self.registry.insert(path, id);
        Ok(())
    }

    pub(crate) fn register_root(&mut self, path: NodePath, id: NodeId) {
        self.registry.clear();
        self.registry.insert(path, id);
    }

    /// Removes `path` and every identity below it, returning the removed nodes
    /// ordered by identity. Unknown identities remove nothing.
    pub fn deregister_node(&mut self, path: &NodePath) -> Vec<NodeId> {
        let mut removed: Vec<(NodePath, NodeId)> = Vec::new();
        self.registry.retain(|candidate, id| {
            if candidate.is_within(path) {
                removed.push((candidate.clone(), *id));
                false
            } else {
                true
            }
        });
        removed.sort();
        if !removed.is_empty() {
            tracing::trace!(%path, count = removed.len(), "deregistered subtree");
        }
        removed.into_iter().map(|(_, id)| id).collect()
    }

    /// Looks up the node registered under `path`.
    #[must_use]
    pub fn lookup(&self, path: &NodePath) -> Option<NodeId> {
        self.registry.get(path).copied()
    }

    /// Returns `true` if `path` is registered.
    #[must_use]
    pub fn contains(&self, path: &NodePath) -> bool {
        self.registry.contains_key(path)
    }

    /// Iterates every registered identity and node.
    pub fn registered(&self) -> impl Iterator<Item = (&NodePath, NodeId)> {
        self.registry.iter().map(|(path, id)| (path, *id))
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Returns `true` while a drain is delivering events.
    #[must_use]
    pub const fn is_dispatching(&self) -> bool {
        self.draining
    }

    /// Settings this dispatcher was built with.
    #[must_use]
    pub const fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Sends one command to the renderer without waiting for an answer.
    pub fn send_command(&mut self, command: Command) {
        tracing::trace!(command = command.name(), path = ?command.path(), "outbound");
        self.renderer.message(command);
    }

    /// Starts a fluent sequence of commands.
    pub fn batch(&mut self) -> CommandBatch<'_> {
        CommandBatch { dispatcher: self }
    }

    /// Releases the renderer handle.
    #[must_use]
    pub fn into_renderer(self) -> Box<dyn Renderer> {
        self.renderer
    }

    pub(crate) fn enqueue(&mut self, event: Event, route: Route) {
        tracing::trace!(event = event.name(), ?route, "queued event");
        self.queue.push_back(Pending { event, route });
    }

    /// Delivers `event` along `route`, then drains anything queued meanwhile.
    ///
    /// `root` stands in for the receiver of the tree's root node. When called
    /// while a drain is already running, the event is queued and this returns
    /// immediately.
    ///
    /// # Errors
    ///
    /// The first error returned by a receiver or handler aborts the drain and
    /// discards every queued event. [`SceneError::DispatchOverflow`] is
    /// returned when re-entrant events do not settle.
    pub fn dispatch(
        &mut self,
        tree: &mut SceneTree,
        root: &mut dyn EventReceiver,
        event: Event,
        route: Route,
    ) -> Result<()> {
        self.enqueue(event, route);
        if self.draining {
            return Ok(());
        }

        self.draining = true;
        let result = self.drain(tree, root);
        self.draining = false;
        if result.is_err() {
            self.queue.clear();
        }
        result
    }

    fn drain(&mut self, tree: &mut SceneTree, root: &mut dyn EventReceiver) -> Result<()> {
        let limit = self.options.max_events_per_drain.max(1);
        let mut processed = 0_usize;
        while let Some(Pending { event, route }) = self.queue.pop_front() {
            processed += 1;
            if processed > limit {
                tracing::warn!(limit, event = event.name(), "dispatch did not settle");
                return Err(SceneError::DispatchOverflow { limit });
            }

            let targeted = matches!(route, Route::Target(_));
            for id in self.route(tree, &route) {
                // Earlier deliveries in this pass may have unmounted the node.
                if !tree.get(id).is_ok_and(Node::is_mounted) {
                    continue;
                }
                self.deliver(tree, root, id, &event, targeted)?;
            }
        }
        Ok(())
    }

    fn route(&self, tree: &SceneTree, route: &Route) -> Vec<NodeId> {
        match route {
            Route::Broadcast => tree
                .root()
                .map(|root| tree.subtree(root))
                .unwrap_or_default(),
            Route::Target(path) => self.lookup_or_warn(path).into_iter().collect(),
            Route::Bubble(path) => self
                .lookup_or_warn(path)
                .map(|id| core::iter::once(id).chain(tree.ancestors(id)).collect())
                .unwrap_or_default(),
        }
    }

    fn lookup_or_warn(&self, path: &NodePath) -> Option<NodeId> {
        let id = self.lookup(path);
        if id.is_none() {
            tracing::warn!(%path, "dropping event for unregistered node");
        }
        id
    }

    fn deliver(
        &mut self,
        tree: &mut SceneTree,
        root: &mut dyn EventReceiver,
        id: NodeId,
        event: &Event,
        targeted: bool,
    ) -> Result<()> {
        let is_root = tree.root() == Some(id);
        let mut scene = Scene::new(tree, self, None);

        if targeted && event.is(RENDER_SIZE) {
            let [x, y, z] = event.extents()?;
            scene.set_render_size(id, x, y, z)?;
        }

        if is_root {
            root.on_receive(&mut scene, id, event)?;
        }

        if let Some(mut receiver) = scene.node_mut(id)?.receiver.take() {
            let result = receiver.on_receive(&mut scene, id, event);
            let node = scene.node_mut(id)?;
            if node.receiver.is_none() {
                node.receiver = Some(receiver);
            }
            result?;
        }

        let mut handlers = scene.node_mut(id)?.handlers.take(event.name());
        let mut outcome = Ok(());
        for handler in &mut handlers {
            outcome = handler(&mut scene, id, event);
            if outcome.is_err() {
                break;
            }
        }
        scene
            .node_mut(id)?
            .handlers
            .restore(event.name(), handlers);
        outcome
    }
}

/// Fluent command sequence started with [`Dispatcher::batch`].
#[derive(Debug)]
pub struct CommandBatch<'a> {
    dispatcher: &'a mut Dispatcher,
}

impl CommandBatch<'_> {
    /// Sends `command` and returns the batch for chaining.
    #[must_use]
    pub fn message(self, command: Command) -> Self {
        self.dispatcher.send_command(command);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandQueue;

    fn dispatcher() -> (Dispatcher, CommandQueue) {
        let queue = CommandQueue::new();
        (
            Dispatcher::new(queue.clone(), DispatchOptions::default()),
            queue,
        )
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let (mut dispatcher, _) = dispatcher();
        let path = NodePath::new("body/0");
        dispatcher.register_node(path.clone(), NodeId::new(1)).unwrap();

        assert_eq!(
            dispatcher.register_node(path.clone(), NodeId::new(2)),
            Err(SceneError::DuplicateIdentity(path.clone()))
        );
        assert_eq!(dispatcher.lookup(&path), Some(NodeId::new(1)));
    }

    #[test]
    fn test_deregister_removes_prefixed_identities() {
        let (mut dispatcher, _) = dispatcher();
        for (index, path) in ["body", "body/0", "body/0/0", "body/0/1", "body/1", "body/10"]
            .into_iter()
            .enumerate()
        {
            dispatcher
                .register_node(NodePath::new(path), NodeId::new(index))
                .unwrap();
        }

        let removed = dispatcher.deregister_node(&NodePath::new("body/0"));
        assert_eq!(removed, vec![NodeId::new(1), NodeId::new(2), NodeId::new(3)]);
        assert_eq!(dispatcher.len(), 3);
        assert!(dispatcher.contains(&NodePath::new("body/10")));

        assert!(dispatcher.deregister_node(&NodePath::new("nowhere")).is_empty());
    }

    #[test]
    fn test_batch_preserves_order() {
        let (mut dispatcher, queue) = dispatcher();
        let path = NodePath::new("body");
        let _ = dispatcher
            .batch()
            .message(Command::Mount { path: path.clone() })
            .message(Command::NeedSizeFor {
                selector: "body".into(),
            })
            .message(Command::Show { path });

        let names: Vec<_> = queue.drain().iter().map(Command::name).collect();
        assert_eq!(names, ["MOUNT", "NEED_SIZE_FOR", "SHOW"]);
    }

    #[test]
    fn test_route_from_optional_target() {
        assert_eq!(Route::from(None), Route::Broadcast);
        assert_eq!(
            Route::from(Some(NodePath::new("body/2"))),
            Route::Target(NodePath::new("body/2"))
        );
    }
}
