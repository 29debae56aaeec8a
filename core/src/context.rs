//! The root of a scene graph bound to one display surface.
//!
//! A [`Context`] owns the node arena and the [`Dispatcher`] for one surface.
//! Construction registers the root under the surface selector, asks the
//! renderer for the surface's pixel size and shows the root:
//!
//! ```text
//! Constructed ──handshake──▶ AwaitingInitialSize ──CONTEXT_RESIZE──▶ Ready
//!                                                       ▲              │
//!                                                       └─CONTEXT_RESIZE
//! ```
//!
//! The context waits in [`ContextPhase::AwaitingInitialSize`] for as long as
//! the renderer takes to answer; there is no timeout.

use alloc::{boxed::Box, string::String};

use crate::{
    command::{Command, Renderer},
    dispatcher::{Dispatcher, Route},
    error::Result,
    event::{CONTEXT_RESIZE, Event},
    node::{EventReceiver, Node, Visibility},
    options::ContextOptions,
    path::NodePath,
    scene::Scene,
    size::SizeMode,
    tree::{NodeId, SceneTree},
};

/// Lifecycle of a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPhase {
    /// Created; the handshake has not been sent yet.
    ///
    /// Only held inside construction. [`Context::with_options`] sends the
    /// handshake before returning, so callers observe
    /// [`ContextPhase::AwaitingInitialSize`] or later.
    Constructed,
    /// The renderer was asked for the surface size and has not answered.
    AwaitingInitialSize,
    /// The surface size is known.
    Ready,
}

/// Behaviour of the root node.
#[derive(Debug)]
struct RootReceiver {
    phase: ContextPhase,
}

impl EventReceiver for RootReceiver {
    fn on_receive(&mut self, scene: &mut Scene<'_>, id: NodeId, event: &Event) -> Result<()> {
        if !event.is(CONTEXT_RESIZE) {
            return Ok(());
        }

        // Validate the whole triple before touching any state.
        let [x, y, z] = event.extents()?;
        // Store first so switching modes activates the new values in one step.
        scene.set_absolute_size(id, x, y, z)?;
        scene.set_size_mode(id, SizeMode::Absolute, SizeMode::Absolute, SizeMode::Absolute)?;

        if self.phase != ContextPhase::Ready {
            tracing::debug!(x, y, z, "context received its initial size");
            self.phase = ContextPhase::Ready;
        }
        Ok(())
    }
}

/// Root of one scene graph and its single entry point for renderer events.
#[derive(Debug)]
pub struct Context {
    selector: String,
    tree: SceneTree,
    dispatcher: Dispatcher,
    root: NodeId,
    receiver: RootReceiver,
}

impl Context {
    /// Creates a context for the surface named by `selector` with default options.
    pub fn new(selector: impl Into<String>, renderer: impl Renderer + 'static) -> Self {
        Self::with_options(selector, renderer, ContextOptions::default())
    }

    /// Creates a context for the surface named by `selector`.
    ///
    /// Sends `MOUNT`, `NEED_SIZE_FOR` and `SHOW` for the root, in that order.
    pub fn with_options(
        selector: impl Into<String>,
        renderer: impl Renderer + 'static,
        options: ContextOptions,
    ) -> Self {
        let selector = selector.into();
        let path = NodePath::new(selector.clone());

        let mut tree = SceneTree::new();
        let root = tree.insert(Node {
            path: Some(path.clone()),
            visibility: Visibility::Shown,
            ..Node::default()
        });
        tree.set_root(root);

        let mut dispatcher = Dispatcher::new(renderer, options.dispatch);
        dispatcher.register_root(path.clone(), root);

        let mut receiver = RootReceiver {
            phase: ContextPhase::Constructed,
        };
        let _ = dispatcher
            .batch()
            .message(Command::Mount { path: path.clone() })
            .message(Command::NeedSizeFor {
                selector: selector.clone(),
            })
            .message(Command::Show { path });
        receiver.phase = ContextPhase::AwaitingInitialSize;
        tracing::debug!(%selector, "context created, awaiting initial size");

        Self {
            selector,
            tree,
            dispatcher,
            root,
            receiver,
        }
    }

    /// Selector of the surface this context is bound to.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Root node identifier.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Current lifecycle phase. Never [`ContextPhase::Constructed`].
    #[must_use]
    pub const fn phase(&self) -> ContextPhase {
        self.receiver.phase
    }

    /// Read access to the node arena.
    #[must_use]
    pub const fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// Read access to the dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Mutable access to the scene graph.
    pub fn scene(&mut self) -> Scene<'_> {
        Scene::new(
            &mut self.tree,
            &mut self.dispatcher,
            Some(&mut self.receiver),
        )
    }

    /// Feeds an event from the renderer into the graph, broadcasting it from the root.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while the event and anything it
    /// triggered were delivered, e.g. a malformed `CONTEXT_RESIZE` payload.
    pub fn receive(&mut self, event: Event) -> Result<()> {
        self.dispatch(event, None)
    }

    /// Feeds an event into the graph, addressed to `target` or broadcast when `None`.
    ///
    /// # Errors
    ///
    /// As [`receive`](Self::receive).
    pub fn dispatch(&mut self, event: Event, target: Option<NodePath>) -> Result<()> {
        self.dispatch_route(event, Route::from(target))
    }

    /// Feeds an event into the graph along an explicit route.
    ///
    /// # Errors
    ///
    /// As [`receive`](Self::receive).
    pub fn dispatch_route(&mut self, event: Event, route: Route) -> Result<()> {
        tracing::trace!(event = event.name(), ?route, "inbound");
        self.dispatcher
            .dispatch(&mut self.tree, &mut self.receiver, event, route)
    }

    /// Dismounts the whole tree and hands the renderer handle back.
    ///
    /// # Errors
    ///
    /// Propagates failures to walk the tree.
    pub fn teardown(mut self) -> Result<Box<dyn Renderer>> {
        let root = self.root;
        self.scene().unmount(root)?;
        tracing::debug!(selector = %self.selector, "context torn down");
        Ok(self.dispatcher.into_renderer())
    }
}
