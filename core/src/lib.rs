//! Update and dispatch core of the Scenery scene graph.
//!
//! A [`Context`] roots one tree of nodes bound to a display surface. Nodes
//! live in a [`SceneTree`] arena and are manipulated through a [`Scene`],
//! which keeps three things consistent on every change:
//!
//! - the tree topology (acyclic, one parent per attached node),
//! - the per-axis size resolution (absolute, relative and render-measured
//!   extents, invalidated depth-first when a parent changes),
//! - the [`Dispatcher`]'s identity table and the ordered stream of
//!   [`Command`]s sent to the external renderer.
//!
//! Inbound renderer events enter through [`Context::receive`] and are routed
//! to node [`EventReceiver`]s and handlers.
//!
//! # Example
//!
//! ```rust
//! use scenery_core::{CommandQueue, Context, Event};
//!
//! let queue = CommandQueue::new();
//! let mut context = Context::new("#app", queue.clone());
//! context.receive(Event::context_resize(800.0, 600.0, 0.0))?;
//!
//! let root = context.root();
//! let mut scene = context.scene();
//! let panel = scene.create_node();
//! scene.set_relative_size(panel, 0.5, 1.0, 1.0)?;
//! scene.add_child(root, panel)?;
//! scene.show(panel)?;
//!
//! let size = scene.size(panel)?;
//! assert_eq!(size[0].value(), Some(400.0));
//! # Ok::<(), scenery_core::SceneError>(())
//! ```

extern crate alloc;

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod node;
pub mod options;
pub mod path;
pub mod scene;
pub mod size;
pub mod tree;


pub use command::{Command, CommandQueue, Renderer};
pub use context::{Context, ContextPhase};
pub use dispatcher::{CommandBatch, Dispatcher, Route};
pub use error::{Result, SceneError};
pub use event::{CONTEXT_RESIZE, Event, RENDER_SIZE};
pub use node::{EventReceiver, Handler, HandlerTable, MountState, Node, Visibility};
pub use options::{ContextOptions, DispatchOptions};
pub use path::NodePath;
pub use scene::Scene;
pub use size::{Axis, AxisSet, NodeSize, Resolution, SizeMode};
pub use tree::{NodeId, SceneTree};
