#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::future_not_send)]

pub mod debug;

pub use scenery_bridge as bridge;
pub use scenery_core::*;

pub mod prelude {
    //! A collection of commonly used types for easy importing.
    //!
    //! # Example
    //!
    //! ```rust
    //! use scenery::prelude::*;
    //!
    //! let mut context = Context::new("#app", CommandQueue::new());
    //! let root = context.root();
    //! let mut scene = context.scene();
    //! let child = scene.create_node();
    //! scene.add_child(root, child)?;
    //! # Ok::<(), SceneError>(())
    //! ```
    pub use scenery_bridge::{BridgeError, ChannelRenderer, InboundFrame, pump};
    pub use scenery_core::{
        Command, CommandQueue, Context, ContextOptions, ContextPhase, DispatchOptions, Event,
        EventReceiver, NodeId, NodePath, Renderer, Resolution, Route, Scene, SceneError,
        SizeMode,
    };
}

use async_channel::Receiver;
use scenery_bridge::ChannelRenderer;

/// Creates a context whose commands are encoded as JSON onto a fresh channel.
///
/// The returned receiver is the renderer's end: it already holds the
/// `MOUNT`, `NEED_SIZE_FOR` and `SHOW` frames of the handshake.
#[must_use]
pub fn connect(selector: &str, options: ContextOptions) -> (Context, Receiver<String>) {
    let (renderer, commands) = ChannelRenderer::unbounded();
    tracing::debug!(selector, "connecting context over channel");
    (Context::with_options(selector, renderer, options), commands)
}
