//! Outbound commands and the renderer handle they are delivered to.

use alloc::{collections::VecDeque, rc::Rc, vec::Vec};
use core::{cell::RefCell, fmt::Debug};

use serde::{Deserialize, Serialize};

use crate::path::NodePath;

/// Instruction sent from the scene graph to the renderer.
///
/// Every variant except [`Command::NeedSizeFor`] is addressed by the path of
/// the emitting node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// The node became part of the mounted tree.
    Mount {
        /// Emitting node.
        path: NodePath,
    },
    /// The node left the mounted tree.
    Dismount {
        /// Emitting node.
        path: NodePath,
    },
    /// The node became visible.
    Show {
        /// Emitting node.
        path: NodePath,
    },
    /// The node became hidden.
    Hide {
        /// Emitting node.
        path: NodePath,
    },
    /// The node's fully resolved size.
    SizeAbsolute {
        /// Emitting node.
        path: NodePath,
        /// Extents on X, Y and Z.
        size: [f32; 3],
    },
    /// Asks the renderer for the pixel size of a display surface.
    NeedSizeFor {
        /// Selector of the surface.
        selector: String,
    },
}

impl Command {
    /// Wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mount { .. } => "MOUNT",
            Self::Dismount { .. } => "DISMOUNT",
            Self::Show { .. } => "SHOW",
            Self::Hide { .. } => "HIDE",
            Self::SizeAbsolute { .. } => "SIZE_ABSOLUTE",
            Self::NeedSizeFor { .. } => "NEED_SIZE_FOR",
        }
    }

    /// Node the command is addressed to, if any.
    #[must_use]
    pub const fn path(&self) -> Option<&NodePath> {
        match self {
            Self::Mount { path }
            | Self::Dismount { path }
            | Self::Show { path }
            | Self::Hide { path }
            | Self::SizeAbsolute { path, .. } => Some(path),
            Self::NeedSizeFor { .. } => None,
        }
    }
}

/// Handle to the external renderer.
///
/// Delivery is fire-and-forget: implementations must not block, and must
/// preserve the order in which messages are handed to them.
pub trait Renderer: Debug {
    /// Hands one command to the renderer.
    fn message(&mut self, command: Command);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn message(&mut self, command: Command) {
        self.as_mut().message(command);
    }
}

/// In-memory renderer handle that buffers commands until the host drains them.
///
/// Clones share the same buffer, so a host can keep one clone while the
/// context owns another.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Rc<RefCell<VecDeque<Command>>>,
}

impl CommandQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every buffered command in send order.
    #[must_use]
    pub fn drain(&self) -> Vec<Command> {
        self.inner.borrow_mut().drain(..).collect()
    }

    /// Copies the buffered commands without consuming them.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Command> {
        self.inner.borrow().iter().cloned().collect()
    }

    /// Number of buffered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl Renderer for CommandQueue {
    fn message(&mut self, command: Command) {
        self.inner.borrow_mut().push_back(command);
    }
}
