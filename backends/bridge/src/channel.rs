//! Renderer handle writing encoded commands into a channel.

use async_channel::{Receiver, Sender, TrySendError};
use scenery_core::{Command, Renderer};

use crate::codec::encode_command;

/// [`Renderer`] that forwards every command as one JSON string.
///
/// Commands are sent in issue order. The renderer never blocks the scene
/// graph: when the channel is closed or full the command is dropped and a
/// warning is logged.
#[derive(Debug, Clone)]
pub struct ChannelRenderer {
    sender: Sender<String>,
}

impl ChannelRenderer {
    /// Wraps an existing sender.
    #[must_use]
    pub const fn new(sender: Sender<String>) -> Self {
        Self { sender }
    }

    /// Creates a renderer over a fresh unbounded channel and returns the
    /// receiving end the external renderer reads from.
    #[must_use]
    pub fn unbounded() -> (Self, Receiver<String>) {
        let (sender, receiver) = async_channel::unbounded();
        (Self::new(sender), receiver)
    }

    /// Returns `true` once the receiving end is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl Renderer for ChannelRenderer {
    fn message(&mut self, command: Command) {
        let frame = match encode_command(&command) {
            Ok(frame) => frame,
            Err(error) => {
                tracing::warn!(command = command.name(), %error, "failed to encode command");
                return;
            }
        };
        match self.sender.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(command = command.name(), "renderer channel closed, dropping command");
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(command = command.name(), "renderer channel full, dropping command");
            }
        }
    }
}
