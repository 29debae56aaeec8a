//! Wire bridge between a Scenery [`Context`](scenery_core::Context) and a
//! renderer living on the other side of a channel.
//!
//! Outbound, [`ChannelRenderer`] encodes each [`Command`](scenery_core::Command)
//! as JSON and pushes it onto an `async-channel`. Inbound, [`pump`] decodes
//! frames produced by the renderer and feeds them to the context one at a
//! time, so delivery stays single-threaded whatever executor drives it.

pub mod channel;
pub mod codec;
pub mod error;
pub mod pump;

pub use channel::ChannelRenderer;
pub use codec::{InboundFrame, decode_command, decode_frame, encode_command, encode_frame};
pub use error::BridgeError;
pub use pump::{pump, send_frame};
