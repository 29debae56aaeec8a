//! JSON wire format.
//!
//! Outbound commands are encoded as their tagged form, e.g.
//! `{"command":"SIZE_ABSOLUTE","path":"#app/0","size":[10.0,10.0,0.0]}`.
//! Inbound frames carry one event:
//!
//! ```json
//! {"event": "RENDER_SIZE", "target": "#app/0", "payload": [120, 40, 0]}
//! ```
//!
//! `target` and `payload` may be omitted; a frame without a target is
//! broadcast from the root.

use scenery_core::{Command, Event, NodePath};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    /// Event to deliver.
    pub event: Event,
    /// Addressed node, or `None` to broadcast.
    pub target: Option<NodePath>,
}

impl InboundFrame {
    /// Frame broadcasting `event` from the root.
    #[must_use]
    pub const fn broadcast(event: Event) -> Self {
        Self {
            event,
            target: None,
        }
    }

    /// Frame addressing `event` to one node.
    #[must_use]
    pub fn targeted(event: Event, target: impl Into<NodePath>) -> Self {
        Self {
            event,
            target: Some(target.into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireFrame {
    event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<NodePath>,
    #[serde(default)]
    payload: Value,
}

/// Encodes an outbound command.
///
/// # Errors
///
/// Returns [`BridgeError::Json`](crate::BridgeError::Json) if serialization fails.
pub fn encode_command(command: &Command) -> Result<String> {
    Ok(serde_json::to_string(command)?)
}

/// Decodes an outbound command, as a renderer would.
///
/// # Errors
///
/// Returns [`BridgeError::Json`](crate::BridgeError::Json) for malformed input.
pub fn decode_command(text: &str) -> Result<Command> {
    Ok(serde_json::from_str(text)?)
}

/// Encodes an inbound frame, as a renderer would.
///
/// # Errors
///
/// Returns [`BridgeError::Json`](crate::BridgeError::Json) if serialization fails.
pub fn encode_frame(frame: &InboundFrame) -> Result<String> {
    let wire = WireFrame {
        event: frame.event.name().to_owned(),
        target: frame.target.clone(),
        payload: frame.event.payload().clone(),
    };
    Ok(serde_json::to_string(&wire)?)
}

/// Decodes an inbound frame.
///
/// # Errors
///
/// Returns [`BridgeError::Json`](crate::BridgeError::Json) for malformed input.
pub fn decode_frame(text: &str) -> Result<InboundFrame> {
    let WireFrame {
        event,
        target,
        payload,
    } = serde_json::from_str(text)?;
    Ok(InboundFrame {
        event: Event::new(event, payload),
        target,
    })
}
