//! Errors raised while moving frames across the bridge.

use scenery_core::SceneError;
use thiserror::Error;

/// Failure to encode, decode or deliver a frame.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A frame was not valid JSON or did not have the expected shape.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    /// The scene graph rejected a decoded event.
    #[error(transparent)]
    Scene(#[from] SceneError),
    /// The other end of the channel is gone.
    #[error("bridge channel closed")]
    ChannelClosed,
}

/// Result alias for bridge operations.
pub type Result<T, E = BridgeError> = core::result::Result<T, E>;
