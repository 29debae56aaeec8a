//! Inbound events routed through the scene graph.

use alloc::{borrow::Cow, string::String};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SceneError};

/// Surface resize reported by the renderer. Payload: `[x, y, z, ...]`.
pub const CONTEXT_RESIZE: &str = "CONTEXT_RESIZE";

/// Content size of a render-sized node. Payload: `[x, y, z, ...]`.
pub const RENDER_SIZE: &str = "RENDER_SIZE";

/// A named event with an arbitrary JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: Cow<'static, str>,
    #[serde(default)]
    payload: Value,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Creates a [`CONTEXT_RESIZE`] event for the given extents.
    #[must_use]
    pub fn context_resize(x: f32, y: f32, z: f32) -> Self {
        Self::new(CONTEXT_RESIZE, Value::from(vec![x, y, z]))
    }

    /// Creates a [`RENDER_SIZE`] event for the given extents.
    #[must_use]
    pub fn render_size(x: f32, y: f32, z: f32) -> Self {
        Self::new(RENDER_SIZE, Value::from(vec![x, y, z]))
    }

    /// Event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Event payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns `true` if the event carries the given name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Reads the payload as an `[x, y, z]` triple of pixel extents.
    ///
    /// Entries past index 2 are ignored. Nothing is coerced: a missing,
    /// non-numeric, negative or non-finite entry is an error.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidOperation`] if the payload is not an array
    /// of at least three numeric extents.
    pub fn extents(&self) -> Result<[f32; 3]> {
        let entries = self.payload.as_array().ok_or_else(|| {
            SceneError::invalid(format!("{} payload must be an array", self.name))
        })?;
        if entries.len() < 3 {
            return Err(SceneError::invalid(format!(
                "{} payload needs 3 extents, got {}",
                self.name,
                entries.len()
            )));
        }

        let mut extents = [0.0_f32; 3];
        for (slot, entry) in extents.iter_mut().zip(entries) {
            let value = entry.as_f64().ok_or_else(|| {
                SceneError::invalid(format!("{} payload entry {entry} is not a number", self.name))
            })?;
            #[allow(clippy::cast_possible_truncation)]
            let value = value as f32;
            if !value.is_finite() || value < 0.0 {
                return Err(SceneError::invalid(format!(
                    "{} payload entry {entry} is not a valid extent",
                    self.name
                )));
            }
            *slot = value;
        }
        Ok(extents)
    }
}

/// Events are cheap to name from string literals.
impl From<&'static str> for Event {
    fn from(name: &'static str) -> Self {
        Self::new(name, Value::Null)
    }
}

impl From<(String, Value)> for Event {
    fn from((name, payload): (String, Value)) -> Self {
        Self::new(name, payload)
    }
}
