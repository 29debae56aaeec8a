//! Tunables for contexts and their dispatchers.
//!
//! Options deserialize with defaults for every missing field, so hosts can
//! keep them in a JSON document next to the rest of their configuration.

use serde::{Deserialize, Deserializer, Serialize, de};

/// Upper bound on events drained in one dispatch before it is treated as runaway.
pub const DEFAULT_MAX_EVENTS_PER_DRAIN: usize = 4096;

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    /// Events (including re-entrant ones) one drain may process before it
    /// fails with [`SceneError::DispatchOverflow`](crate::SceneError::DispatchOverflow).
    /// Never below one; documents setting zero are rejected.
    #[serde(deserialize_with = "at_least_one")]
    pub max_events_per_drain: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            max_events_per_drain: DEFAULT_MAX_EVENTS_PER_DRAIN,
        }
    }
}

impl DispatchOptions {
    /// Sets the drain limit, raising zero to one.
    #[must_use]
    pub const fn max_events_per_drain(mut self, limit: usize) -> Self {
        self.max_events_per_drain = if limit == 0 { 1 } else { limit };
        self
    }
}

fn at_least_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let limit = usize::deserialize(deserializer)?;
    if limit == 0 {
        return Err(de::Error::custom("max_events_per_drain must be at least 1"));
    }
    Ok(limit)
}

/// Context settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// Settings for the context's dispatcher.
    pub dispatch: DispatchOptions,
}

impl ContextOptions {
    /// Parses options from JSON, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error for malformed documents.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Replaces the dispatcher settings.
    #[must_use]
    pub const fn dispatch(mut self, dispatch: DispatchOptions) -> Self {
        self.dispatch = dispatch;
        self
    }
}
