//! Development-time helpers for hosts embedding Scenery.

pub mod logging;

pub use logging::{install as install_logging, set_log_level};
