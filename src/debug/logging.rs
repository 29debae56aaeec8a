//! Console logging for hosts embedding Scenery.
//!
//! Library crates only emit `tracing` events. [`install`] wires them to
//! stderr once per process. An event is printed only when both `RUST_LOG`
//! (default `info`) and the runtime level set with [`set_log_level`]
//! (default `info`) allow it.

use std::str::FromStr;
use std::sync::{Arc, Mutex, Once, OnceLock};

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::INFO;

// ============================================================================
// Global State
// ============================================================================

static TRACING_INSTALLED: Once = Once::new();
static LOG_LEVEL: OnceLock<Arc<Mutex<LevelFilter>>> = OnceLock::new();

fn get_log_level_handle() -> Arc<Mutex<LevelFilter>> {
    LOG_LEVEL
        .get_or_init(|| Arc::new(Mutex::new(DEFAULT_LOG_LEVEL)))
        .clone()
}

/// Update the runtime log level. Unparseable levels fall back to `info`.
pub fn set_log_level(level: &str) {
    let parsed = LevelFilter::from_str(level).unwrap_or(DEFAULT_LOG_LEVEL);
    if let Ok(mut guard) = get_log_level_handle().lock() {
        *guard = parsed;
    }
}

/// Current runtime log level.
#[must_use]
pub fn log_level() -> LevelFilter {
    get_log_level_handle()
        .lock()
        .map_or(DEFAULT_LOG_LEVEL, |guard| *guard)
}

// ============================================================================
// Installation
// ============================================================================

/// Install the console subscriber (idempotent).
///
/// Does nothing when another global subscriber is already set.
pub fn install() {
    TRACING_INSTALLED.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let level = get_log_level_handle();
        let gate = filter_fn(move |metadata| {
            let current = level.lock().map_or(DEFAULT_LOG_LEVEL, |guard| *guard);
            level_allows(current, *metadata.level())
        });

        let console = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(true)
            .with_filter(gate);

        let result = tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init();

        if result.is_err() {
            eprintln!("Scenery logging failed to initialize: a global subscriber is already set");
        }
    });
}

const fn level_allows(filter: LevelFilter, level: Level) -> bool {
    match filter {
        LevelFilter::OFF => false,
        LevelFilter::ERROR => matches!(level, Level::ERROR),
        LevelFilter::WARN => matches!(level, Level::ERROR | Level::WARN),
        LevelFilter::INFO => matches!(level, Level::ERROR | Level::WARN | Level::INFO),
        LevelFilter::DEBUG => matches!(
            level,
            Level::ERROR | Level::WARN | Level::INFO | Level::DEBUG
        ),
        LevelFilter::TRACE => true,
    }
}
