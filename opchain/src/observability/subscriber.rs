//! Process-wide `tracing` subscriber setup.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a human-readable fmt subscriber filtered by `RUST_LOG`.
///
/// Falls back to `info` when `RUST_LOG` is unset or invalid. Safe to call
/// repeatedly; a subscriber installed elsewhere is left in place.
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_target(true)
            .try_init()
            .ok();
    });
}

/// Installs a JSON-lines fmt subscriber filtered by `RUST_LOG`.
pub fn init_json_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .with_current_span(false)
            .try_init()
            .ok();
    });
}
