//! Subscriber setup for binaries and demos.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "nexus_events=info";

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `default_directive`.
/// Returns false when a global subscriber was already set.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}
