//! Tracing subscriber setup for `burrowd`.
//!
//! Logs go to stderr so `get-range` can stream raw payload bytes on stdout.
//! `RUST_LOG` overrides the configured level.

use tracing_subscriber::EnvFilter;

/// Install the console subscriber. Call once, before any event is emitted.
pub fn init_console(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
