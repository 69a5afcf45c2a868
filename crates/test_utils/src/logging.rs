//! Test Logging
//!
//! Installs a `tracing` subscriber once per test binary so that spans and
//! events emitted by the engine show up in failing test output.

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

/// Initializes test logging; `RUST_LOG` overrides the default `info` level
///
/// Safe to call from every test.
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}
