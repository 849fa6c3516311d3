//! Diagnostic logging.
//!
//! Progress meant for the user is printed directly by the commands. Everything
//! else goes through `tracing` and is written to stderr, filtered by
//! `RUST_LOG` (default `warn`), e.g. `RUST_LOG=tunny_installer=debug`.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
