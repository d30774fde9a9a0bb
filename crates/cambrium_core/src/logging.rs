//! Structured logging setup.
//!
//! The engine emits `tracing` events; hosts decide where they go. This
//! installs a plain fmt subscriber for binaries and tests that want output.

use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber at `level`. Later calls are no-ops.
pub fn init_logging(level: tracing::Level) {
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(level)
            .finish(),
    )
    .ok();
}

/// Installs a global fmt subscriber writing to stderr, filtered by
/// `RUST_LOG` when set and by `default_directive` otherwise. Later calls are
/// no-ops.
pub fn init_env_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
