pub mod api;
pub mod cases;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod intake;
pub mod models;
pub mod participants;
pub mod permissions;
pub mod users;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a host binary. Respects `RUST_LOG`, falling back
/// to the crate-scoped default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
