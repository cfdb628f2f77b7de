pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use algorithms::*;
pub use config::Config;
pub use error::{RecastError, Result};
pub use models::*;

/// Installs the fmt subscriber. `RUST_LOG` takes precedence over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
