pub mod api;
pub mod config;
pub mod db;
pub mod dump;
pub mod error;
pub mod history;
pub mod import;

pub use error::{HrError, Result};

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level.to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
