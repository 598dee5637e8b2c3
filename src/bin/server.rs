//! HTTP server for the HR Cloud API
//!
//! Run with: cargo run --bin server

use anyhow::{Context, Result};
use hr_cloud::api::{self, AppState};
use hr_cloud::config::Settings;
use hr_cloud::db::{init_pool, EmployeeRepository};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;
    hr_cloud::init_tracing(&settings.log_level);

    info!(
        "Starting {} v{} ({})",
        settings.app_name, settings.app_version, settings.environment
    );

    let options = settings.connect_options()?;
    let pool = init_pool(options, 10)
        .await
        .with_context(|| format!("Failed to connect to {}:{}/{}", settings.db_host, settings.db_port, settings.db_name))?;
    info!("Connected to database {}", settings.db_name);

    let listener = TcpListener::bind(&settings.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server_addr))?;
    info!("Server listening on {}{}", settings.server_addr, settings.api_prefix);

    let state = Arc::new(AppState::new(settings, Arc::new(EmployeeRepository::new(pool))));
    api::serve(listener, state).await?;
    Ok(())
}
