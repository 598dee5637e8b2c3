//! Import the MySQL employees sample dataset (datacharmer/test_db) into the
//! `employees` table.
//!
//! The target table must already exist. Connection values come from the
//! flags below; PGHOST, PGPORT, PGUSER, PGPASSWORD and PGDATABASE override
//! them when set.
//!
//! Run with: cargo run --bin import_test_db -- --path test_db

use anyhow::{Context, Result};
use clap::Parser;
use hr_cloud::config::ConnectionParams;
use hr_cloud::db::{init_pool, EmployeeRepository, EmployeeStore, MemoryEmployeeStore};
use hr_cloud::import::{HistoryResolution, ImportOptions, ImportOrchestrator, DEFAULT_BATCH_SIZE};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "import_test_db")]
#[command(about = "Import datacharmer/test_db dumps into the HR employees table")]
struct Args {
    /// Path to the cloned test_db repository
    #[arg(long, default_value = "test_db")]
    path: PathBuf,

    #[arg(long, default_value = "localhost")]
    host: String,

    #[arg(long, default_value_t = 5432)]
    port: u16,

    #[arg(long, default_value = "postgres")]
    user: String,

    #[arg(long, default_value = "")]
    password: String,

    #[arg(long, default_value = "hrdb")]
    database: String,

    /// Rows per upsert batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Resolve departments and titles with the latest-date fallback
    #[arg(long)]
    reconcile_history: bool,

    /// Parse and join everything without connecting to the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    hr_cloud::init_tracing("info");

    let args = Args::parse();

    if !args.path.is_dir() {
        println!(
            "Path {} does not exist. Clone test_db into workspace root or pass correct path.",
            args.path.display()
        );
        return Ok(());
    }

    let options = ImportOptions {
        batch_size: args.batch_size,
        resolution: if args.reconcile_history {
            HistoryResolution::Reconciled
        } else {
            HistoryResolution::Simplified
        },
        ..Default::default()
    };

    let store: Box<dyn EmployeeStore> = if args.dry_run {
        info!("Dry run: importing into memory only");
        Box::new(MemoryEmployeeStore::new())
    } else {
        let params = ConnectionParams::resolve(
            ConnectionParams {
                host: args.host.clone(),
                port: args.port,
                user: args.user.clone(),
                password: args.password.clone(),
                database: args.database.clone(),
            },
            |key| std::env::var(key).ok(),
        )?;
        println!("Connecting to Postgres: {}", params);
        let pool = init_pool(params.connect_options(), 1)
            .await
            .with_context(|| format!("Failed to connect to {}", params))?;
        Box::new(EmployeeRepository::new(pool))
    };

    let orchestrator = ImportOrchestrator::new(store.as_ref(), options)?;
    let summary = orchestrator.run(&args.path).await?;

    println!(
        "Import complete. Total inserted (approx): {}",
        summary.rows_submitted
    );
    println!(
        "  new rows: {}, skipped rows: {}, batches: {}",
        summary.rows_inserted, summary.rows_skipped, summary.batches
    );
    println!(
        "  departments: {}, current assignments: {}, current titles: {}",
        summary.departments, summary.assignments, summary.titles
    );
    Ok(())
}
