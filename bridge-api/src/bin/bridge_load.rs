//! bridge-load - load the sensor CSV export into SQLite

use anyhow::{Context, Result};
use bridge_api::cli::{init_tracing, SettingsArgs};
use bridge_api::db::load::{load_csv, open_writable};
use bridge_common::config::Settings;
use clap::Parser;
use tracing::info;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "bridge-load")]
#[command(about = "Load bridge sensor CSV data into the database", long_about = None)]
#[command(version)]
struct Args {
    #[command(flatten)]
    settings: SettingsArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting bridge-load v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let settings = Settings::load(args.settings.to_partial(), args.settings.config.as_deref())
        .context("Failed to resolve settings")?;

    let db_path = settings
        .resolved_db_path()
        .context("Failed to resolve database path")?;
    let csv_path = settings.resolved_csv_path();

    info!(
        "Loading {} into '{}' at {} (mode: {})",
        csv_path.display(),
        settings.table_name,
        db_path.display(),
        settings.mode_db
    );

    let pool = open_writable(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let summary = load_csv(&pool, &csv_path, &settings.table_name, settings.mode_db)
        .await
        .with_context(|| format!("Failed to load {}", csv_path.display()))?;

    pool.close().await;

    println!(
        "Data from {} has been loaded into the {} table ({} rows).",
        csv_path.display(),
        settings.table_name,
        summary.rows_inserted
    );
    Ok(())
}
