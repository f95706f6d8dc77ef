//! Command-line and environment arguments shared by the binaries

use std::path::PathBuf;

use bridge_common::config::{LoadMode, PartialSettings};
use clap::Args;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Setting overrides; each flag falls back to its environment variable
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Path to a TOML config file
    #[arg(short, long, env = "BRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database URL or path
    #[arg(long, env = "DB_URL")]
    pub db_url: Option<String>,

    /// CSV file to load
    #[arg(long, env = "CSV_PATH")]
    pub csv_path: Option<PathBuf>,

    /// Table holding the readings
    #[arg(long, env = "TABLE_NAME")]
    pub table_name: Option<String>,

    /// Load mode: replace or append
    #[arg(long, env = "MODE_DB")]
    pub mode_db: Option<LoadMode>,

    /// Mount GET /debug/config
    #[arg(long, env = "ENABLE_DEBUG_ENDPOINT")]
    pub enable_debug_endpoint: Option<bool>,

    /// Address to bind
    #[arg(long, env = "BRIDGE_HOST")]
    pub host: Option<String>,

    /// Port to bind
    #[arg(short, long, env = "BRIDGE_PORT")]
    pub port: Option<u16>,
}

impl SettingsArgs {
    /// Settings layer from flags and environment
    pub fn to_partial(&self) -> PartialSettings {
        PartialSettings {
            db_url: self.db_url.clone(),
            csv_path: self.csv_path.clone(),
            table_name: self.table_name.clone(),
            mode_db: self.mode_db,
            enable_debug_endpoint: self.enable_debug_endpoint,
            host: self.host.clone(),
            port: self.port,
        }
    }
}

/// Initialize tracing; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bridge_api=info,bridge_load=info,bridge_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
