//! Settings loading and resolution
//!
//! Every setting is resolved in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command-line arguments and environment variables are parsed together by
//! the binaries (clap with `env`), so they arrive here as one
//! [`PartialSettings`] layer. The result is an immutable [`Settings`] value
//! built once at startup.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, info};

use crate::{Error, Result};

/// Config file name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "bridge.toml";

/// How the CSV loader treats an existing table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Drop and recreate the table
    #[default]
    Replace,
    /// Keep existing rows and add new ones
    Append,
}

impl FromStr for LoadMode {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(LoadMode::Replace),
            "append" => Ok(LoadMode::Append),
            other => Err(Error::Config(format!(
                "MODE_DB must be 'replace' or 'append', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::Replace => f.write_str("replace"),
            LoadMode::Append => f.write_str("append"),
        }
    }
}

/// One layer of optional settings (TOML file, or CLI + environment)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialSettings {
    pub db_url: Option<String>,
    pub csv_path: Option<PathBuf>,
    pub table_name: Option<String>,
    pub mode_db: Option<LoadMode>,
    pub enable_debug_endpoint: Option<bool>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl PartialSettings {
    /// Fill every unset field from `lower`
    pub fn or(self, lower: PartialSettings) -> PartialSettings {
        PartialSettings {
            db_url: self.db_url.or(lower.db_url),
            csv_path: self.csv_path.or(lower.csv_path),
            table_name: self.table_name.or(lower.table_name),
            mode_db: self.mode_db.or(lower.mode_db),
            enable_debug_endpoint: self.enable_debug_endpoint.or(lower.enable_debug_endpoint),
            host: self.host.or(lower.host),
            port: self.port.or(lower.port),
        }
    }
}

/// Compiled defaults
pub struct CompiledDefaults;

impl CompiledDefaults {
    pub const DB_URL: &'static str = "sqlite:///./data/midspan_data.db";
    pub const CSV_PATH: &'static str = "./data/midspan_data.csv";
    pub const TABLE_NAME: &'static str = "midspan_data";
    pub const HOST: &'static str = "127.0.0.1";
    pub const PORT: u16 = 8000;
}

/// Process-wide settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_url: String,
    pub csv_path: PathBuf,
    pub table_name: String,
    pub mode_db: LoadMode,
    pub enable_debug_endpoint: bool,
    pub host: String,
    pub port: u16,
    /// Base for relative paths in `db_url` and `csv_path`
    pub project_root: PathBuf,
}

impl Settings {
    /// Merge a CLI/environment layer over an optional TOML layer and the
    /// compiled defaults, then validate
    pub fn resolve(
        overrides: PartialSettings,
        file: Option<PartialSettings>,
        project_root: PathBuf,
    ) -> Result<Self> {
        let merged = overrides.or(file.unwrap_or_default());

        let settings = Settings {
            db_url: merged
                .db_url
                .unwrap_or_else(|| CompiledDefaults::DB_URL.to_string()),
            csv_path: merged
                .csv_path
                .unwrap_or_else(|| PathBuf::from(CompiledDefaults::CSV_PATH)),
            table_name: merged
                .table_name
                .unwrap_or_else(|| CompiledDefaults::TABLE_NAME.to_string()),
            mode_db: merged.mode_db.unwrap_or_default(),
            enable_debug_endpoint: merged.enable_debug_endpoint.unwrap_or(false),
            host: merged
                .host
                .unwrap_or_else(|| CompiledDefaults::HOST.to_string()),
            port: merged.port.unwrap_or(CompiledDefaults::PORT),
            project_root,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Load the config file (if any) and resolve against `overrides`
    ///
    /// `explicit_config` must exist when given. Otherwise the first of
    /// `./bridge.toml` and the user config file that exists is used, and no
    /// file at all is fine. Relative paths resolve against the config
    /// file's directory, or the working directory when there is no file.
    pub fn load(overrides: PartialSettings, explicit_config: Option<&Path>) -> Result<Self> {
        let config_path = match explicit_config {
            Some(path) if !path.exists() => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };

        let (file, project_root) = match config_path {
            Some(path) => {
                info!("Loading settings from {}", path.display());
                let layer = load_toml_file(&path)?;
                let root = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    Some(parent) => parent.to_path_buf(),
                    None => std::env::current_dir()?,
                };
                (Some(layer), root)
            }
            None => {
                debug!("No config file found, using command line, environment and defaults");
                (None, std::env::current_dir()?)
            }
        };

        Self::resolve(overrides, file, project_root)
    }

    fn validate(&self) -> Result<()> {
        if !is_valid_table_name(&self.table_name) {
            return Err(Error::Config(format!(
                "TABLE_NAME must match [A-Za-z_][A-Za-z0-9_]*, got '{}'",
                self.table_name
            )));
        }
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        sqlite_path_from_url(&self.db_url)?;
        Ok(())
    }

    /// True when `db_url` names a SQLite database
    pub fn is_sqlite(&self) -> bool {
        sqlite_path_from_url(&self.db_url).is_ok()
    }

    /// Absolute path of the SQLite database file
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        let path = sqlite_path_from_url(&self.db_url)?;
        Ok(self.resolve_path(&path))
    }

    /// Absolute path of the CSV file loaded by `bridge-load`
    pub fn resolved_csv_path(&self) -> PathBuf {
        self.resolve_path(&self.csv_path)
    }

    /// `host:port` for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path.strip_prefix(".").unwrap_or(path))
        }
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Extract the file path from a SQLite URL
///
/// `sqlite:///rel/path.db` is relative, `sqlite:////abs/path.db` is
/// absolute (SQLAlchemy convention), `sqlite://path.db` is taken as written,
/// and a value with no scheme is a plain file path. Query strings are
/// dropped. Other schemes are rejected.
pub fn sqlite_path_from_url(db_url: &str) -> Result<PathBuf> {
    let trimmed = db_url.trim();
    let without_query = trimmed.split('?').next().unwrap_or(trimmed);

    let path = if let Some(rest) = without_query.strip_prefix("sqlite:///") {
        rest.to_string()
    } else if let Some(rest) = without_query.strip_prefix("sqlite://") {
        rest.to_string()
    } else if let Some(rest) = without_query.strip_prefix("sqlite:") {
        rest.to_string()
    } else if without_query.contains("://") {
        return Err(Error::Config(format!(
            "Only SQLite databases are supported, got '{}'",
            db_url
        )));
    } else {
        without_query.to_string()
    };

    if path.is_empty() || path == ":memory:" {
        return Err(Error::Config(format!(
            "DB_URL must name a database file, got '{}'",
            db_url
        )));
    }

    Ok(PathBuf::from(path))
}

/// Parse a TOML settings file
pub fn load_toml_file(path: &Path) -> Result<PartialSettings> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// First existing default config file: `./bridge.toml`, then
/// `<config dir>/bridge-health/config.toml`
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|d| d.join("bridge-health").join("config.toml"))
        .filter(|p| p.exists())
}
