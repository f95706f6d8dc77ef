//! Row sources feeding the query pipeline
//!
//! The query endpoint only needs "ordered, numerically valid readings", so
//! storage sits behind the [`RowSource`] trait. [`SqliteRowSource`] reads the
//! configured table through a read-only pool; [`MemoryRowSource`] serves a
//! fixed set of readings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bridge_common::config::Settings;
use bridge_common::time::parse_timestamp;
use bridge_common::Reading;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, error};

pub mod load;
mod tables;

pub use tables::{list_table_names, list_tables, TableInfo};

/// Connections held by the read-only pool
const MAX_READ_CONNECTIONS: u32 = 4;

/// How long a request waits for a pooled connection
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Row source failures; all of them abort the request
#[derive(Debug, Error)]
pub enum SourceError {
    /// Backing database file does not exist
    #[error("Database not found: {}", path.display())]
    MissingDatabase { path: PathBuf },

    /// Connection or query failure
    #[error("Failed to read table '{table}': {source}")]
    Query {
        table: String,
        #[source]
        source: sqlx::Error,
        /// Tables present in the store, for operators
        available_tables: Vec<String>,
    },
}

impl SourceError {
    /// Tables known to exist in the store when the error happened
    pub fn available_tables(&self) -> &[String] {
        match self {
            SourceError::MissingDatabase { .. } => &[],
            SourceError::Query {
                available_tables, ..
            } => available_tables,
        }
    }
}

/// Provider of raw readings, ascending by time
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch every valid reading, ascending by time
    ///
    /// Rows whose time or numeric fields do not coerce are dropped, not
    /// reported.
    async fn fetch_readings(&self) -> Result<Vec<Reading>, SourceError>;

    /// Tables visible in the backing store (empty when not applicable)
    async fn tables(&self) -> Result<Vec<TableInfo>, SourceError> {
        Ok(Vec::new())
    }
}

/// Reads readings from a SQLite table
pub struct SqliteRowSource {
    pool: SqlitePool,
    db_path: PathBuf,
    table_name: String,
}

impl SqliteRowSource {
    /// Create a source over the database and table named in `settings`
    ///
    /// The pool is read-only and connects lazily, so a missing database is
    /// reported per request rather than at startup. Must be called inside a
    /// Tokio runtime.
    pub fn new(settings: &Settings) -> bridge_common::Result<Self> {
        let db_path = settings.resolved_db_path()?;
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .read_only(true)
            .create_if_missing(false)
            .busy_timeout(ACQUIRE_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_READ_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);

        Ok(Self {
            pool,
            db_path,
            table_name: settings.table_name.clone(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn ensure_database_exists(&self) -> Result<(), SourceError> {
        if self.db_path.exists() {
            Ok(())
        } else {
            Err(SourceError::MissingDatabase {
                path: self.db_path.clone(),
            })
        }
    }

    async fn query_error(&self, source: sqlx::Error) -> SourceError {
        error!("Query on table '{}' failed: {}", self.table_name, source);
        let available_tables = match list_table_names(&self.pool).await {
            Ok(names) => names,
            Err(e) => {
                debug!("Could not list tables for diagnostics: {}", e);
                Vec::new()
            }
        };
        SourceError::Query {
            table: self.table_name.clone(),
            source,
            available_tables,
        }
    }
}

#[async_trait]
impl RowSource for SqliteRowSource {
    async fn fetch_readings(&self) -> Result<Vec<Reading>, SourceError> {
        self.ensure_database_exists()?;

        // Table name is validated as a plain identifier in Settings.
        // Values are read as text and coerced here so that numbers stored
        // as TEXT still count and junk is dropped instead of failing the query.
        let sql = format!(
            "SELECT CAST(time AS TEXT), CAST(stress_cycle AS TEXT), CAST(pos_na AS TEXT) \
             FROM {} ORDER BY time",
            self.table_name
        );

        // The pooled connection goes back to the pool as soon as fetch_all
        // returns, whichever way it returns.
        let rows: Vec<RawRow> = match sqlx::query_as(&sql).fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => return Err(self.query_error(e).await),
        };

        let total = rows.len();
        let readings = coerce_rows(rows);
        if readings.len() < total {
            debug!(
                "Dropped {} of {} rows from '{}' that failed coercion",
                total - readings.len(),
                total,
                self.table_name
            );
        }

        Ok(readings)
    }

    async fn tables(&self) -> Result<Vec<TableInfo>, SourceError> {
        self.ensure_database_exists()?;
        match list_tables(&self.pool).await {
            Ok(tables) => Ok(tables),
            Err(e) => Err(self.query_error(e).await),
        }
    }
}

/// Fixed, in-process readings
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    readings: Vec<Reading>,
}

impl MemoryRowSource {
    /// Readings are sorted by time on construction
    pub fn new(mut readings: Vec<Reading>) -> Self {
        readings.sort_by_key(|r| r.time);
        Self { readings }
    }
}

#[async_trait]
impl RowSource for MemoryRowSource {
    async fn fetch_readings(&self) -> Result<Vec<Reading>, SourceError> {
        Ok(self.readings.clone())
    }
}

type RawRow = (Option<String>, Option<String>, Option<String>);

fn parse_finite(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce text rows into readings, dropping any row with an unparseable
/// time or a non-finite value, then order by time
///
/// The sort is stable, so rows with equal timestamps keep the store's order.
pub(crate) fn coerce_rows(rows: Vec<RawRow>) -> Vec<Reading> {
    let mut readings: Vec<Reading> = rows
        .into_iter()
        .filter_map(|(time, stress_cycle, pos_na)| {
            let time = parse_timestamp(time.as_deref()?)?;
            let stress_cycle = parse_finite(stress_cycle.as_deref())?;
            let pos_na = parse_finite(pos_na.as_deref())?;
            Some(Reading::new(time, stress_cycle, pos_na))
        })
        .collect();

    // Text ordering in SQL matches time ordering only when every row uses
    // the same layout and offset
    readings.sort_by_key(|r| r.time);
    readings
}
