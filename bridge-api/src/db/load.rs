//! CSV ingestion into the readings table
//!
//! Header names are matched case-insensitively against a small alias list,
//! so exports that call the columns `timestamp` / `Fat_cycle_bot` / `Pos_na`
//! load into the same `time` / `stress_cycle` / `pos_na` schema.

use std::io::Read;
use std::path::Path;

use bridge_common::config::{is_valid_table_name, LoadMode};
use csv::{ReaderBuilder, StringRecord, Trim};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use thiserror::Error;
use tracing::info;

const TIME_ALIASES: &[&str] = &["time", "timestamp", "_time"];
const STRESS_CYCLE_ALIASES: &[&str] = &["stress_cycle", "fat_cycle_bot"];
const POS_NA_ALIASES: &[&str] = &["pos_na"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("Invalid table name '{0}'")]
    InvalidTable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows_inserted: u64,
}

/// Open (creating if needed) a single-connection writable pool on `db_path`
pub async fn open_writable(db_path: &Path) -> Result<SqlitePool, LoadError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        // Rollback journal leaves no -wal/-shm files for read-only readers
        .journal_mode(SqliteJournalMode::Delete);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Load the CSV file at `csv_path` into `table`
pub async fn load_csv(
    pool: &SqlitePool,
    csv_path: &Path,
    table: &str,
    mode: LoadMode,
) -> Result<LoadSummary, LoadError> {
    let file = std::fs::File::open(csv_path)?;
    let summary = load_csv_reader(pool, file, table, mode).await?;
    info!(
        "Loaded {} rows from {} into '{}' ({})",
        summary.rows_inserted,
        csv_path.display(),
        table,
        mode
    );
    Ok(summary)
}

/// Load CSV data from any reader into `table`
///
/// The whole file is parsed before the database is touched; all schema
/// changes and inserts then run in one transaction.
pub async fn load_csv_reader<R: Read>(
    pool: &SqlitePool,
    reader: R,
    table: &str,
    mode: LoadMode,
) -> Result<LoadSummary, LoadError> {
    if !is_valid_table_name(table) {
        return Err(LoadError::InvalidTable(table.to_string()));
    }

    let records = read_records(reader)?;

    let mut tx = pool.begin().await?;

    if mode == LoadMode::Replace {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {} (time TEXT, stress_cycle REAL, pos_na REAL)",
        table
    ))
    .execute(&mut *tx)
    .await?;
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{0}_time ON {0}(time)",
        table
    ))
    .execute(&mut *tx)
    .await?;

    let insert_sql = format!(
        "INSERT INTO {} (time, stress_cycle, pos_na) VALUES (?, ?, ?)",
        table
    );

    let mut rows_inserted = 0;
    for record in records {
        let query = sqlx::query(&insert_sql).bind(record.time);
        let query = bind_numeric(query, record.stress_cycle);
        let query = bind_numeric(query, record.pos_na);
        rows_inserted += query.execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;

    Ok(LoadSummary { rows_inserted })
}

/// One CSV row, fields still as text
#[derive(Debug, Clone, PartialEq)]
struct CsvRecord {
    time: String,
    stress_cycle: String,
    pos_na: String,
}

struct ColumnMap {
    time: usize,
    stress_cycle: usize,
    pos_na: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        Ok(Self {
            time: locate_column(headers, TIME_ALIASES)?,
            stress_cycle: locate_column(headers, STRESS_CYCLE_ALIASES)?,
            pos_na: locate_column(headers, POS_NA_ALIASES)?,
        })
    }

    fn extract(&self, record: &StringRecord) -> CsvRecord {
        let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
        CsvRecord {
            time: field(self.time),
            stress_cycle: field(self.stress_cycle),
            pos_na: field(self.pos_na),
        }
    }
}

fn locate_column(headers: &StringRecord, aliases: &[&'static str]) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|name| aliases.iter().any(|alias| name.eq_ignore_ascii_case(alias)))
        .ok_or(LoadError::MissingColumn(aliases[0]))
}

fn read_records<R: Read>(reader: R) -> Result<Vec<CsvRecord>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(reader.headers()?)?;

    let mut records = Vec::new();
    for result in reader.records() {
        records.push(columns.extract(&result?));
    }
    Ok(records)
}

/// Bind a numeric field as REAL, NULL when empty, or the original text
fn bind_numeric<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    raw: String,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    if raw.is_empty() {
        return query.bind(None::<f64>);
    }
    match raw.parse::<f64>() {
        Ok(value) => query.bind(value),
        Err(_) => query.bind(raw),
    }
}
