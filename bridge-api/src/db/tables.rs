//! Table listing for diagnostics

use serde::Serialize;
use sqlx::SqlitePool;

/// A user table and how many rows it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub row_count: i64,
}

/// Names of user tables in alphabetical order (SQLite internals excluded)
pub async fn list_table_names(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

/// User tables with their row counts, for the debug endpoint
pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<TableInfo>, sqlx::Error> {
    let names = list_table_names(pool).await?;
    let mut tables = Vec::with_capacity(names.len());

    for name in names {
        let count_sql = format!("SELECT COUNT(*) FROM \"{}\"", name.replace('"', "\"\""));
        let row_count: i64 = sqlx::query_scalar(&count_sql).fetch_one(pool).await?;
        tables.push(TableInfo { name, row_count });
    }

    Ok(tables)
}
