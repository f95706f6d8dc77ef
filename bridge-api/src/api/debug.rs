//! Configuration diagnostics endpoint
//!
//! Only registered when `enable_debug_endpoint` is set.

use std::path::PathBuf;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use super::error::ApiResult;
use crate::db::TableInfo;
use crate::AppState;

/// Debug configuration response
#[derive(Debug, Serialize)]
pub struct DebugConfigResponse {
    pub table_name: String,
    pub db_path: Option<PathBuf>,
    pub database_exists: bool,
    pub available_tables: Vec<TableInfo>,
    pub enable_debug_endpoint: bool,
}

/// GET /debug/config
pub async fn get_debug_config(State(state): State<AppState>) -> ApiResult<Json<DebugConfigResponse>> {
    let settings = &state.settings;

    let db_path = match settings.resolved_db_path() {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Could not resolve database path: {}", e);
            None
        }
    };
    let database_exists = db_path.as_deref().is_some_and(|p| p.exists());

    let available_tables = if database_exists {
        state.source.tables().await?
    } else {
        Vec::new()
    };

    Ok(Json(DebugConfigResponse {
        table_name: settings.table_name.clone(),
        db_path,
        database_exists,
        available_tables,
        enable_debug_endpoint: settings.enable_debug_endpoint,
    }))
}

/// Build debug routes
pub fn debug_routes() -> Router<AppState> {
    Router::new().route("/debug/config", get(get_debug_config))
}
