//! Bridge sensor data query endpoint
//!
//! `GET /bridge-data/` returns the stored readings either raw or cleaned
//! (outlier clip, resample, smooth) as three parallel arrays.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use bridge_common::processing::{self, smooth, QueryMode};
use bridge_common::{BridgeData, BridgeSeries};
use serde::Deserialize;
use tracing::{debug, info};

use super::error::{ApiError, ApiResult};
use crate::AppState;

/// Query parameters for bridge data
#[derive(Debug, Deserialize)]
pub struct BridgeDataQuery {
    /// Skip all processing
    #[serde(default)]
    pub raw: bool,

    /// Resampling bucket width, e.g. `15min`
    #[serde(default = "default_freq")]
    pub freq: String,

    /// `ema` or `rolling`
    #[serde(default = "default_smooth_method")]
    pub smooth_method: String,

    /// EMA span (1..=60)
    #[serde(default = "default_span")]
    pub span: i64,
}

fn default_freq() -> String {
    "15min".to_string()
}

fn default_smooth_method() -> String {
    smooth::SmoothMethod::default().as_str().to_string()
}

fn default_span() -> i64 {
    i64::from(smooth::DEFAULT_SPAN)
}

impl Default for BridgeDataQuery {
    fn default() -> Self {
        Self {
            raw: false,
            freq: default_freq(),
            smooth_method: default_smooth_method(),
            span: default_span(),
        }
    }
}

/// GET /bridge-data/
///
/// Parameters are validated before the source is touched; any failure
/// aborts the whole request.
pub async fn get_bridge_data(
    State(state): State<AppState>,
    query: Result<Query<BridgeDataQuery>, QueryRejection>,
) -> ApiResult<Json<BridgeData>> {
    let Query(params) = query?;
    let mode = QueryMode::from_query(params.raw, &params.freq, &params.smooth_method, params.span)?;
    debug!("Bridge data request: {:?}", mode);

    let readings = state.source.fetch_readings().await?;
    let fetched = readings.len();

    // Pipeline is CPU-bound; keep it off the async workers
    let data = tokio::task::spawn_blocking(move || {
        processing::query(BridgeSeries::from_readings(readings), &mode)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Processing task failed: {}", e)))?;

    info!(
        "Served bridge data: {} rows fetched, {} returned (raw={})",
        fetched,
        data.len(),
        params.raw
    );

    Ok(Json(data))
}
