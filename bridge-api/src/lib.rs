//! bridge-api library - bridge sensor data query service
//!
//! Serves the stored stress-cycle / neutral-axis readings of the midspan
//! sensor, either raw or cleaned by the `bridge_common::processing` pipeline.

use std::sync::Arc;

use axum::{routing::get, Router};
use bridge_common::config::Settings;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cli;
pub mod db;

use db::RowSource;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Provider of raw readings
    pub source: Arc<dyn RowSource>,
    /// Settings resolved at startup
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create new application state
    pub fn new(source: Arc<dyn RowSource>, settings: Arc<Settings>) -> Self {
        Self { source, settings }
    }
}

/// Build application router
///
/// `/debug/config` is only mounted when the debug endpoint is enabled.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/bridge-data/", get(api::get_bridge_data))
        .route("/bridge-data", get(api::get_bridge_data))
        .merge(api::health_routes());

    if state.settings.enable_debug_endpoint {
        router = router.merge(api::debug_routes());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
