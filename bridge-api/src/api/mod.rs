//! HTTP API handlers for bridge-api

pub mod bridge_data;
pub mod debug;
pub mod error;
pub mod health;

pub use bridge_data::get_bridge_data;
pub use debug::debug_routes;
pub use error::{ApiError, ApiResult};
pub use health::health_routes;
