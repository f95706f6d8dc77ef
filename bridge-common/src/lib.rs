//! # Bridge Health Common Library
//!
//! Shared code for the bridge monitoring services:
//! - Sensor series model (readings, channels, serialized payload)
//! - Data-cleaning pipeline (outlier clipping, resampling, smoothing)
//! - Resampling frequency parsing
//! - Settings resolution
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod frequency;
pub mod processing;
pub mod series;
pub mod time;

pub use error::{Error, Result};
pub use frequency::Frequency;
pub use series::{BridgeData, BridgeSeries, Channel, Reading};
