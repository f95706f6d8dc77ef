//! Data-cleaning pipeline
//!
//! Raw readings go through three stages, always in this order:
//!
//! 1. [`outlier::HampelFilter`]: windowed clipping per channel (length kept)
//! 2. [`resample::resample`]: day-aligned median buckets (empty ones dropped)
//! 3. [`smooth::Smoother`]: EMA or rolling median per channel (axis kept)
//!
//! Every stage takes a series by reference and returns a new one. A raw
//! query skips all three.

pub mod outlier;
pub mod resample;
pub mod smooth;
pub mod stats;

use tracing::debug;

use crate::frequency::Frequency;
use crate::series::{BridgeData, BridgeSeries};
use crate::Result;

pub use outlier::HampelFilter;
pub use resample::resample;
pub use smooth::{SmoothMethod, Smoother, Span};

/// Validated parameters of the processing stages
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineParams {
    pub outlier: HampelFilter,
    pub freq: Frequency,
    pub smoother: Smoother,
}

impl PipelineParams {
    /// Validate user-supplied query parameters
    ///
    /// Fails on the first invalid value; nothing is computed before this
    /// succeeds. The outlier stage always uses the fixed default window.
    pub fn from_query(freq: &str, smooth_method: &str, span: i64) -> Result<Self> {
        let freq: Frequency = freq.parse()?;
        let method: SmoothMethod = smooth_method.parse()?;
        let span = Span::new(span)?;

        Ok(Self {
            outlier: HampelFilter::default(),
            freq,
            smoother: Smoother::new(method, span),
        })
    }
}

/// What a query asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryMode {
    /// Rows exactly as the source returned them
    Raw,
    /// Filter, resample and smooth
    Processed(PipelineParams),
}

impl QueryMode {
    /// Build from endpoint parameters
    ///
    /// Raw queries ignore the processing parameters entirely, so an invalid
    /// `freq` alongside `raw=true` is not an error.
    pub fn from_query(raw: bool, freq: &str, smooth_method: &str, span: i64) -> Result<Self> {
        if raw {
            return Ok(QueryMode::Raw);
        }
        PipelineParams::from_query(freq, smooth_method, span).map(QueryMode::Processed)
    }
}

/// Run the three processing stages
pub fn process(series: &BridgeSeries, params: &PipelineParams) -> BridgeSeries {
    let filtered = params.outlier.filter(series);
    let resampled = resample(&filtered, params.freq);
    let smoothed = params.smoother.smooth(&resampled);

    debug!(
        "Processed {} samples -> {} buckets (window={}, nsigma={}, freq={}, method={}, span={})",
        series.len(),
        smoothed.len(),
        params.outlier.window(),
        params.outlier.nsigma(),
        params.freq,
        params.smoother.method,
        params.smoother.span.get()
    );

    smoothed
}

/// Answer a query over an already-fetched series
pub fn query(series: BridgeSeries, mode: &QueryMode) -> BridgeData {
    if series.is_empty() {
        return BridgeData::default();
    }

    match mode {
        QueryMode::Raw => BridgeData::from(series),
        QueryMode::Processed(params) => BridgeData::from(process(&series, params)),
    }
}
