//! Post-resample smoothing

use std::fmt;
use std::str::FromStr;


use super::stats::{centered_bounds, median_in_place};
use crate::series::{BridgeSeries, Channel};
use crate::{Error, Result};

/// Largest accepted EMA span
pub const MAX_SPAN: u32 = 60;

/// Span used by the query endpoint when none is given
pub const DEFAULT_SPAN: u32 = 5;

/// Window of the rolling-median smoother (independent of span)
pub const ROLLING_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SmoothMethod {
    /// Exponential moving average, unadjusted recurrence
    #[default]
    Ema,
    /// Centered rolling median over [`ROLLING_WINDOW`] samples
    Rolling,
}

impl SmoothMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmoothMethod::Ema => "ema",
            SmoothMethod::Rolling => "rolling",
        }
    }
}

impl FromStr for SmoothMethod {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "ema" => Ok(SmoothMethod::Ema),
            "rolling" => Ok(SmoothMethod::Rolling),
            _ => Err(Error::InvalidSmoothMethod(raw.to_string())),
        }
    }
}

impl fmt::Display for SmoothMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// EMA span, always within `1..=MAX_SPAN`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span(u32);

impl Span {
    pub fn new(value: i64) -> Result<Self> {
        match u32::try_from(value) {
            Ok(span) if (1..=MAX_SPAN).contains(&span) => Ok(Self(span)),
            _ => Err(Error::InvalidSpan {
                value,
                max: MAX_SPAN,
            }),
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Weight of the newest sample, `2 / (span + 1)`
    pub fn alpha(&self) -> f64 {
        2.0 / (f64::from(self.0) + 1.0)
    }
}

impl Default for Span {
    fn default() -> Self {
        Self(DEFAULT_SPAN)
    }
}

/// Smoothing stage configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Smoother {
    pub method: SmoothMethod,
    pub span: Span,
}

impl Smoother {
    pub fn new(method: SmoothMethod, span: Span) -> Self {
        Self { method, span }
    }

    /// Smooth one channel
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        match self.method {
            SmoothMethod::Ema => ema(values, self.span),
            SmoothMethod::Rolling => rolling_median(values, ROLLING_WINDOW),
        }
    }

    /// Smooth every channel, then drop samples left with no defined value
    pub fn smooth(&self, series: &BridgeSeries) -> BridgeSeries {
        let smoothed = series.map_channels(|_, values| self.apply(values));
        let defined: Vec<bool> = (0..smoothed.len())
            .map(|i| {
                Channel::ALL
                    .iter()
                    .any(|&channel| smoothed.channel(channel)[i].is_finite())
            })
            .collect();
        smoothed.retain_samples(|i| defined[i])
    }
}

/// Exponential moving average: `y0 = x0`, `yi = α·xi + (1-α)·y(i-1)`
pub fn ema(values: &[f64], span: Span) -> Vec<f64> {
    let alpha = span.alpha();
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &x in values {
        let y = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(y);
        prev = Some(y);
    }

    out
}

/// Centered rolling median; the window shrinks at the ends (minimum 1)
pub fn rolling_median(values: &[f64], window: usize) -> Vec<f64> {
    let mut scratch = Vec::with_capacity(window);

    (0..values.len())
        .map(|i| {
            let (start, end) = centered_bounds(i, window, values.len());
            scratch.clear();
            scratch.extend_from_slice(&values[start..end]);
            median_in_place(&mut scratch).unwrap_or(values[i])
        })
        .collect()
}
