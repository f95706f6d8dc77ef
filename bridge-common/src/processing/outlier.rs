//! Hampel outlier clipping
//!
//! Each value is clipped into `median ± nsigma · 1.4826 · MAD` of the
//! centered window around it. Values are never removed, so the output has
//! the same length and timestamp axis as the input. A flat window has
//! MAD = 0 and clips every value in it to the window median.

use super::stats::{centered_bounds, median_and_mad, MAD_SCALE};
use crate::series::BridgeSeries;
use crate::{Error, Result};

/// Window size used by the query endpoint
pub const DEFAULT_WINDOW: usize = 7;

/// Deviation multiplier used by the query endpoint
pub const DEFAULT_NSIGMA: f64 = 3.0;

/// Windowed robust clipping filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HampelFilter {
    window: usize,
    nsigma: f64,
}

impl HampelFilter {
    /// `window` must be odd and ≥ 1; `nsigma` must be finite and > 0
    pub fn new(window: usize, nsigma: f64) -> Result<Self> {
        if window == 0 || window % 2 == 0 {
            return Err(Error::InvalidWindow(format!(
                "window must be an odd number of samples, got {}",
                window
            )));
        }
        if !nsigma.is_finite() || nsigma <= 0.0 {
            return Err(Error::InvalidWindow(format!(
                "nsigma must be a positive number, got {}",
                nsigma
            )));
        }
        Ok(Self { window, nsigma })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn nsigma(&self) -> f64 {
        self.nsigma
    }

    /// Clip one channel
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        let mut scratch = Vec::with_capacity(self.window);

        values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let (start, end) = centered_bounds(i, self.window, values.len());
                match median_and_mad(&values[start..end], &mut scratch) {
                    Some((center, mad)) => {
                        let thresh = self.nsigma * MAD_SCALE * mad;
                        let (lo, hi) = (center - thresh, center + thresh);
                        // Bounds can only be NaN if a window statistic overflowed
                        if lo <= hi {
                            value.clamp(lo, hi)
                        } else {
                            value
                        }
                    }
                    None => value,
                }
            })
            .collect()
    }

    /// Clip every channel of a series independently
    pub fn filter(&self, series: &BridgeSeries) -> BridgeSeries {
        series.map_channels(|_, values| self.apply(values))
    }
}

impl Default for HampelFilter {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            nsigma: DEFAULT_NSIGMA,
        }
    }
}
