//! Sensor series model
//!
//! A [`BridgeSeries`] holds one timestamp axis shared by the two numeric
//! channels. Stages that work per channel (outlier clipping, smoothing) map
//! over the channel slices and leave the axis alone; the resampler rebuilds
//! the axis for both channels at once, so the channels can never drift apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::format_timestamp;

/// One row from the row source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub time: DateTime<Utc>,
    pub stress_cycle: f64,
    pub pos_na: f64,
}

impl Reading {
    pub fn new(time: DateTime<Utc>, stress_cycle: f64, pos_na: f64) -> Self {
        Self {
            time,
            stress_cycle,
            pos_na,
        }
    }
}

/// Numeric channels carried by every reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    StressCycle,
    PosNa,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::StressCycle, Channel::PosNa];
}

/// Time-indexed sensor series with a shared timestamp axis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BridgeSeries {
    timestamps: Vec<DateTime<Utc>>,
    stress_cycle: Vec<f64>,
    pos_na: Vec<f64>,
}

impl BridgeSeries {
    /// Build from columns
    ///
    /// Returns `None` when the columns differ in length.
    pub fn from_columns(
        timestamps: Vec<DateTime<Utc>>,
        stress_cycle: Vec<f64>,
        pos_na: Vec<f64>,
    ) -> Option<Self> {
        if timestamps.len() != stress_cycle.len() || timestamps.len() != pos_na.len() {
            return None;
        }
        Some(Self {
            timestamps,
            stress_cycle,
            pos_na,
        })
    }

    /// Build from row-source readings, keeping their order
    pub fn from_readings<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = Reading>,
    {
        let mut series = Self::default();
        for reading in readings {
            series.timestamps.push(reading.time);
            series.stress_cycle.push(reading.stress_cycle);
            series.pos_na.push(reading.pos_na);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::StressCycle => &self.stress_cycle,
            Channel::PosNa => &self.pos_na,
        }
    }

    /// Apply a length-preserving transform to each channel independently
    ///
    /// The timestamp axis is carried over unchanged.
    pub fn map_channels<F>(&self, mut f: F) -> Self
    where
        F: FnMut(Channel, &[f64]) -> Vec<f64>,
    {
        let stress_cycle = f(Channel::StressCycle, &self.stress_cycle);
        let pos_na = f(Channel::PosNa, &self.pos_na);
        debug_assert_eq!(stress_cycle.len(), self.len());
        debug_assert_eq!(pos_na.len(), self.len());
        Self {
            timestamps: self.timestamps.clone(),
            stress_cycle,
            pos_na,
        }
    }

    /// Keep only the samples for which `keep(index)` holds
    pub fn retain_samples<F>(self, mut keep: F) -> Self
    where
        F: FnMut(usize) -> bool,
    {
        let mut out = Self::default();
        for i in 0..self.len() {
            if keep(i) {
                out.timestamps.push(self.timestamps[i]);
                out.stress_cycle.push(self.stress_cycle[i]);
                out.pos_na.push(self.pos_na[i]);
            }
        }
        out
    }
}

/// Wire payload of the query endpoint
///
/// All three arrays have the same length and are index-aligned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BridgeData {
    #[serde(rename = "_time")]
    pub time: Vec<String>,
    pub stress_cycle: Vec<f64>,
    pub pos_na: Vec<f64>,
}

impl BridgeData {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

impl From<BridgeSeries> for BridgeData {
    fn from(series: BridgeSeries) -> Self {
        Self {
            time: series.timestamps.iter().map(format_timestamp).collect(),
            stress_cycle: series.stress_cycle,
            pos_na: series.pos_na,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, min, 0).unwrap()
    }

    #[test]
    fn test_from_readings_keeps_order_and_alignment() {
        let series = BridgeSeries::from_readings(vec![
            Reading::new(at(0), 1.0, 0.1),
            Reading::new(at(5), 2.0, 0.2),
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.timestamps(), &[at(0), at(5)]);
        assert_eq!(series.channel(Channel::StressCycle), &[1.0, 2.0]);
        assert_eq!(series.channel(Channel::PosNa), &[0.1, 0.2]);
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        assert!(BridgeSeries::from_columns(vec![at(0)], vec![1.0, 2.0], vec![0.1]).is_none());
        assert!(BridgeSeries::from_columns(vec![at(0)], vec![1.0], vec![0.1]).is_some());
    }

    #[test]
    fn test_map_channels_keeps_axis() {
        let series = BridgeSeries::from_readings(vec![
            Reading::new(at(0), 1.0, 10.0),
            Reading::new(at(1), 2.0, 20.0),
        ]);
        let doubled = series.map_channels(|_, values| values.iter().map(|v| v * 2.0).collect());
        assert_eq!(doubled.timestamps(), series.timestamps());
        assert_eq!(doubled.channel(Channel::StressCycle), &[2.0, 4.0]);
        assert_eq!(doubled.channel(Channel::PosNa), &[20.0, 40.0]);
    }

    #[test]
    fn test_retain_samples() {
        let series = BridgeSeries::from_readings((0..4).map(|i| Reading::new(at(i), i as f64, 0.0)));
        let odd = series.retain_samples(|i| i % 2 == 1);
        assert_eq!(odd.timestamps(), &[at(1), at(3)]);
        assert_eq!(odd.channel(Channel::StressCycle), &[1.0, 3.0]);
    }

    #[test]
    fn test_payload_serializes_with_time_key() {
        let series = BridgeSeries::from_readings(vec![Reading::new(at(15), 100.0, 0.5)]);
        let json = serde_json::to_value(BridgeData::from(series)).unwrap();
        assert_eq!(json["_time"][0], "2023-01-01T00:15:00+00:00");
        assert_eq!(json["stress_cycle"][0], 100.0);
        assert_eq!(json["pos_na"][0], 0.5);
    }

    #[test]
    fn test_empty_payload() {
        let json = serde_json::to_string(&BridgeData::from(BridgeSeries::default())).unwrap();
        assert_eq!(json, r#"{"_time":[],"stress_cycle":[],"pos_na":[]}"#);
    }
}
