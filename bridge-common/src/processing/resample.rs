//! Time-bucket resampling
//!
//! Buckets are `freq` wide and aligned to midnight (UTC) of the day holding
//! the first sample, so 15-minute buckets always start on :00/:15/:30/:45.
//! Each non-empty bucket becomes one sample stamped with the bucket's left
//! edge and holding the per-channel median. Empty buckets are not emitted.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

use super::stats::median_in_place;
use crate::frequency::Frequency;
use crate::series::{BridgeSeries, Channel};
use crate::time::day_start;

#[derive(Default)]
struct Bucket {
    stress_cycle: Vec<f64>,
    pos_na: Vec<f64>,
}

/// Resample a series into day-aligned buckets of width `freq`
pub fn resample(series: &BridgeSeries, freq: Frequency) -> BridgeSeries {
    let Some(first) = series.timestamps().first() else {
        return BridgeSeries::default();
    };
    let origin = day_start(first);
    let width = freq.as_micros();

    let stress_cycle = series.channel(Channel::StressCycle);
    let pos_na = series.channel(Channel::PosNa);

    // Keyed by bucket index so output is ascending even if ties or
    // out-of-order rows slipped through the source
    let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();
    for (i, ts) in series.timestamps().iter().enumerate() {
        let Some(offset) = ts.signed_duration_since(origin).num_microseconds() else {
            warn!("Skipping sample at {} outside resampling range", ts);
            continue;
        };
        let bucket = buckets.entry(offset.div_euclid(width)).or_default();
        bucket.stress_cycle.push(stress_cycle[i]);
        bucket.pos_na.push(pos_na[i]);
    }

    let mut timestamps = Vec::with_capacity(buckets.len());
    let mut stress_out = Vec::with_capacity(buckets.len());
    let mut pos_out = Vec::with_capacity(buckets.len());

    for (index, mut bucket) in buckets {
        let Some(start) = bucket_start(origin, index, width) else {
            warn!("Skipping bucket {} of width {}: timestamp out of range", index, freq);
            continue;
        };
        let (Some(stress), Some(pos)) = (
            median_in_place(&mut bucket.stress_cycle),
            median_in_place(&mut bucket.pos_na),
        ) else {
            continue;
        };
        timestamps.push(start);
        stress_out.push(stress);
        pos_out.push(pos);
    }

    BridgeSeries::from_columns(timestamps, stress_out, pos_out).unwrap_or_default()
}

fn bucket_start(origin: DateTime<Utc>, index: i64, width: i64) -> Option<DateTime<Utc>> {
    let offset = index.checked_mul(width)?;
    origin.checked_add_signed(TimeDelta::microseconds(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Reading;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, h, m, s).unwrap()
    }

    fn freq(raw: &str) -> Frequency {
        raw.parse().unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert!(resample(&BridgeSeries::default(), freq("15min")).is_empty());
    }

    #[test]
    fn test_bucket_alignment_to_day_start() {
        let series = BridgeSeries::from_readings(vec![
            Reading::new(at(0, 7, 0), 10.0, 1.0),
            Reading::new(at(0, 7, 30), 20.0, 3.0),
        ]);
        let out = resample(&series, freq("15min"));
        assert_eq!(out.timestamps(), &[at(0, 0, 0)]);
        assert_eq!(out.channel(Channel::StressCycle), &[15.0]);
        assert_eq!(out.channel(Channel::PosNa), &[2.0]);
    }

    #[test]
    fn test_alignment_ignores_first_sample_offset() {
        let series = BridgeSeries::from_readings(vec![
            Reading::new(at(10, 22, 13), 1.0, 1.0),
            Reading::new(at(10, 31, 0), 2.0, 2.0),
        ]);
        let out = resample(&series, freq("15min"));
        assert_eq!(out.timestamps(), &[at(10, 15, 0), at(10, 30, 0)]);
    }

    #[test]
    fn test_empty_buckets_are_dropped() {
        let series = BridgeSeries::from_readings(vec![
            Reading::new(at(0, 1, 0), 1.0, 1.0),
            Reading::new(at(2, 1, 0), 5.0, 5.0),
        ]);
        let out = resample(&series, freq("15min"));
        assert_eq!(out.timestamps(), &[at(0, 0, 0), at(2, 0, 0)]);
        assert_eq!(out.channel(Channel::StressCycle), &[1.0, 5.0]);
    }

    #[test]
    fn test_bucket_median_of_huge_values_is_finite() {
        let series = BridgeSeries::from_readings(vec![
            Reading::new(at(0, 1, 0), 1.7e308, 1.7e308),
            Reading::new(at(0, 2, 0), 1.7e308, -1.7e308),
        ]);
        let out = resample(&series, freq("15min"));
        assert_eq!(out.channel(Channel::StressCycle), &[1.7e308]);
        assert_eq!(out.channel(Channel::PosNa), &[0.0]);
    }

    #[test]
    fn test_bucket_value_is_median() {
        let series = BridgeSeries::from_readings(vec![
            Reading::new(at(1, 0, 0), 1.0, 0.0),
            Reading::new(at(1, 10, 0), 100.0, 0.0),
            Reading::new(at(1, 20, 0), 3.0, 0.0),
        ]);
        let out = resample(&series, freq("1h"));
        assert_eq!(out.timestamps(), &[at(1, 0, 0)]);
        assert_eq!(out.channel(Channel::StressCycle), &[3.0]);
    }

    #[test]
    fn test_output_is_ascending_for_unsorted_input() {
        let series = BridgeSeries::from_readings(vec![
            Reading::new(at(0, 40, 0), 4.0, 4.0),
            Reading::new(at(0, 5, 0), 1.0, 1.0),
        ]);
        let out = resample(&series, freq("15min"));
        assert_eq!(out.timestamps(), &[at(0, 0, 0), at(0, 30, 0)]);
        assert_eq!(out.channel(Channel::StressCycle), &[1.0, 4.0]);
    }

    #[test]
    fn test_output_count_bounded_by_span() {
        let start = at(0, 0, 0);
        let readings: Vec<Reading> = (0..500)
            .map(|i| Reading::new(start + TimeDelta::seconds(i * 37), i as f64, 0.0))
            .collect();
        let series = BridgeSeries::from_readings(readings);
        let width = freq("15min");
        let out = resample(&series, width);

        let span = series.timestamps()[series.len() - 1] - series.timestamps()[0];
        let bound = (span.num_microseconds().unwrap() as f64 / width.as_micros() as f64).ceil() as usize + 1;
        assert!(out.len() <= bound);
        assert!(out.len() <= series.len());
        assert!(!out.is_empty());
    }

    #[test]
    fn test_spans_midnight() {
        let series = BridgeSeries::from_readings(vec![
            Reading::new(at(23, 50, 0), 1.0, 1.0),
            Reading::new(Utc.with_ymd_and_hms(2023, 1, 2, 0, 5, 0).unwrap(), 2.0, 2.0),
        ]);
        let out = resample(&series, freq("1h"));
        assert_eq!(
            out.timestamps(),
            &[at(23, 0, 0), Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap()]
        );
    }
}
