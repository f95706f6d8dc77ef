//! End-to-end tests of the data-cleaning pipeline through the public API
//!
//! Covers:
//! - Raw passthrough ignores processing parameters
//! - Length preservation of the outlier stage
//! - Resample bucket bounds and day alignment
//! - Smoother axis preservation and EMA recurrence
//! - Empty-source and invalid-frequency scenarios

use bridge_common::processing::{self, outlier::HampelFilter, smooth, PipelineParams, QueryMode};
use bridge_common::{BridgeSeries, Channel, Error, Frequency, Reading};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
}

/// Noisy sinusoid-ish sensor series with a few spikes, one sample every 20s
fn sensor_series(n: i64) -> BridgeSeries {
    BridgeSeries::from_readings((0..n).map(|i| {
        let base = 100.0 + (i % 30) as f64;
        let stress = if i % 97 == 13 { base * 50.0 } else { base };
        let pos = 0.5 + (i % 7) as f64 * 0.01;
        Reading::new(t0() + TimeDelta::seconds(20 * i), stress, pos)
    }))
}

#[test]
fn test_raw_passthrough_ignores_parameters() {
    let series = sensor_series(50);
    let expected: Vec<f64> = series.channel(Channel::StressCycle).to_vec();

    for (freq, method, span) in [("15min", "ema", 5), ("bogus", "nope", 0), ("1h", "rolling", 60)] {
        let mode = QueryMode::from_query(true, freq, method, span).unwrap();
        let data = processing::query(series.clone(), &mode);
        assert_eq!(data.stress_cycle, expected);
        assert_eq!(data.len(), 50);
        assert_eq!(data.time[0], "2024-03-10T00:00:00+00:00");
        assert_eq!(data.time[1], "2024-03-10T00:00:20+00:00");
    }
}

#[test]
fn test_outlier_stage_preserves_length() {
    let filter = HampelFilter::default();
    for n in [0, 1, 2, 6, 7, 8, 250] {
        let series = sensor_series(n);
        let filtered = filter.filter(&series);
        assert_eq!(filtered.len(), series.len());
        assert_eq!(filtered.timestamps(), series.timestamps());
    }
}

#[test]
fn test_spikes_do_not_survive_processing() {
    let series = sensor_series(2000);
    let mode = QueryMode::from_query(false, "15min", "rolling", 5).unwrap();
    let data = processing::query(series, &mode);

    assert!(!data.is_empty());
    assert!(data.stress_cycle.iter().all(|v| *v < 200.0), "spike leaked: {:?}", data.stress_cycle);
    assert_eq!(data.time.len(), data.stress_cycle.len());
    assert_eq!(data.time.len(), data.pos_na.len());
}

#[test]
fn test_resample_count_bounded_and_aligned() {
    let series = sensor_series(1000);
    let freq: Frequency = "15 minutes".parse().unwrap();
    let out = processing::resample(&series, freq);

    let span = *series.timestamps().last().unwrap() - series.timestamps()[0];
    let bound = span.num_seconds() / 900 + 2;
    assert!((out.len() as i64) <= bound);

    for ts in out.timestamps() {
        assert_eq!((*ts - t0()).num_seconds() % 900, 0, "{ts} is not on a 15 minute boundary");
    }
}

#[test]
fn test_smoother_keeps_resampled_axis() {
    let series = sensor_series(600);
    let resampled = processing::resample(&series, "30min".parse().unwrap());

    for method in ["ema", "rolling"] {
        let params = PipelineParams::from_query("30min", method, 5).unwrap();
        let smoothed = params.smoother.smooth(&resampled);
        assert_eq!(smoothed.timestamps(), resampled.timestamps());
    }
}

#[test]
fn test_ema_recurrence_over_three_samples() {
    let span = smooth::Span::new(4).unwrap();
    let alpha = 2.0 / 5.0;
    let out = smooth::ema(&[1.0, 2.0, 3.0], span);

    let y1 = alpha * 2.0 + (1.0 - alpha) * 1.0;
    let y2 = alpha * 3.0 + (1.0 - alpha) * y1;
    assert_eq!(out.len(), 3);
    assert_eq!(out[0], 1.0);
    assert!((out[1] - y1).abs() < 1e-12);
    assert!((out[2] - y2).abs() < 1e-12);
}

#[test]
fn test_empty_source_scenario() {
    let mode = QueryMode::from_query(false, "15min", "ema", 5).unwrap();
    let data = processing::query(BridgeSeries::default(), &mode);
    let json = serde_json::to_value(&data).unwrap();
    assert_eq!(json, serde_json::json!({"_time": [], "stress_cycle": [], "pos_na": []}));
}

#[test]
fn test_single_extreme_outlier_scenario() {
    let values = [10.0, 12.0, 14.0, 1000.0, 16.0, 18.0];
    let out = HampelFilter::new(7, 3.0).unwrap().apply(&values);
    assert_eq!(out.len(), 6);
    assert!(out[3].is_finite());
    assert!(out[3] < 1000.0 && out[3] > 15.0);
}

#[test]
fn test_invalid_freq_scenario() {
    let err = QueryMode::from_query(false, "bogus", "ema", 5).unwrap_err();
    assert!(matches!(err, Error::InvalidFrequency(ref v) if v == "bogus"));
    assert!(err.is_validation());
}

#[test]
fn test_bucket_alignment_scenario() {
    let series = BridgeSeries::from_readings(vec![
        Reading::new(t0() + TimeDelta::seconds(7 * 60), 4.0, 0.4),
        Reading::new(t0() + TimeDelta::seconds(7 * 60 + 30), 6.0, 0.6),
    ]);
    let out = processing::resample(&series, "15min".parse().unwrap());
    assert_eq!(out.timestamps(), &[t0()]);
    assert_eq!(out.channel(Channel::StressCycle), &[5.0]);
    assert!((out.channel(Channel::PosNa)[0] - 0.5).abs() < 1e-12);
}

#[test]
fn test_processed_query_with_readings_near_f64_limits() {
    let series = BridgeSeries::from_readings(vec![
        Reading::new(t0() + TimeDelta::minutes(1), 1.7e308, 0.5),
        Reading::new(t0() + TimeDelta::minutes(2), 1.7e308, 0.5),
    ]);
    let mode = QueryMode::from_query(false, "15min", "ema", 5).unwrap();
    let data = processing::query(series, &mode);

    assert_eq!(data.stress_cycle, vec![1.7e308]);
    let json = serde_json::to_value(&data).unwrap();
    assert!(json["stress_cycle"][0].is_f64(), "non-finite value serialized as {}", json["stress_cycle"][0]);
}
