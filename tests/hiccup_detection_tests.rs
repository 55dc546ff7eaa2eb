// Hiccup detection through the public API
//
// Covers the strategy dispatcher, the injected dataset range query, and the
// configuration fallback path.

use std::collections::HashMap;

use hipo::config::{DetectionConfig, KEY_MOVING_AVERAGE_WINDOW_SIZE, KEY_STRATEGY};
use hipo::dataset::InMemoryDataset;
use hipo::detection::{
    detect_hiccups, detect_hiccups_for_key, detect_hiccups_with_store, DetectionError, Strategy,
};
use hipo::series::Series;

fn degraded_series() -> Series {
    let mut pairs: Vec<(i64, f64)> = (0..44).map(|i| (i * 1000, 100.0)).collect();
    for p in pairs.iter_mut().skip(11).take(8) {
        p.1 = 700.0;
    }
    Series::from_pairs(pairs)
}

#[test]
fn test_strategy_selected_from_property_store() {
    let mut props = HashMap::new();
    props.insert(KEY_STRATEGY.to_string(), "bucketed_top_n".to_string());
    props.insert(KEY_MOVING_AVERAGE_WINDOW_SIZE.to_string(), "11".to_string());

    let config = DetectionConfig::from_properties(&props);
    let key = props.get(KEY_STRATEGY).unwrap();
    let report = detect_hiccups_for_key(&degraded_series(), &config, key).unwrap();

    assert_eq!(report.strategy, Strategy::BucketedTopN);
    assert_eq!(report.hiccups.len(), 1);
}

#[test]
fn test_unknown_strategy_key_is_an_error() {
    let err = detect_hiccups_for_key(
        &degraded_series(),
        &DetectionConfig::default(),
        "holt_winters",
    )
    .unwrap_err();
    assert!(matches!(err, DetectionError::UnknownStrategy(_)));
}

#[test]
fn test_bucket_strategy_requeries_external_store() {
    let series = degraded_series();

    // The external dataset carries extra samples inside the hiccup interval
    // that the analyzed series never saw
    let mut dataset = InMemoryDataset::new();
    for sample in series.iter() {
        dataset.push_response("op", sample.timestamp_ms, sample.value);
    }
    dataset.push_response("op", 15_500, 9000.0);

    let config = DetectionConfig::default();
    let from_series =
        detect_hiccups(&series, &config, Strategy::BucketedTopN).unwrap();
    let from_store =
        detect_hiccups_with_store(&series, &config, Strategy::BucketedTopN, &dataset).unwrap();

    assert_eq!(from_series.hiccups.len(), 1);
    assert_eq!(from_store.hiccups.len(), 1);
    // Raw statistics reflect the injected store, not the analyzed series
    assert_eq!(from_series.hiccups[0].max_raw_response_time, 700.0);
    assert_eq!(from_store.hiccups[0].max_raw_response_time, 9000.0);
    assert!(
        from_store.hiccups[0].avg_raw_response_time
            > from_series.hiccups[0].avg_raw_response_time
    );
}

#[test]
fn test_flat_series_floor_guarantee() {
    // No point can exceed v + 50 when every value equals v
    let series = Series::from_pairs((0..100).map(|i| (i * 500, 250.0)));
    let config = DetectionConfig::default();

    for strategy in [
        Strategy::MovingAverage,
        Strategy::BucketedTopN,
        Strategy::NoiseReduction,
        Strategy::NoiseAndOutlier,
    ] {
        let report = detect_hiccups(&series, &config, strategy).unwrap();
        assert!(report.hiccups.is_empty(), "strategy {} fired", strategy);
    }
}

#[test]
fn test_single_sample_series_does_not_panic() {
    let series = Series::from_pairs([(0, 100.0)]);
    let config = DetectionConfig::default();

    for strategy in [
        Strategy::MovingAverage,
        Strategy::BucketedTopN,
        Strategy::NoiseReduction,
        Strategy::NoiseAndOutlier,
    ] {
        let report = detect_hiccups(&series, &config, strategy).unwrap();
        assert!(report.hiccups.is_empty());
    }
}

#[test]
fn test_hiccup_gap_enforced_by_construction() {
    // Two separated degradations with quiet stretches longer than the
    // inter-hiccup threshold between them
    let mut pairs: Vec<(i64, f64)> = (0..90).map(|i| (i * 1000, 100.0)).collect();
    for p in pairs.iter_mut().skip(11).take(11) {
        p.1 = 700.0;
    }
    for p in pairs.iter_mut().skip(60).take(11) {
        p.1 = 700.0;
    }
    let series = Series::from_pairs(pairs);
    let config = DetectionConfig::default();
    let report = detect_hiccups(&series, &config, Strategy::MovingAverage).unwrap();

    assert!(report.hiccups.len() >= 2);
    for pair in report.hiccups.windows(2) {
        assert!(
            pair[1].start_timestamp_ms - pair[0].end_timestamp_ms
                > config.inter_hiccup_threshold_ms
        );
    }
}
