//! End-to-end runs over seeded random walks

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wave_engine::{
    build_training_set, detect_pivots, detect_triangles, extract_waves, AnalysisConfig,
    ForecastHistory, ForecastOutcome, ForestConfig, HistoryEntry, PivotKind, WaveAnalyzer,
    WaveEngineError, WaveLabel, FEATURE_WIDTH,
};

fn random_walk(seed: u64, len: usize) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut price = 50.0;
    (0..len)
        .map(|_| {
            price *= 1.0 + rng.gen_range(-0.04..0.04);
            price
        })
        .collect()
}

fn analyzer(threshold: f64) -> WaveAnalyzer {
    WaveAnalyzer::new(AnalysisConfig {
        forest: ForestConfig {
            n_trees: 15,
            ..Default::default()
        },
        ..Default::default()
    }
    .with_threshold(threshold))
}

#[test]
fn test_stage_outputs_are_consistent() {
    for seed in 0..10 {
        let prices = random_walk(seed, 300);
        let pivots = detect_pivots(&prices, 0.05).unwrap();
        let waves = extract_waves(&prices, &pivots).unwrap();

        assert_eq!(waves.len(), pivots.len() - 1);
        let total: usize = waves.iter().map(|w| w.duration).sum();
        assert_eq!(total, prices.len() - 1);

        let set = build_training_set(&waves);
        assert!(set.is_aligned());
        assert_eq!(set.len(), waves.len().saturating_sub(5));
        assert!(set.features.iter().all(|f| f.len() == FEATURE_WIDTH));

        // Triangle anchors are always interior pivots opening on a high
        if let Ok(triangles) = detect_triangles(&pivots) {
            for t in triangles {
                let pos = pivots.iter().position(|p| p.index == t.pivot_index).unwrap();
                assert!(pos >= 2 && pos + 2 < pivots.len());
                assert_eq!(pivots[pos - 2].kind, PivotKind::High);
            }
        }
    }
}

#[test]
fn test_long_walk_forecast_is_reproducible() {
    let prices = random_walk(3, 400);
    let first = analyzer(0.03).analyze(&prices).unwrap();
    let second = analyzer(0.03).analyze(&prices).unwrap();

    assert_eq!(first, second);
    let result = first.forecast.result().expect("long walk should train");
    assert!(result.training_examples >= 2);
    assert!(WaveLabel::ALL.contains(&result.predicted_label));
    assert!(result.predicted_change.is_finite());
}

#[test]
fn test_history_collects_ready_runs() {
    let mut history = ForecastHistory::new();
    for (seed, ticker) in [(1, "AAA"), (2, "BBB")] {
        let report = analyzer(0.03).analyze(&random_walk(seed, 400)).unwrap();
        if let ForecastOutcome::Ready(result) = &report.forecast {
            history.append(HistoryEntry::from_forecast(ticker, result, chrono::Utc::now()));
        }
    }
    assert_eq!(history.len(), 2);
    assert_eq!(history.entries()[0].ticker, "AAA");
}

#[test]
fn test_zero_price_aborts_run() {
    let err = analyzer(0.1).analyze(&[0.0, 5.0, 1.0]).unwrap_err();
    assert!(matches!(err, WaveEngineError::DegenerateWave { start_index: 0 }));
}
