//! Forecast engine - fits a label classifier and a change regressor on the
//! training set and predicts the outcome for its most recent window

use crate::models::{check_widths, Estimator, ForestConfig, RandomForestClassifier, RandomForestRegressor};
use crate::types::{
    FeatureVector, ForecastResult, Result, TrainingSet, WaveEngineError, WaveLabel, FEATURE_WIDTH,
};
use tracing::info;

/// Minimum examples required before a fit is attempted
pub const MIN_TRAINING_EXAMPLES: usize = 2;

/// Forecast engine generic over its two model strategies
pub struct ForecastEngine<C, R>
where
    C: Estimator<Target = WaveLabel>,
    R: Estimator<Target = f64>,
{
    classifier: C,
    regressor: R,
}

impl ForecastEngine<RandomForestClassifier, RandomForestRegressor> {
    /// Random forests for both targets, sharing one configuration
    pub fn random_forest(config: ForestConfig) -> Self {
        Self::new(
            RandomForestClassifier::new(config.clone()),
            RandomForestRegressor::new(config),
        )
    }
}

impl<C, R> ForecastEngine<C, R>
where
    C: Estimator<Target = WaveLabel>,
    R: Estimator<Target = f64>,
{
    pub fn new(classifier: C, regressor: R) -> Self {
        Self {
            classifier,
            regressor,
        }
    }

    /// Fit both models on the full set and predict its last feature vector.
    ///
    /// There is no held-out split: the prediction is in-sample.
    pub fn forecast(&mut self, set: &TrainingSet) -> Result<ForecastResult> {
        if !set.is_aligned() {
            return Err(WaveEngineError::MisalignedTrainingSet {
                features: set.features.len(),
                class_targets: set.class_targets.len(),
                regression_targets: set.regression_targets.len(),
            });
        }
        if set.len() < MIN_TRAINING_EXAMPLES {
            return Err(WaveEngineError::InsufficientTrainingData {
                found: set.len(),
                required: MIN_TRAINING_EXAMPLES,
            });
        }
        check_widths(&set.features, FEATURE_WIDTH)?;

        let classifier = &mut self.classifier;
        let regressor = &mut self.regressor;
        let (class_fit, reg_fit) = rayon::join(
            || classifier.fit(&set.features, &set.class_targets),
            || regressor.fit(&set.features, &set.regression_targets),
        );
        class_fit?;
        reg_fit?;

        let latest = set.latest().ok_or(WaveEngineError::InsufficientTrainingData {
            found: 0,
            required: MIN_TRAINING_EXAMPLES,
        })?;
        let predicted_label = self.classifier.predict(latest)?;
        let predicted_change = self.regressor.predict(latest)?;

        info!(
            classifier = self.classifier.name(),
            regressor = self.regressor.name(),
            examples = set.len(),
            label = %predicted_label,
            change = predicted_change,
            "forecast ready"
        );

        Ok(ForecastResult {
            predicted_label,
            predicted_change,
            training_examples: set.len(),
        })
    }
}

/// Convenience wrapper: fit default random forests on separate vectors
pub fn forecast(
    features: &[FeatureVector],
    class_targets: &[WaveLabel],
    regression_targets: &[f64],
) -> Result<ForecastResult> {
    let set = TrainingSet {
        features: features.to_vec(),
        class_targets: class_targets.to_vec(),
        regression_targets: regression_targets.to_vec(),
    };
    ForecastEngine::random_forest(ForestConfig::default()).forecast(&set)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always answers with the target it saw last
    struct LastSeen<T> {
        last: Option<T>,
    }

    impl<T: Copy + Send> Estimator for LastSeen<T> {
        type Target = T;

        fn name(&self) -> &str {
            "LastSeen"
        }

        fn fit(&mut self, _features: &[FeatureVector], targets: &[T]) -> Result<()> {
            self.last = targets.last().copied();
            Ok(())
        }

        fn predict(&self, _features: &FeatureVector) -> Result<T> {
            self.last
                .ok_or_else(|| WaveEngineError::ModelNotFitted("LastSeen".to_string()))
        }
    }

    fn set(n: usize) -> TrainingSet {
        TrainingSet {
            features: (0..n).map(|i| FeatureVector(vec![i as f64; 20])).collect(),
            class_targets: (0..n).map(|i| WaveLabel::for_position(i + 4)).collect(),
            regression_targets: (0..n).map(|i| i as f64 / 100.0).collect(),
        }
    }

    #[test]
    fn test_swapped_strategies() {
        let mut engine = ForecastEngine::new(LastSeen { last: None }, LastSeen { last: None });
        let result = engine.forecast(&set(3)).unwrap();

        assert_eq!(result.predicted_label, WaveLabel::Unknown);
        assert_eq!(result.predicted_change, 0.02);
        assert_eq!(result.training_examples, 3);
    }

    #[test]
    fn test_requires_two_examples() {
        let mut engine = ForecastEngine::random_forest(ForestConfig::default());
        for n in 0..2 {
            assert_eq!(
                engine.forecast(&set(n)),
                Err(WaveEngineError::InsufficientTrainingData {
                    found: n,
                    required: 2
                })
            );
        }
    }

    #[test]
    fn test_rejects_misaligned_set() {
        let mut broken = set(4);
        broken.regression_targets.pop();
        let mut engine = ForecastEngine::random_forest(ForestConfig::default());
        assert!(matches!(
            engine.forecast(&broken),
            Err(WaveEngineError::MisalignedTrainingSet { .. })
        ));
    }

    #[test]
    fn test_rejects_ragged_features() {
        let mut training = set(3);
        training.features[1] = FeatureVector(vec![2.0; 3]);
        let err = forecast(
            &training.features,
            &training.class_targets,
            &training.regression_targets,
        )
        .unwrap_err();
        assert_eq!(
            err,
            WaveEngineError::FeatureWidthMismatch {
                index: 1,
                expected: FEATURE_WIDTH,
                found: 3
            }
        );

        // A short latest vector is caught before any model is fitted
        let mut training = set(3);
        training.features[2] = FeatureVector(vec![3.0; 19]);
        let mut engine = ForecastEngine::new(LastSeen { last: None }, LastSeen { last: None });
        assert!(matches!(
            engine.forecast(&training),
            Err(WaveEngineError::FeatureWidthMismatch { index: 2, found: 19, .. })
        ));
        assert!(engine.classifier.last.is_none());
    }

    #[test]
    fn test_random_forest_forecast_on_repeating_set() {
        let mut training = set(6);
        training.class_targets = vec![WaveLabel::Wave5; 6];
        training.regression_targets = vec![0.03; 6];

        let result = forecast(
            &training.features,
            &training.class_targets,
            &training.regression_targets,
        )
        .unwrap();

        assert_eq!(result.predicted_label, WaveLabel::Wave5);
        assert!((result.predicted_change - 0.03).abs() < 1e-12);
        assert!((result.predicted_change_pct() - 3.0).abs() < 1e-9);
    }
}
