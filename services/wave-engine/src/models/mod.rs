//! Swappable supervised models used by the forecast engine
//!
//! Every model implements [`Estimator`]: fit on feature vectors and targets,
//! then predict a target for a single feature vector. The forecast engine is
//! generic over one classifier (`Target = WaveLabel`) and one regressor
//! (`Target = f64`).

use crate::types::{FeatureVector, Result, WaveEngineError};

pub mod decision_tree;
pub mod random_forest;

pub use decision_tree::{DecisionTree, SplitCriterion, TreeConfig};
pub use random_forest::{ForestConfig, RandomForest, RandomForestClassifier, RandomForestRegressor};

/// Core model trait - fit once, predict many
pub trait Estimator: Send {
    type Target: Send;

    /// Model name (for logs and reports)
    fn name(&self) -> &str;

    /// Fit on index-aligned features and targets
    fn fit(&mut self, features: &[FeatureVector], targets: &[Self::Target]) -> Result<()>;

    /// Predict the target for one feature vector
    fn predict(&self, features: &FeatureVector) -> Result<Self::Target>;
}

/// Shared input checks for `Estimator::fit`
pub(crate) fn check_fit_input<T>(features: &[FeatureVector], targets: &[T]) -> Result<()> {
    if features.len() != targets.len() {
        return Err(WaveEngineError::TargetLengthMismatch {
            features: features.len(),
            targets: targets.len(),
        });
    }
    if features.is_empty() {
        return Err(WaveEngineError::InsufficientTrainingData {
            found: 0,
            required: 1,
        });
    }
    check_widths(features, features[0].len())
}

/// Every vector must carry exactly `expected` values
pub(crate) fn check_widths(features: &[FeatureVector], expected: usize) -> Result<()> {
    match features.iter().position(|f| f.len() != expected) {
        Some(index) => Err(WaveEngineError::FeatureWidthMismatch {
            index,
            expected,
            found: features[index].len(),
        }),
        None => Ok(()),
    }
}
