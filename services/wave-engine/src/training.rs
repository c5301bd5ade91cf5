//! Supervised-learning dataset construction
//!
//! Each example is four consecutive waves flattened into a feature vector,
//! paired with the label and change of the wave that follows them.

use crate::types::{FeatureVector, TrainingSet, Wave, WaveLabel, WINDOW_WAVES};
use tracing::debug;

/// Positional labels for a wave sequence: `Wave_1`..`Wave_5`, then `Unknown`.
///
/// This tags waves by where they sit in the history, not by structure; a wave
/// counted from a different starting bar gets a different label.
pub fn assign_labels(waves: &[Wave]) -> Vec<WaveLabel> {
    (0..waves.len()).map(WaveLabel::for_position).collect()
}

/// Build index-aligned features and targets from `waves`.
///
/// Windows start at `0..len - 5`, so the newest wave is never a target and
/// six waves are needed for a single example. An empty set is returned when
/// there is not enough history; the forecast stage reports that as
/// insufficient training data.
pub fn build_training_set(waves: &[Wave]) -> TrainingSet {
    let labels = assign_labels(waves);
    let windows = waves.len().saturating_sub(WINDOW_WAVES);

    let mut set = TrainingSet {
        features: Vec::with_capacity(windows),
        class_targets: Vec::with_capacity(windows),
        regression_targets: Vec::with_capacity(windows),
    };

    for i in 0..windows {
        let target = i + WINDOW_WAVES - 1;
        set.features.push(FeatureVector::from_waves(&waves[i..target]));
        set.class_targets.push(labels[target]);
        set.regression_targets.push(waves[target].change);
    }

    debug!(waves = waves.len(), examples = set.len(), "training set built");
    set
}
