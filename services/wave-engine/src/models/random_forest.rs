//! Random forest classifier and regressor

use super::decision_tree::{majority_class, DecisionTree, SplitCriterion, TreeConfig};
use super::{check_fit_input, Estimator};
use crate::types::{FeatureVector, Result, WaveEngineError, WaveLabel};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    /// Maximum depth of each tree (None = grow until pure)
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Features per split; sqrt(n) for classification and n for regression if None
    #[serde(default)]
    pub max_features: Option<usize>,
    #[serde(default = "default_bootstrap")]
    pub bootstrap: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: None,
            bootstrap: default_bootstrap(),
            seed: default_seed(),
        }
    }
}

fn default_n_trees() -> usize { 100 }
fn default_min_samples_split() -> usize { 2 }
fn default_min_samples_leaf() -> usize { 1 }
fn default_bootstrap() -> bool { true }
fn default_seed() -> u64 { 42 }

/// Bagged ensemble of decision trees sharing one split criterion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    criterion: SplitCriterion,
    trees: Vec<DecisionTree>,
    /// Width of the vectors seen by `fit`
    #[serde(default)]
    n_features: usize,
}

impl RandomForest {
    pub fn new(config: ForestConfig, criterion: SplitCriterion) -> Self {
        Self {
            config,
            criterion,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Grow every tree in parallel; tree `i` is seeded with `seed + i`
    pub fn fit(&mut self, features: &[FeatureVector], targets: &[f64]) {
        let n_samples = features.len();
        let n_features = features.first().map(FeatureVector::len).unwrap_or(0);

        let max_features = self.config.max_features.unwrap_or(match self.criterion {
            SplitCriterion::Gini { .. } => (n_features as f64).sqrt().ceil() as usize,
            SplitCriterion::Mse => n_features,
        });

        let config = &self.config;
        let criterion = self.criterion;

        self.trees = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed.wrapping_add(i as u64);
                let mut tree = DecisionTree::new(TreeConfig {
                    max_depth: config.max_depth,
                    min_samples_split: config.min_samples_split,
                    min_samples_leaf: config.min_samples_leaf,
                    max_features: Some(max_features),
                    seed,
                    criterion,
                });

                let rows = if config.bootstrap {
                    bootstrap_rows(n_samples, seed)
                } else {
                    (0..n_samples).collect()
                };
                tree.fit_rows(features, targets, &rows);
                tree
            })
            .collect();
        self.n_features = n_features;

        debug!(
            trees = self.trees.len(),
            samples = n_samples,
            features = n_features,
            "random forest fitted"
        );
    }

    /// Raw per-tree predictions for one sample; empty until fitted
    pub fn tree_predictions(&self, features: &[f64]) -> Result<Vec<f64>> {
        if self.is_fitted() && features.len() != self.n_features {
            return Err(WaveEngineError::FeatureWidthMismatch {
                index: 0,
                expected: self.n_features,
                found: features.len(),
            });
        }
        Ok(self
            .trees
            .iter()
            .filter_map(|tree| tree.predict_one(features))
            .collect())
    }
}

/// Sample `n` row indices with replacement
fn bootstrap_rows(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// Random forest over wave labels; predicts by majority vote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    forest: RandomForest,
}

impl RandomForestClassifier {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            forest: RandomForest::new(
                config,
                SplitCriterion::Gini {
                    n_classes: WaveLabel::ALL.len(),
                },
            ),
        }
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl Estimator for RandomForestClassifier {
    type Target = WaveLabel;

    fn name(&self) -> &str {
        "RandomForestClassifier"
    }

    fn fit(&mut self, features: &[FeatureVector], targets: &[WaveLabel]) -> Result<()> {
        check_fit_input(features, targets)?;
        let classes: Vec<f64> = targets.iter().map(|l| l.class_index() as f64).collect();
        self.forest.fit(features, &classes);
        Ok(())
    }

    fn predict(&self, features: &FeatureVector) -> Result<WaveLabel> {
        let votes = self.forest.tree_predictions(features.values())?;
        if votes.is_empty() {
            return Err(WaveEngineError::ModelNotFitted(self.name().to_string()));
        }
        let class = majority_class(&votes, WaveLabel::ALL.len());
        WaveLabel::from_class_index(class)
            .ok_or_else(|| WaveEngineError::ModelNotFitted(self.name().to_string()))
    }
}

/// Random forest over wave changes; predicts the mean of its trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    forest: RandomForest,
}

impl RandomForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            forest: RandomForest::new(config, SplitCriterion::Mse),
        }
    }
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl Estimator for RandomForestRegressor {
    type Target = f64;

    fn name(&self) -> &str {
        "RandomForestRegressor"
    }

    fn fit(&mut self, features: &[FeatureVector], targets: &[f64]) -> Result<()> {
        check_fit_input(features, targets)?;
        self.forest.fit(features, targets);
        Ok(())
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let predictions = self.forest.tree_predictions(features.values())?;
        if predictions.is_empty() {
            return Err(WaveEngineError::ModelNotFitted(self.name().to_string()));
        }
        Ok(predictions.iter().sum::<f64>() / predictions.len() as f64)
    }
}
