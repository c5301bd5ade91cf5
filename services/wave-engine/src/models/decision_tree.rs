//! CART decision tree over feature vectors

use super::check_fit_input;
use crate::types::{FeatureVector, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Impurity measure used to choose splits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SplitCriterion {
    /// Classification; targets are class indices in `0..n_classes`
    Gini { n_classes: usize },
    /// Regression; targets are real values
    Mse,
}

/// Decision tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
    /// Random seed for feature sub-sampling
    pub seed: u64,
    pub criterion: SplitCriterion,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
            criterion: SplitCriterion::Mse,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

struct BestSplit {
    feature_idx: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Decision tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<TreeNode>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self { config, root: None }
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map(TreeNode::depth).unwrap_or(0)
    }

    /// Fit on every row
    pub fn fit(&mut self, features: &[FeatureVector], targets: &[f64]) -> Result<()> {
        check_fit_input(features, targets)?;
        let rows: Vec<usize> = (0..features.len()).collect();
        self.fit_rows(features, targets, &rows);
        Ok(())
    }

    /// Fit on a subset of rows. Rows may repeat (bootstrap samples).
    ///
    /// Callers check that every vector has the same width first.
    pub fn fit_rows(&mut self, features: &[FeatureVector], targets: &[f64], rows: &[usize]) {
        if rows.is_empty() {
            self.root = None;
            return;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.root = Some(self.build_tree(features, targets, rows, 0, &mut rng));
    }

    /// Predict for a single sample; None until fitted or if the sample is
    /// too short for a split it reaches
    pub fn predict_one(&self, features: &[f64]) -> Option<f64> {
        let mut node = self.root.as_ref()?;
        loop {
            match node {
                TreeNode::Leaf { value } => return Some(*value),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    let x = *features.get(*feature_idx)?;
                    node = if x <= *threshold { left } else { right };
                }
            }
        }
    }

    fn build_tree(
        &self,
        features: &[FeatureVector],
        targets: &[f64],
        rows: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let labels: Vec<f64> = rows.iter().map(|&i| targets[i]).collect();
        let impurity = self.impurity(&labels);

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || rows.len() < self.config.min_samples_split || impurity < 1e-12 {
            return self.leaf(&labels);
        }

        match self.find_best_split(features, targets, rows, impurity, rng) {
            Some(split) => {
                let left = self.build_tree(features, targets, &split.left, depth + 1, rng);
                let right = self.build_tree(features, targets, &split.right, depth + 1, rng);
                TreeNode::Split {
                    feature_idx: split.feature_idx,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            None => self.leaf(&labels),
        }
    }

    fn find_best_split(
        &self,
        features: &[FeatureVector],
        targets: &[f64],
        rows: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n_features = features[rows[0]].len();
        let max_features = self.config.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));

        let mut candidates: Vec<usize> = (0..n_features).collect();
        candidates.shuffle(rng);
        candidates.truncate(max_features);

        let mut best_gain = 0.0;
        let mut best: Option<BestSplit> = None;

        for &feature_idx in &candidates {
            let mut values: Vec<f64> = rows.iter().map(|&i| features[i].0[feature_idx]).collect();
            values.sort_by(f64::total_cmp);
            values.dedup();

            // Midpoints between distinct values
            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;

                let (left, right): (Vec<usize>, Vec<usize>) = rows
                    .iter()
                    .partition(|&&i| features[i].0[feature_idx] <= threshold);

                if left.len() < self.config.min_samples_leaf
                    || right.len() < self.config.min_samples_leaf
                {
                    continue;
                }

                let left_labels: Vec<f64> = left.iter().map(|&i| targets[i]).collect();
                let right_labels: Vec<f64> = right.iter().map(|&i| targets[i]).collect();

                let n_left = left.len() as f64;
                let n_right = right.len() as f64;
                let weighted = (n_left * self.impurity(&left_labels)
                    + n_right * self.impurity(&right_labels))
                    / (n_left + n_right);
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some(BestSplit {
                        feature_idx,
                        threshold,
                        left,
                        right,
                    });
                }
            }
        }

        best
    }

    fn leaf(&self, labels: &[f64]) -> TreeNode {
        let value = match self.config.criterion {
            SplitCriterion::Mse => mean(labels),
            SplitCriterion::Gini { n_classes } => majority_class(labels, n_classes) as f64,
        };
        TreeNode::Leaf { value }
    }

    fn impurity(&self, labels: &[f64]) -> f64 {
        match self.config.criterion {
            SplitCriterion::Mse => mse(labels),
            SplitCriterion::Gini { n_classes } => gini(labels, n_classes),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn mse(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn class_counts(labels: &[f64], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &label in labels {
        if let Some(slot) = counts.get_mut(label as usize) {
            *slot += 1;
        }
    }
    counts
}

fn gini(labels: &[f64], n_classes: usize) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let n = labels.len() as f64;
    1.0 - class_counts(labels, n_classes)
        .iter()
        .map(|&c| (c as f64 / n).powi(2))
        .sum::<f64>()
}

/// Most frequent class; ties go to the lowest index
pub(crate) fn majority_class(labels: &[f64], n_classes: usize) -> usize {
    let counts = class_counts(labels, n_classes);
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Vec<FeatureVector> {
        values.iter().map(|&v| FeatureVector(vec![v])).collect()
    }

    #[test]
    fn test_regression_step() {
        let xs: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| if x < 20.0 { 1.0 } else { 5.0 }).collect();

        let mut tree = DecisionTree::new(TreeConfig::default());
        tree.fit(&column(&xs), &ys).unwrap();

        assert!(tree.is_fitted());
        assert_eq!(tree.predict_one(&[3.0]), Some(1.0));
        assert_eq!(tree.predict_one(&[35.0]), Some(5.0));
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_classification_three_classes() {
        let xs: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| (x / 10.0).floor()).collect();

        let mut tree = DecisionTree::new(TreeConfig {
            criterion: SplitCriterion::Gini { n_classes: 3 },
            ..Default::default()
        });
        tree.fit(&column(&xs), &ys).unwrap();

        assert_eq!(tree.predict_one(&[4.0]), Some(0.0));
        assert_eq!(tree.predict_one(&[14.0]), Some(1.0));
        assert_eq!(tree.predict_one(&[27.0]), Some(2.0));
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let xs: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let ys = xs.clone();

        let mut tree = DecisionTree::new(TreeConfig {
            max_depth: Some(2),
            ..Default::default()
        });
        tree.fit(&column(&xs), &ys).unwrap();
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn test_unfitted_tree_predicts_nothing() {
        let tree = DecisionTree::new(TreeConfig::default());
        assert_eq!(tree.predict_one(&[1.0]), None);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let features = vec![
            FeatureVector(vec![1.0, 2.0]),
            FeatureVector(vec![3.0]),
            FeatureVector(vec![5.0, 6.0]),
        ];
        let mut tree = DecisionTree::new(TreeConfig::default());
        assert_eq!(
            tree.fit(&features, &[0.0, 1.0, 2.0]),
            Err(crate::types::WaveEngineError::FeatureWidthMismatch {
                index: 1,
                expected: 2,
                found: 1
            })
        );
        assert!(!tree.is_fitted());
    }

    #[test]
    fn test_short_sample_gets_no_prediction() {
        let features: Vec<FeatureVector> = (0..20)
            .map(|i| FeatureVector(vec![0.0, i as f64]))
            .collect();
        let ys: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { 5.0 }).collect();
        let mut tree = DecisionTree::new(TreeConfig::default());
        tree.fit(&features, &ys).unwrap();

        assert_eq!(tree.predict_one(&[0.0, 15.0]), Some(5.0));
        assert_eq!(tree.predict_one(&[0.0]), None);
    }

    #[test]
    fn test_majority_class_tie_breaks_low() {
        assert_eq!(majority_class(&[2.0, 1.0, 2.0, 1.0], 3), 1);
        assert_eq!(majority_class(&[], 3), 0);
    }
}
