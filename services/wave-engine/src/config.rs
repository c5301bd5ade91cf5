//! Analysis configuration

use crate::models::ForestConfig;
use crate::pivots::validate_threshold;
use crate::types::Result;
use serde::{Deserialize, Serialize};

/// Settings for one analysis run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Zigzag reversal threshold as a fraction (0.035 = 3.5%)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Bars between the last pivot and the end of the forecast line
    #[serde(default = "default_projection_horizon")]
    pub projection_horizon: usize,
    /// Shared by the classifier and the regressor
    #[serde(default)]
    pub forest: ForestConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            projection_horizon: default_projection_horizon(),
            forest: ForestConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Threshold given in percent, as entered by users (3.5 = 3.5%)
    pub fn with_threshold_pct(self, threshold_pct: f64) -> Self {
        self.with_threshold(threshold_pct / 100.0)
    }

    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)
    }
}

fn default_threshold() -> f64 { 0.035 }
fn default_projection_horizon() -> usize { 5 }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WaveEngineError;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.threshold, 0.035);
        assert_eq!(config.projection_horizon, 5);
        assert_eq!(config.forest.n_trees, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_percent_threshold() {
        let config = AnalysisConfig::default().with_threshold_pct(5.0);
        assert!((config.threshold - 0.05).abs() < 1e-12);

        let bad = AnalysisConfig::default().with_threshold_pct(150.0);
        assert_eq!(bad.validate(), Err(WaveEngineError::InvalidThreshold(1.5)));
    }

    #[test]
    fn test_partial_json() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"threshold": 0.02, "forest": {"seed": 7}}"#).unwrap();
        assert_eq!(config.threshold, 0.02);
        assert_eq!(config.projection_horizon, 5);
        assert_eq!(config.forest.seed, 7);
        assert_eq!(config.forest.n_trees, 100);
    }
}
