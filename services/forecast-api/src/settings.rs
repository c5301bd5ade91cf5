//! Service settings, read from `WAVE_*` environment variables

use config::{Config, Environment};
use data_retrieval::YahooFinanceClient;
use serde::Deserialize;
use wave_engine::{AnalysisConfig, ForestConfig};

/// Accepted range for user-supplied thresholds, in percent
pub const MIN_THRESHOLD_PCT: f64 = 1.0;
pub const MAX_THRESHOLD_PCT: f64 = 10.0;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("default_threshold_pct must be within 1.0..=10.0, got {0}")]
    ThresholdOutOfRange(f64),

    #[error("forest_trees must be at least 1")]
    NoTrees,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,
    /// Threshold used when a request does not carry one
    #[serde(default = "default_threshold_pct")]
    pub default_threshold_pct: f64,
    #[serde(default = "default_forest_seed")]
    pub forest_seed: u64,
    #[serde(default = "default_forest_trees")]
    pub forest_trees: usize,
}

fn default_port() -> u16 { 3000 }
fn default_yahoo_base_url() -> String { YahooFinanceClient::DEFAULT_BASE_URL.to_string() }
fn default_threshold_pct() -> f64 { 3.5 }
fn default_forest_seed() -> u64 { 42 }
fn default_forest_trees() -> usize { 100 }

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: default_port(),
            yahoo_base_url: default_yahoo_base_url(),
            default_threshold_pct: default_threshold_pct(),
            forest_seed: default_forest_seed(),
            forest_trees: default_forest_trees(),
        }
    }
}

impl Settings {
    /// Load from the process environment (`WAVE_PORT`, `WAVE_FOREST_SEED`, ...)
    pub fn load() -> Result<Self, SettingsError> {
        Self::from_environment(Environment::with_prefix("WAVE"))
    }

    pub fn from_environment(env: Environment) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(MIN_THRESHOLD_PCT..=MAX_THRESHOLD_PCT).contains(&self.default_threshold_pct) {
            return Err(SettingsError::ThresholdOutOfRange(self.default_threshold_pct));
        }
        if self.forest_trees == 0 {
            return Err(SettingsError::NoTrees);
        }
        Ok(())
    }

    /// Analysis configuration for a run at `threshold_pct`
    pub fn analysis_config(&self, threshold_pct: f64) -> AnalysisConfig {
        AnalysisConfig {
            forest: ForestConfig {
                n_trees: self.forest_trees,
                seed: self.forest_seed,
                ..Default::default()
            },
            ..Default::default()
        }
        .with_threshold_pct(threshold_pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let vars: Map<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("WAVE").source(Some(vars))
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_environment(env(&[])).unwrap();
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.yahoo_base_url, "https://query1.finance.yahoo.com");
        assert_eq!(settings.default_threshold_pct, 3.5);
        assert_eq!(settings.forest_trees, 100);
    }

    #[test]
    fn test_reads_prefixed_variables() {
        let settings = Settings::from_environment(env(&[
            ("WAVE_PORT", "8080"),
            ("WAVE_YAHOO_BASE_URL", "http://localhost:9000"),
            ("WAVE_DEFAULT_THRESHOLD_PCT", "5.0"),
            ("WAVE_FOREST_SEED", "7"),
            ("WAVE_FOREST_TREES", "25"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 8080);
        assert_eq!(settings.yahoo_base_url, "http://localhost:9000");
        assert_eq!(settings.default_threshold_pct, 5.0);

        let config = settings.analysis_config(2.0);
        assert!((config.threshold - 0.02).abs() < 1e-12);
        assert_eq!(config.forest.seed, 7);
        assert_eq!(config.forest.n_trees, 25);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let err = Settings::from_environment(env(&[("WAVE_DEFAULT_THRESHOLD_PCT", "12")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::ThresholdOutOfRange(_)));
    }

    #[test]
    fn test_rejects_empty_forest() {
        let settings = Settings {
            forest_trees: 0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::NoTrees)));
    }
}
