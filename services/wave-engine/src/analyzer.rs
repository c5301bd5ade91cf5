//! Analysis pipeline - prices → pivots → waves → (triangles | training set) → forecast

use crate::config::AnalysisConfig;
use crate::forecast::ForecastEngine;
use crate::patterns::detect_triangles;
use crate::pivots::detect_pivots;
use crate::training::build_training_set;
use crate::types::{
    ForecastProjection, ForecastResult, Pivot, Result, TrianglePattern, Wave, WaveEngineError,
};
use crate::waves::extract_waves;
use serde::Serialize;
use tracing::{info, warn};

/// Shown instead of a forecast when the history is too short to train on
pub const INSUFFICIENT_DATA_MESSAGE: &str =
    "Not enough data to train AI. Adjust the period or interval.";

/// Forecast stage outcome. Training problems never abort a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    Ready(ForecastResult),
    Unavailable { reason: String },
}

impl ForecastOutcome {
    pub fn result(&self) -> Option<&ForecastResult> {
        match self {
            ForecastOutcome::Ready(result) => Some(result),
            ForecastOutcome::Unavailable { .. } => None,
        }
    }
}

/// Everything one run produces for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub pivots: Vec<Pivot>,
    pub waves: Vec<Wave>,
    pub triangles: Vec<TrianglePattern>,
    pub training_examples: usize,
    pub forecast: ForecastOutcome,
    pub projection: Option<ForecastProjection>,
}

impl AnalysisReport {
    /// Human-readable forecast lines
    pub fn summary(&self) -> Vec<String> {
        match &self.forecast {
            ForecastOutcome::Ready(result) => vec![
                format!("Predicted Wave Label: {}", result.predicted_label),
                format!("Predicted % Price Change: {:.2}%", result.predicted_change_pct()),
            ],
            ForecastOutcome::Unavailable { reason } => vec![reason.clone()],
        }
    }
}

/// Runs the full pipeline with one configuration
pub struct WaveAnalyzer {
    config: AnalysisConfig,
}

impl WaveAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one price series.
    ///
    /// Pivot and wave failures abort the run. Too few pivots for triangles
    /// yields an empty pattern list, and a forecast that cannot be trained is
    /// reported as [`ForecastOutcome::Unavailable`].
    pub fn analyze(&self, prices: &[f64]) -> Result<AnalysisReport> {
        self.config.validate()?;

        let pivots = detect_pivots(prices, self.config.threshold)?;
        let waves = extract_waves(prices, &pivots)?;

        let triangles = detect_triangles(&pivots).unwrap_or_else(|e| {
            warn!("Skipping triangle detection: {}", e);
            Vec::new()
        });

        let training = build_training_set(&waves);
        let mut engine = ForecastEngine::random_forest(self.config.forest.clone());
        let forecast = match engine.forecast(&training) {
            Ok(result) => ForecastOutcome::Ready(result),
            Err(WaveEngineError::InsufficientTrainingData { found, .. }) => {
                warn!(examples = found, waves = waves.len(), "forecast unavailable");
                ForecastOutcome::Unavailable {
                    reason: INSUFFICIENT_DATA_MESSAGE.to_string(),
                }
            }
            Err(e) => {
                warn!("Forecast failed: {}", e);
                ForecastOutcome::Unavailable {
                    reason: format!("Forecast failed: {}", e),
                }
            }
        };

        let projection = forecast
            .result()
            .and_then(|result| self.project(&pivots, result));

        info!(
            bars = prices.len(),
            pivots = pivots.len(),
            waves = waves.len(),
            triangles = triangles.len(),
            examples = training.len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            pivots,
            waves,
            triangles,
            training_examples: training.len(),
            forecast,
            projection,
        })
    }

    /// Line from the last pivot to its price moved by the predicted change,
    /// `projection_horizon` bars later. The end may lie past the series.
    fn project(&self, pivots: &[Pivot], result: &ForecastResult) -> Option<ForecastProjection> {
        let last = pivots.last()?;
        Some(ForecastProjection {
            from_index: last.index,
            from_price: last.price,
            to_index: last.index + self.config.projection_horizon,
            to_price: last.price * (1.0 + result.predicted_change),
        })
    }
}

impl Default for WaveAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForestConfig;
    use crate::types::TriangleKind;

    /// Linear legs between turning points, four bars per leg
    fn zigzag(turns: &[f64]) -> Vec<f64> {
        let mut prices = Vec::new();
        for leg in turns.windows(2) {
            for step in 0..4 {
                prices.push(leg[0] + (leg[1] - leg[0]) * step as f64 / 4.0);
            }
        }
        prices.extend(turns.last());
        prices
    }

    /// Highs fall and lows rise over the first five legs
    fn contracting_series() -> Vec<f64> {
        zigzag(&[
            100.0, 130.0, 104.0, 127.0, 107.0, 124.0, 110.0, 121.0, 100.0, 130.0, 104.0, 127.0,
            107.0,
        ])
    }

    fn analyzer() -> WaveAnalyzer {
        WaveAnalyzer::new(AnalysisConfig {
            threshold: 0.05,
            forest: ForestConfig {
                n_trees: 20,
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[test]
    fn test_full_run_produces_forecast() {
        let prices = contracting_series();
        let report = analyzer().analyze(&prices).unwrap();

        assert_eq!(report.pivots.first().unwrap().index, 0);
        assert_eq!(report.pivots.last().unwrap().index, prices.len() - 1);
        assert_eq!(report.waves.len(), report.pivots.len() - 1);
        assert_eq!(report.pivots.len(), 13);
        assert_eq!(report.training_examples, 7);

        let result = report.forecast.result().expect("forecast should be ready");
        assert_eq!(result.training_examples, report.training_examples);

        let projection = report.projection.unwrap();
        assert_eq!(projection.from_index, prices.len() - 1);
        assert_eq!(projection.to_index, prices.len() - 1 + 5);
        assert!(
            (projection.to_price - projection.from_price * (1.0 + result.predicted_change)).abs()
                < 1e-9
        );
        assert_eq!(report.summary().len(), 2);
    }

    #[test]
    fn test_shrinking_swings_form_contracting_triangles() {
        let report = analyzer().analyze(&contracting_series()).unwrap();
        assert!(report
            .triangles
            .iter()
            .any(|t| t.kind == TriangleKind::Contracting));
    }

    #[test]
    fn test_short_series_degrades_gracefully() {
        let report = analyzer().analyze(&[10.0, 11.0, 12.0, 8.0, 9.0, 15.0]).unwrap();

        assert_eq!(report.pivots.len(), 4);
        assert!(report.triangles.is_empty());
        assert_eq!(report.training_examples, 0);
        assert_eq!(
            report.forecast,
            ForecastOutcome::Unavailable {
                reason: INSUFFICIENT_DATA_MESSAGE.to_string()
            }
        );
        assert!(report.projection.is_none());
        assert_eq!(report.summary(), vec![INSUFFICIENT_DATA_MESSAGE.to_string()]);
    }

    #[test]
    fn test_single_price() {
        let report = analyzer().analyze(&[50.0]).unwrap();
        assert_eq!(report.pivots.len(), 1);
        assert!(report.waves.is_empty());
        assert!(report.forecast.result().is_none());
    }

    #[test]
    fn test_aborts_on_invalid_threshold() {
        let analyzer = WaveAnalyzer::new(AnalysisConfig::default().with_threshold(0.0));
        assert_eq!(
            analyzer.analyze(&[1.0, 2.0]),
            Err(WaveEngineError::InvalidThreshold(0.0))
        );
    }

    #[test]
    fn test_aborts_on_empty_series() {
        assert_eq!(
            WaveAnalyzer::default().analyze(&[]),
            Err(WaveEngineError::EmptySeries)
        );
    }

    #[test]
    fn test_outcome_serializes_with_status() {
        let outcome = ForecastOutcome::Unavailable {
            reason: "nope".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "nope");
    }
}
