//! Elliott-wave style swing analysis with random-forest forecasting
//!
//! Pure computation over a closing-price series: zigzag pivots, wave
//! attributes, triangle patterns, a sliding-window training set and a
//! classifier/regressor pair predicting the next wave.

pub mod types;
pub mod pivots;
pub mod waves;
pub mod patterns;
pub mod training;
pub mod models;
pub mod forecast;
pub mod history;
pub mod config;
pub mod analyzer;

pub use types::*;
pub use pivots::{detect_pivots, validate_threshold};
pub use waves::extract_waves;
pub use patterns::{classify_window, detect_triangles};
pub use training::{assign_labels, build_training_set};
pub use models::{Estimator, ForestConfig, RandomForestClassifier, RandomForestRegressor};
pub use forecast::{forecast, ForecastEngine, MIN_TRAINING_EXAMPLES};
pub use history::{ForecastHistory, HistoryEntry};
pub use config::AnalysisConfig;
pub use analyzer::{AnalysisReport, ForecastOutcome, WaveAnalyzer, INSUFFICIENT_DATA_MESSAGE};
