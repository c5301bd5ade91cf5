use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of waves that make up one training window (four inputs + one target)
pub const WINDOW_WAVES: usize = 5;
/// Number of scalar attributes each wave contributes to a feature vector
pub const WAVE_ATTRIBUTES: usize = 5;
/// Width of a feature vector (four waves of five attributes)
pub const FEATURE_WIDTH: usize = (WINDOW_WAVES - 1) * WAVE_ATTRIBUTES;

/// Whether a pivot closed an up move or a down move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotKind {
    High,
    Low,
}

impl PivotKind {
    pub fn opposite(self) -> Self {
        match self {
            PivotKind::High => PivotKind::Low,
            PivotKind::Low => PivotKind::High,
        }
    }
}

/// Confirmed turning point of a price series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub index: usize,
    pub price: f64,
    pub kind: PivotKind,
}

impl Pivot {
    pub fn high(index: usize, price: f64) -> Self {
        Self { index, price, kind: PivotKind::High }
    }

    pub fn low(index: usize, price: f64) -> Self {
        Self { index, price, kind: PivotKind::Low }
    }
}

/// Direction of a wave, encoded as 1 (up) or 0 (down) in feature vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveDirection {
    Up,
    Down,
}

impl WaveDirection {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            WaveDirection::Up
        } else {
            WaveDirection::Down
        }
    }

    pub fn as_feature(self) -> f64 {
        match self {
            WaveDirection::Up => 1.0,
            WaveDirection::Down => 0.0,
        }
    }
}

/// Price movement between two consecutive pivots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub start_index: usize,
    pub end_index: usize,
    pub start_price: f64,
    pub end_price: f64,
    pub duration: usize,
    /// Signed fractional change, (end - start) / start
    pub change: f64,
    pub slope: f64,
    pub volatility: f64,
    pub direction: WaveDirection,
}

impl Wave {
    /// The five scalar attributes in feature-vector order:
    /// change, duration, slope, volatility, direction
    pub fn attributes(&self) -> [f64; WAVE_ATTRIBUTES] {
        [
            self.change,
            self.duration as f64,
            self.slope,
            self.volatility,
            self.direction.as_feature(),
        ]
    }
}

/// Positional wave tag. `Wave_1`..`Wave_5` for the first five waves of a run,
/// `Unknown` for everything after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WaveLabel {
    #[serde(rename = "Wave_1")]
    Wave1,
    #[serde(rename = "Wave_2")]
    Wave2,
    #[serde(rename = "Wave_3")]
    Wave3,
    #[serde(rename = "Wave_4")]
    Wave4,
    #[serde(rename = "Wave_5")]
    Wave5,
    Unknown,
}

impl WaveLabel {
    pub const ALL: [WaveLabel; 6] = [
        WaveLabel::Wave1,
        WaveLabel::Wave2,
        WaveLabel::Wave3,
        WaveLabel::Wave4,
        WaveLabel::Wave5,
        WaveLabel::Unknown,
    ];

    /// Label for the wave at `position` in the full wave sequence
    pub fn for_position(position: usize) -> Self {
        match position {
            0 => WaveLabel::Wave1,
            1 => WaveLabel::Wave2,
            2 => WaveLabel::Wave3,
            3 => WaveLabel::Wave4,
            4 => WaveLabel::Wave5,
            _ => WaveLabel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WaveLabel::Wave1 => "Wave_1",
            WaveLabel::Wave2 => "Wave_2",
            WaveLabel::Wave3 => "Wave_3",
            WaveLabel::Wave4 => "Wave_4",
            WaveLabel::Wave5 => "Wave_5",
            WaveLabel::Unknown => "Unknown",
        }
    }

    /// Dense class index used by the classifier
    pub fn class_index(self) -> usize {
        match self {
            WaveLabel::Wave1 => 0,
            WaveLabel::Wave2 => 1,
            WaveLabel::Wave3 => 2,
            WaveLabel::Wave4 => 3,
            WaveLabel::Wave5 => 4,
            WaveLabel::Unknown => 5,
        }
    }

    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for WaveLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triangle geometries recognised among five pivots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriangleKind {
    Contracting,
    Running,
    Barrier,
}

impl TriangleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriangleKind::Contracting => "Contracting Triangle",
            TriangleKind::Running => "Running Triangle",
            TriangleKind::Barrier => "Barrier Triangle",
        }
    }
}

impl fmt::Display for TriangleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triangle found in a five-pivot window, anchored on the middle pivot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrianglePattern {
    pub pivot_index: usize,
    pub kind: TriangleKind,
}

/// Four consecutive waves flattened into 20 scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub Vec<f64>);

impl FeatureVector {
    pub fn from_waves(waves: &[Wave]) -> Self {
        Self(waves.iter().flat_map(|w| w.attributes()).collect())
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Supervised-learning examples, index-aligned
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    pub features: Vec<FeatureVector>,
    pub class_targets: Vec<WaveLabel>,
    pub regression_targets: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn is_aligned(&self) -> bool {
        self.features.len() == self.class_targets.len()
            && self.features.len() == self.regression_targets.len()
    }

    /// Chronologically last feature vector
    pub fn latest(&self) -> Option<&FeatureVector> {
        self.features.last()
    }
}

/// Model output for the most recent feature vector.
///
/// The models are fit on the same windows they predict from, so this is an
/// in-sample estimate, not a validated forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub predicted_label: WaveLabel,
    pub predicted_change: f64,
    pub training_examples: usize,
}

impl ForecastResult {
    pub fn predicted_change_pct(&self) -> f64 {
        self.predicted_change * 100.0
    }
}

/// Dotted forecast line drawn from the last pivot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastProjection {
    pub from_index: usize,
    pub from_price: f64,
    pub to_index: usize,
    pub to_price: f64,
}

/// Error types for wave analysis
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WaveEngineError {
    #[error("Invalid zigzag threshold {0}: must be strictly between 0 and 1")]
    InvalidThreshold(f64),

    #[error("Price series is empty")]
    EmptySeries,

    #[error("Insufficient pivots for pattern classification: found {found}, need 5")]
    InsufficientPivots { found: usize },

    #[error("Insufficient training data: found {found} examples, need at least {required}")]
    InsufficientTrainingData { found: usize, required: usize },

    #[error("Degenerate wave starting at index {start_index}: start price is zero")]
    DegenerateWave { start_index: usize },

    #[error("Pivot index {index} is outside a series of length {len}")]
    PivotOutOfRange { index: usize, len: usize },

    #[error("Training set is misaligned: {features} features, {class_targets} class targets, {regression_targets} regression targets")]
    MisalignedTrainingSet {
        features: usize,
        class_targets: usize,
        regression_targets: usize,
    },

    #[error("Model received {features} feature vectors but {targets} targets")]
    TargetLengthMismatch { features: usize, targets: usize },

    #[error("Model {0} has not been fitted")]
    ModelNotFitted(String),

    /// `index` is the position within the batch; 0 for a single prediction
    #[error("Feature vector {index} has {found} values, expected {expected}")]
    FeatureWidthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// Result type for wave analysis operations
pub type Result<T> = std::result::Result<T, WaveEngineError>;
