use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lookback window for a history request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
        }
    }

    /// Approximate calendar days covered
    pub fn days(&self) -> u32 {
        match self {
            Period::OneMonth => 30,
            Period::ThreeMonths => 90,
            Period::SixMonths => 180,
            Period::OneYear => 365,
            Period::TwoYears => 730,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = DataRetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DataRetrievalError::InvalidParameter(format!("unknown period: {}", s)))
    }
}

/// Bar size for a history request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[default]
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1wk")]
    Week1,
}

impl Interval {
    pub const ALL: [Interval; 5] = [
        Interval::Minute15,
        Interval::Minute30,
        Interval::Hour1,
        Interval::Day1,
        Interval::Week1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Hour1 => "1h",
            Interval::Day1 => "1d",
            Interval::Week1 => "1wk",
        }
    }

    /// Longest lookback the chart API serves at this bar size (None = unlimited)
    pub fn max_lookback_days(&self) -> Option<u32> {
        match self {
            Interval::Minute15 | Interval::Minute30 => Some(60),
            Interval::Hour1 => Some(730),
            Interval::Day1 | Interval::Week1 => None,
        }
    }

    /// Reject period/interval pairs the chart API refuses
    pub fn check_period(&self, period: Period) -> Result<()> {
        match self.max_lookback_days() {
            Some(max) if period.days() > max => Err(DataRetrievalError::InvalidParameter(format!(
                "{} bars are only available for the last {} days, {} requested",
                self, max, period
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = DataRetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| DataRetrievalError::InvalidParameter(format!("unknown interval: {}", s)))
    }
}

/// One bar of a closing-price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Closing prices for one ticker, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub ticker: String,
    pub period: Period,
    pub interval: Interval,
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }
}

/// Data source health/status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHealth {
    pub source: String,
    pub is_healthy: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub success_rate: f64,
    pub last_latency_ms: u64,
}

/// Error types for data retrieval
#[derive(Debug, thiserror::Error)]
pub enum DataRetrievalError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Rate limit exceeded for {source_name}")]
    RateLimit { source_name: String, retry_after: Option<u64> },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Source unhealthy: {0}")]
    SourceUnhealthy(String),
}

/// Result type for data retrieval operations
pub type Result<T> = std::result::Result<T, DataRetrievalError>;

/// Trait for closing-price history sources
#[async_trait::async_trait]
pub trait PriceHistorySource: Send + Sync {
    /// Fetch closing prices for `ticker` over `period` at `interval`
    async fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceHistory>;

    /// Get source health status
    async fn health(&self) -> SourceHealth;

    /// Source name
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_strings() {
        for period in Period::ALL {
            assert_eq!(period.as_str().parse::<Period>().unwrap(), period);
        }
        assert_eq!(Period::default(), Period::SixMonths);
        assert!(matches!(
            "5y".parse::<Period>(),
            Err(DataRetrievalError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_interval_strings() {
        assert_eq!("1wk".parse::<Interval>().unwrap(), Interval::Week1);
        assert_eq!(Interval::default(), Interval::Day1);
        assert!("1m".parse::<Interval>().is_err());
        assert_eq!(serde_json::to_string(&Interval::Hour1).unwrap(), "\"1h\"");
    }

    #[test]
    fn test_intraday_lookback_limits() {
        assert!(Interval::Minute15.check_period(Period::OneMonth).is_ok());
        assert!(Interval::Minute30.check_period(Period::ThreeMonths).is_err());
        assert!(Interval::Hour1.check_period(Period::TwoYears).is_ok());
        assert!(Interval::Day1.check_period(Period::TwoYears).is_ok());
    }

    #[test]
    fn test_history_closes() {
        let history = PriceHistory {
            ticker: "AAPL".to_string(),
            period: Period::OneMonth,
            interval: Interval::Day1,
            bars: vec![
                PriceBar { timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(), close: 1.5 },
                PriceBar { timestamp: DateTime::from_timestamp(1_700_086_400, 0).unwrap(), close: 2.5 },
            ],
        };
        assert_eq!(history.closes(), vec![1.5, 2.5]);
        assert_eq!(history.len(), 2);
        assert!(history.first_timestamp() < history.last_timestamp());
    }
}
