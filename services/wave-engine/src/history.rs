//! Forecast history log
//!
//! One record per analysis run. The log is owned by the caller (a session, a
//! service's shared state) and only ever appended to; nothing here persists
//! it across restarts.

use crate::types::{ForecastResult, WaveLabel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used when rendering history rows
pub const HISTORY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One forecast, keyed by wall-clock time and ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub label: WaveLabel,
    /// Predicted change in percent, rounded to two decimals
    pub forecast_pct: f64,
}

impl HistoryEntry {
    pub fn from_forecast(ticker: &str, forecast: &ForecastResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            ticker: ticker.to_string(),
            label: forecast.predicted_label,
            forecast_pct: round_to_cents(forecast.predicted_change_pct()),
        }
    }

    pub fn formatted_time(&self) -> String {
        self.timestamp.format(HISTORY_TIME_FORMAT).to_string()
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Append-only, caller-owned run history
#[derive(Debug, Clone, Default, Serialize)]
pub struct ForecastHistory {
    entries: Vec<HistoryEntry>,
}

impl ForecastHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries for one ticker, oldest first
    pub fn for_ticker<'a>(&'a self, ticker: &'a str) -> impl Iterator<Item = &'a HistoryEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.ticker.eq_ignore_ascii_case(ticker))
    }
}
