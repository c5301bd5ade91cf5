//! Observability: run counters and timings

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Metrics collector shared by the handlers
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<RwLock<MetricsInner>>,
}

struct MetricsInner {
    counters: HashMap<String, u64>,
    gauges: HashMap<String, f64>,
    histograms: HashMap<String, Vec<f64>>,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsInner {
                counters: HashMap::new(),
                gauges: HashMap::new(),
                histograms: HashMap::new(),
                start_time: Instant::now(),
            })),
        }
    }

    /// Increment a counter
    pub async fn increment(&self, name: &str, value: u64) {
        let mut inner = self.inner.write().await;
        let counter = inner.counters.entry(name.to_string()).or_insert(0);
        *counter += value;
    }

    /// Set a gauge value
    pub async fn gauge(&self, name: &str, value: f64) {
        let mut inner = self.inner.write().await;
        inner.gauges.insert(name.to_string(), value);
    }

    /// Record a histogram value
    pub async fn histogram(&self, name: &str, value: f64) {
        let mut inner = self.inner.write().await;
        inner
            .histograms
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.read().await;
        MetricsSnapshot {
            counters: inner.counters.clone(),
            gauges: inner.gauges.clone(),
            means: inner
                .histograms
                .iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(name, values)| {
                    (name.clone(), values.iter().sum::<f64>() / values.len() as f64)
                })
                .collect(),
            uptime_secs: inner.start_time.elapsed().as_secs(),
        }
    }

    pub async fn get_counter(&self, name: &str) -> u64 {
        let inner = self.inner.read().await;
        inner.counters.get(name).copied().unwrap_or(0)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub gauges: HashMap<String, f64>,
    /// Mean of every recorded histogram
    pub means: HashMap<String, f64>,
    pub uptime_secs: u64,
}

/// Predefined metric names
pub mod metrics {
    pub const ANALYSIS_REQUESTS: &str = "analysis_requests_total";
    pub const ANALYSIS_FAILED: &str = "analysis_failed_total";
    pub const ANALYSIS_DURATION_MS: &str = "analysis_duration_ms";
    pub const FORECASTS_READY: &str = "forecasts_ready_total";
    pub const FORECASTS_UNAVAILABLE: &str = "forecasts_unavailable_total";
    pub const RETRIEVAL_ERRORS: &str = "retrieval_errors_total";
    pub const HISTORY_ENTRIES: &str = "history_entries";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counters_and_means() {
        let collector = MetricsCollector::new();
        collector.increment(metrics::ANALYSIS_REQUESTS, 1).await;
        collector.increment(metrics::ANALYSIS_REQUESTS, 2).await;
        collector.gauge(metrics::HISTORY_ENTRIES, 4.0).await;
        collector.histogram(metrics::ANALYSIS_DURATION_MS, 10.0).await;
        collector.histogram(metrics::ANALYSIS_DURATION_MS, 30.0).await;

        assert_eq!(collector.get_counter(metrics::ANALYSIS_REQUESTS).await, 3);
        assert_eq!(collector.get_counter(metrics::FORECASTS_READY).await, 0);

        let snapshot = collector.snapshot().await;
        assert_eq!(snapshot.gauges[metrics::HISTORY_ENTRIES], 4.0);
        assert_eq!(snapshot.means[metrics::ANALYSIS_DURATION_MS], 20.0);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let collector = MetricsCollector::default();
        let clone = collector.clone();
        clone.increment(metrics::RETRIEVAL_ERRORS, 1).await;
        assert_eq!(collector.get_counter(metrics::RETRIEVAL_ERRORS).await, 1);
    }
}
