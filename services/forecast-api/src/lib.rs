pub mod settings;
pub mod observability;
pub mod health;
pub mod handlers {
    pub mod analysis;
    pub mod history;
}

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use data_retrieval::HistoryRetriever;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wave_engine::ForecastHistory;

pub use observability::MetricsCollector;
pub use settings::Settings;

/// Application state shared across handlers
pub struct AppState {
    pub retriever: HistoryRetriever,
    pub settings: Settings,
    pub metrics: MetricsCollector,
    /// Forecasts made since startup, oldest first
    pub history: RwLock<ForecastHistory>,
}

impl AppState {
    pub fn new(retriever: HistoryRetriever, settings: Settings) -> Self {
        Self {
            retriever,
            settings,
            metrics: MetricsCollector::new(),
            history: RwLock::new(ForecastHistory::new()),
        }
    }
}

/// Build the API router
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/analysis", post(handlers::analysis::analyze_ticker))
        .route("/analysis/prices", post(handlers::analysis::analyze_prices))
        .route("/history", get(handlers::history::list_history));

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/health", get(health::health_detail))
        .nest("/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
