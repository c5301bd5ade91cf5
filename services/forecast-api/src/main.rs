use std::sync::Arc;
use data_retrieval::{HistoryRetriever, YahooFinanceClient};
use forecast_api::{app, AppState, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting wave forecast API...");

    let settings = Settings::load()?;
    info!(
        yahoo = %settings.yahoo_base_url,
        threshold_pct = settings.default_threshold_pct,
        trees = settings.forest_trees,
        seed = settings.forest_seed,
        "settings loaded"
    );

    let yahoo = YahooFinanceClient::new(settings.yahoo_base_url.clone())?;
    let retriever = HistoryRetriever::new().with_source(Arc::new(yahoo));

    let port = settings.port;
    let state = Arc::new(AppState::new(retriever, settings));
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Forecast API listening on port {}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
