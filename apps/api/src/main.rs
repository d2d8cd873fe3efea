mod config;
mod embedding_client;
mod errors;
mod models;
mod retrieval;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding_client::embedder::{Embedder, EmbedderConfig};
use crate::retrieval::pipeline::RetrievalPipeline;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Retrieval API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize embedder (Gemini, with model fallback)
    let embedder_config = EmbedderConfig {
        api_key: config.gemini_api_key.clone(),
        model_priority: config.embedding_models.clone(),
        embedding_dimension: config.embedding_dimension,
    };
    let embedder = Embedder::gemini(&embedder_config, config.gemini_api_base.clone())?;
    info!(
        "Embedder initialized (models: {}, dimension: {})",
        config.embedding_models.join(", "),
        config.embedding_dimension
    );

    let retrieval = RetrievalPipeline::new(Arc::new(embedder)).with_top_k(config.retrieval_top_k);

    // Build app state
    let state = AppState {
        retrieval: Arc::new(retrieval),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
