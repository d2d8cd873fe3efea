use std::sync::Arc;

use crate::config::Config;
use crate::retrieval::pipeline::RetrievalPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Stateless retrieval pipeline; the embedder behind it is swappable.
    pub retrieval: Arc<RetrievalPipeline>,
    pub config: Config,
}
