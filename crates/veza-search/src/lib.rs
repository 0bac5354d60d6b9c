#![allow(clippy::doc_markdown)]
#![allow(clippy::unused_async)]
//! Veza search service: the HNSW compute node.
//!
//! Holds a graph-only view of the index (no vector payloads in the hot
//! path) and answers top-k queries by traversing the graph and fetching
//! candidate vectors on demand from the storage service.
//!
//! ## OpenAPI Documentation
//!
//! - Swagger UI: `GET /swagger-ui`
//! - OpenAPI JSON: `GET /api-docs/openapi.json`

mod handlers;
mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use veza_core::{LoadMode, SearchEngine, StorageClient};

pub use handlers::{info, mem, search};
pub use types::{
    ErrorResponse, InfoResponse, MemResponse, SearchRequest, SearchResponse, SearchResultResponse,
};

/// Veza search API documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Veza Search API",
        description = "Disaggregated HNSW search: graph traversal here, vector payloads in the storage service."
    ),
    tags(
        (name = "search", description = "Top-k similarity search"),
        (name = "info", description = "Deployment and memory information")
    ),
    paths(handlers::search, handlers::info, handlers::mem),
    components(schemas(
        SearchRequest,
        SearchResponse,
        SearchResultResponse,
        InfoResponse,
        MemResponse,
        ErrorResponse
    ))
)]
pub struct ApiDoc;

/// Application state shared across handlers.
pub struct AppState {
    /// The search engine over the loaded graph.
    pub engine: Arc<SearchEngine<StorageClient>>,
    /// Default base-layer beam width.
    pub ef: usize,
    /// Default result count.
    pub k: usize,
    /// Default entry label override.
    pub entry: Option<u32>,
    /// Storage service base URL (reported by `/info`).
    pub storage_url: String,
}

impl AppState {
    /// Wire name of the residency mode, kept from the original deployment
    /// scripts: "optimized" is the lazy loader, "normal" the resident one.
    #[must_use]
    pub fn mode_name(&self) -> &'static str {
        match self.engine.graph().mode() {
            LoadMode::Resident => "normal",
            LoadMode::Lazy => "optimized",
        }
    }
}

/// Builds the service router over `state`.
#[must_use]
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/info", get(info))
        .route("/mem", get(mem))
        .with_state(state)
}
