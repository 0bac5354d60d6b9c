#![allow(clippy::doc_markdown)]
#![allow(clippy::unused_async)]
#![allow(clippy::cast_possible_truncation)]
//! Veza storage service: a persistent {label → vector} store with a small
//! HTTP surface (`/vec/put`, `/vec/get`, `/vec/batch_get`).
//!
//! The service is stateless beyond its backing store, so it scales
//! horizontally by sharding on label. Compute nodes treat it as the
//! authoritative home of every vector payload.
//!
//! ## OpenAPI Documentation
//!
//! - Swagger UI: `GET /swagger-ui`
//! - OpenAPI JSON: `GET /api-docs/openapi.json`

mod handlers;
mod store;
mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

pub use handlers::{batch_get_vectors, get_vector, health_check, put_vector};
pub use store::VectorStore;
pub use types::{ErrorResponse, VectorResponse};

/// Veza storage API documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Veza Storage API",
        description = "Persistent vector storage for Veza compute nodes."
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "vectors", description = "Vector put/get operations")
    ),
    paths(
        handlers::health_check,
        handlers::put_vector,
        handlers::get_vector,
        handlers::batch_get_vectors
    ),
    components(schemas(VectorResponse, ErrorResponse))
)]
pub struct ApiDoc;

/// Application state shared across handlers.
pub struct AppState {
    /// The backing vector store.
    pub store: VectorStore,
}

/// Builds the service router over `state`.
#[must_use]
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/vec/put", post(put_vector))
        .route("/vec/get", get(get_vector))
        .route("/vec/batch_get", post(batch_get_vectors))
        .with_state(state)
}
