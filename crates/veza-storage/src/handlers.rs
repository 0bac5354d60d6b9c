//! HTTP handlers for the storage service.
//!
//! The wire formats are frozen (clients include search nodes built
//! separately): `put` takes a binary body, `get` and `batch_get` speak
//! JSON, and a miss in a batch is a positional `null`.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::types::VectorResponse;
use crate::AppState;

/// Query parameters of `GET /vec/get`.
#[derive(Debug, Deserialize)]
pub struct GetParams {
    /// Label to look up.
    pub id: u32,
}

/// Store one vector from a binary body:
/// 4-byte label, 4-byte dimension, then dimension × 4-byte floats, all
/// little-endian. Any length mismatch is a 400.
#[utoipa::path(
    post,
    path = "/vec/put",
    tag = "vectors",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Stored", body = String),
        (status = 400, description = "Malformed body", body = String)
    )
)]
#[allow(clippy::unused_async)]
pub async fn put_vector(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    if body.len() < 8 {
        return (StatusCode::BAD_REQUEST, "ERR");
    }

    let label = u32::from_le_bytes(body[0..4].try_into().expect("length checked"));
    let dim = u32::from_le_bytes(body[4..8].try_into().expect("length checked")) as usize;

    if body.len() != 8 + dim * 4 {
        debug!(label, dim, actual = body.len(), "put body length mismatch");
        return (StatusCode::BAD_REQUEST, "ERR");
    }

    let vector: Vec<f32> = body[8..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    match state.store.put(label, &vector) {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!(label, "put failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "ERR")
        }
    }
}

/// Look up one vector by label.
#[utoipa::path(
    get,
    path = "/vec/get",
    tag = "vectors",
    params(("id" = u32, Query, description = "Vector label")),
    responses(
        (status = 200, description = "The stored vector", body = VectorResponse),
        (status = 404, description = "No vector under this label")
    )
)]
#[allow(clippy::unused_async)]
pub async fn get_vector(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GetParams>,
) -> impl IntoResponse {
    match state.store.get(params.id) {
        Some(values) => Json(VectorResponse {
            id: params.id,
            values,
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Look up many vectors in one call. The response array is positional:
/// element i is the vector for label i of the request, or `null`.
#[utoipa::path(
    post,
    path = "/vec/batch_get",
    tag = "vectors",
    request_body = Vec<u32>,
    responses(
        (status = 200, description = "Positional array of vectors and nulls")
    )
)]
#[allow(clippy::unused_async)]
pub async fn batch_get_vectors(
    State(state): State<Arc<AppState>>,
    Json(labels): Json<Vec<u32>>,
) -> impl IntoResponse {
    Json(state.store.batch_get(&labels))
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is healthy", body = Object))
)]
#[allow(clippy::unused_async)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "vectors": state.store.len(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
