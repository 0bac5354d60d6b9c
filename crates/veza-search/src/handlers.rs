//! HTTP handlers for the search service.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::error;
use veza_core::mem::rss_kb;
use veza_core::Error;

use crate::types::{
    ErrorResponse, InfoResponse, MemResponse, SearchRequest, SearchResponse, SearchResultResponse,
};
use crate::AppState;

/// Top-k similarity search.
///
/// The traversal is CPU-bound and its vector fetches block, so the whole
/// query runs on a blocking worker; within one query execution is
/// sequential.
#[utoipa::path(
    post,
    path = "/search",
    tag = "search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 500, description = "Query invariant violated", body = ErrorResponse),
        (status = 502, description = "Storage service unavailable", body = ErrorResponse)
    )
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let engine = Arc::clone(&state.engine);
    let ef = req.ef.unwrap_or(state.ef);
    let k = req.k.unwrap_or(state.k);
    let entry = req.entry_id.or(state.entry);

    let outcome =
        tokio::task::spawn_blocking(move || engine.search(&req.query, ef, k, entry)).await;

    match outcome {
        Ok(Ok(results)) => Json(SearchResponse {
            results: results
                .into_iter()
                .map(|(id, distance)| SearchResultResponse { id, distance })
                .collect(),
            rss_kb: rss_kb(),
            mode: state.mode_name().to_string(),
        })
        .into_response(),
        Ok(Err(e)) => {
            let status = match e {
                Error::Storage(_) | Error::StorageUnreachable(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("search worker panicked: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Deployment summary: graph size, dimension, defaults, mode.
#[utoipa::path(
    get,
    path = "/info",
    tag = "info",
    responses((status = 200, description = "Service information", body = InfoResponse))
)]
#[allow(clippy::unused_async)]
pub async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(InfoResponse {
        nodes: state.engine.graph().len(),
        dim: state.engine.dim(),
        ef: state.ef,
        storage: state.storage_url.clone(),
        mode: state.mode_name().to_string(),
    })
}

/// Process resident set, for memory-footprint comparisons between modes.
#[utoipa::path(
    get,
    path = "/mem",
    tag = "info",
    responses((status = 200, description = "Resident set size", body = MemResponse))
)]
#[allow(clippy::unused_async)]
pub async fn mem(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(MemResponse { rss_kb: rss_kb() })
}
