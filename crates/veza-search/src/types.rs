//! Request/response types for the search service API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request for a top-k search.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Query vector; must match the deployment dimension.
    pub query: Vec<f32>,
    /// Number of results to return (service default when omitted).
    #[serde(default)]
    pub k: Option<usize>,
    /// Base-layer beam width (service default when omitted).
    #[serde(default)]
    #[schema(example = 200)]
    pub ef: Option<usize>,
    /// Entry label override (graph entrypoint when omitted).
    #[serde(default)]
    pub entry_id: Option<u32>,
}

/// One search hit.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResultResponse {
    /// Vector label.
    pub id: u32,
    /// Squared L2 distance to the query.
    pub distance: f32,
}

/// Response from a search.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// Hits sorted ascending by distance.
    pub results: Vec<SearchResultResponse>,
    /// Process resident set at response time, in kB.
    pub rss_kb: u64,
    /// Graph residency mode: "normal" or "optimized".
    pub mode: String,
}

/// Response from `GET /info`.
#[derive(Debug, Serialize, ToSchema)]
pub struct InfoResponse {
    /// Number of nodes in the loaded graph.
    pub nodes: usize,
    /// Deployment-wide vector dimension.
    pub dim: usize,
    /// Default base-layer beam width.
    pub ef: usize,
    /// Base URL of the storage service.
    pub storage: String,
    /// Graph residency mode: "normal" or "optimized".
    pub mode: String,
}

/// Response from `GET /mem`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemResponse {
    /// Process resident set in kB.
    pub rss_kb: u64,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}
