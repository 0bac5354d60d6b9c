//! Request/response types for the storage service API.

use serde::Serialize;
use utoipa::ToSchema;

/// A stored vector, as returned by `GET /vec/get`.
#[derive(Debug, Serialize, ToSchema)]
pub struct VectorResponse {
    /// Vector label.
    pub id: u32,
    /// Vector components.
    pub values: Vec<f32>,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}
