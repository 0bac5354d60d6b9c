//! Error types for Veza.
//!
//! A single error enum shared by the loader, the search engine, the exporter
//! and both services. Error codes follow the pattern `VEZA-XXX` for easy
//! debugging across service boundaries.

use thiserror::Error;

/// Result type alias for Veza operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Veza operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Vector dimension mismatch (VEZA-001).
    ///
    /// Fatal for the query: a wrong-sized vector indicates corruption or
    /// misconfiguration, never a recoverable condition.
    #[error("[VEZA-001] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Adjacency file corrupted (VEZA-002).
    ///
    /// The graph file failed a structural check during load. The service
    /// refuses to enter the serving state.
    #[error("[VEZA-002] Graph corrupted: {0}")]
    GraphCorrupted(String),

    /// Unknown label (VEZA-003).
    ///
    /// The label does not resolve against the loaded graph.
    #[error("[VEZA-003] Unknown label {0}")]
    UnknownLabel(u32),

    /// Vector not found in storage (VEZA-004).
    #[error("[VEZA-004] Vector {0} not found in storage")]
    VectorNotFound(u32),

    /// Storage service unreachable (VEZA-005).
    #[error("[VEZA-005] Storage unreachable: {0}")]
    StorageUnreachable(String),

    /// Storage error (VEZA-006).
    #[error("[VEZA-006] Storage error: {0}")]
    Storage(String),

    /// Configuration error (VEZA-007).
    #[error("[VEZA-007] Configuration error: {0}")]
    Config(String),

    /// IO error (VEZA-008).
    #[error("[VEZA-008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (VEZA-009).
    #[error("[VEZA-009] Serialization error: {0}")]
    Serialization(String),

    /// Index error (VEZA-010).
    #[error("[VEZA-010] Index error: {0}")]
    Index(String),
}

impl Error {
    /// Returns the error code (e.g., "VEZA-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "VEZA-001",
            Self::GraphCorrupted(_) => "VEZA-002",
            Self::UnknownLabel(_) => "VEZA-003",
            Self::VectorNotFound(_) => "VEZA-004",
            Self::StorageUnreachable(_) => "VEZA-005",
            Self::Storage(_) => "VEZA-006",
            Self::Config(_) => "VEZA-007",
            Self::Io(_) => "VEZA-008",
            Self::Serialization(_) => "VEZA-009",
            Self::Index(_) => "VEZA-010",
        }
    }

    /// Returns true if this error can be recovered from by skipping the
    /// affected node.
    ///
    /// Skipping one neighbor at most biases recall, never correctness;
    /// corruption and configuration errors are never recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::VectorNotFound(_) | Self::Storage(_) | Self::StorageUnreachable(_)
        )
    }
}
