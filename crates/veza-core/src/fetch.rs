//! Vector fetch abstraction.
//!
//! The search engine never talks HTTP directly: it asks a [`VectorSource`]
//! for payloads by label and inspects the classified error to decide
//! whether to skip the node or abort the query. The production source is
//! [`crate::client::StorageClient`]; tests inject [`MemorySource`].

use crate::error::Error;
use crate::graph::Label;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

/// Classified failure of a single vector fetch.
///
/// The caller decides the policy: `NotFound` and `Transient` are skippable
/// per node; `Unreachable` and `BadPayload` abort the query.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The storage service has no vector under this label.
    #[error("vector {0} not found")]
    NotFound(Label),

    /// The request failed after all retry attempts (non-200, timeout).
    #[error("transient storage failure for {label}: {reason}")]
    Transient {
        /// Label whose fetch failed.
        label: Label,
        /// Last observed failure.
        reason: String,
    },

    /// The storage service could not be contacted at all.
    #[error("storage unreachable: {0}")]
    Unreachable(String),

    /// The response decoded but did not contain a usable vector.
    #[error("bad payload for {label}: {reason}")]
    BadPayload {
        /// Label whose payload was malformed.
        label: Label,
        /// What was wrong with it.
        reason: String,
    },
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(label) => Self::VectorNotFound(label),
            FetchError::Unreachable(reason) => Self::StorageUnreachable(reason),
            FetchError::Transient { .. } | FetchError::BadPayload { .. } => {
                Self::Storage(err.to_string())
            }
        }
    }
}

/// Something that resolves labels to vectors.
pub trait VectorSource: Send + Sync {
    /// Fetches the vector stored under `label`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`FetchError`]; see the variant docs for the
    /// skip-vs-abort contract.
    fn fetch(&self, label: Label) -> std::result::Result<Arc<[f32]>, FetchError>;
}

/// In-process vector source backed by a plain map.
///
/// Used by unit tests and by the exporter round-trip checks, where the
/// builder already holds every vector and a network hop would only add
/// noise.
#[derive(Debug, Default)]
pub struct MemorySource {
    vectors: FxHashMap<Label, Arc<[f32]>>,
}

impl MemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the vector under `label`.
    pub fn insert(&mut self, label: Label, vector: Vec<f32>) {
        self.vectors.insert(label, Arc::from(vector));
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns true if no vectors are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl VectorSource for MemorySource {
    fn fetch(&self, label: Label) -> std::result::Result<Arc<[f32]>, FetchError> {
        self.vectors
            .get(&label)
            .cloned()
            .ok_or(FetchError::NotFound(label))
    }
}
