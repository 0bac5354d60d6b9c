//! # Veza Core
//!
//! Core engine for Veza, a disaggregated approximate-nearest-neighbor
//! search service. The HNSW index is split in two: compute nodes hold a
//! graph-only view (the adjacency file) and fetch vector payloads on
//! demand from a separate storage service.
//!
//! ## What lives here
//!
//! - **Adjacency file** format plus two loaders (fully resident and
//!   offset-indexed lazy) behind one [`GraphStore`] surface.
//! - **Search engine**: hierarchical greedy descent + base-layer beam
//!   search over a remote [`VectorSource`], with per-query and
//!   cross-query vector caching.
//! - **Export pipeline** flattening a built [`HnswIndex`] into the
//!   portable adjacency file.
//! - Builder-side HNSW construction, the blocking storage client, and
//!   the shared configuration/error types.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod client;
pub mod config;
pub mod distance;
pub mod error;
pub mod export;
pub mod fetch;
pub mod graph;
pub mod hnsw;
pub mod mem;
pub mod search;

mod ordered_float;

pub use client::{ClientOptions, StorageClient};
pub use config::{SearchConfig, StorageConfig, VezaConfig};
pub use error::{Error, Result};
pub use export::export_adjacency;
pub use fetch::{FetchError, MemorySource, VectorSource};
pub use graph::{GraphHeader, GraphStore, Label, LoadMode};
pub use hnsw::HnswIndex;
pub use search::SearchEngine;

#[cfg(test)]
pub(crate) mod testutil;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod distance_tests;
#[cfg(test)]
mod hnsw_tests;
#[cfg(test)]
mod search_tests;
