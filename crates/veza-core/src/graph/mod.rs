//! Portable HNSW graph topology: on-disk adjacency format and loaders.
//!
//! The adjacency file is the contract between the offline builder and the
//! search nodes. It carries topology only; vector payloads live in the
//! storage service. Two load strategies exist behind one [`GraphStore`]
//! surface:
//!
//! - **Resident**: the whole graph materialized in memory.
//! - **Lazy**: per-level offset tables plus positional reads against the
//!   file, with a bounded LRU over recently materialized neighbor lists.

mod format;
mod store;

pub(crate) use format::write_u32_le;
pub use format::{GraphHeader, Label, MAX_NODE_COUNT, MAX_REASONABLE_DEGREE};
pub use store::{GraphStore, LazyGraph, LoadMode, NodeOffset, ResidentGraph};
