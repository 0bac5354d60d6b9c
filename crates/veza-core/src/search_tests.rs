//! Tests for the search engine: end-to-end search shapes, failure
//! semantics, determinism and ordering.

use crate::error::Error;
use crate::fetch::{FetchError, MemorySource, VectorSource};
use crate::graph::{GraphStore, Label, LoadMode};
use crate::search::SearchEngine;
use crate::testutil::{write_chain_graph, write_graph};
use std::sync::Arc;
use tempfile::tempdir;

/// Source that fails every fetch as if the storage service were down.
struct UnreachableSource;

impl VectorSource for UnreachableSource {
    fn fetch(&self, _label: Label) -> Result<Arc<[f32]>, FetchError> {
        Err(FetchError::Unreachable("connection refused".to_string()))
    }
}

fn chain_engine(mode: LoadMode) -> SearchEngine<MemorySource> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("g.bin");
    write_chain_graph(&path);
    let graph = GraphStore::load(&path, mode).unwrap();

    let mut source = MemorySource::new();
    source.insert(0, vec![0.0, 0.0]);
    source.insert(1, vec![1.0, 0.0]);
    source.insert(2, vec![2.0, 0.0]);
    SearchEngine::new(graph, source, 2)
}

#[test]
fn test_single_node_graph_scenario() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("g.bin");
    write_graph(&path, 7, 0, &[(7, vec![vec![]])]);
    let graph = GraphStore::load(&path, LoadMode::Resident).unwrap();

    let mut source = MemorySource::new();
    source.insert(7, vec![1.0, 2.0, 3.0]);
    let engine = SearchEngine::new(graph, source, 3);

    let results = engine.search(&[1.0, 2.0, 3.0], 1, 1, None).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, 7);
    assert!(results[0].1.abs() < 1e-9);
}

#[test]
fn test_chain_graph_scenario() {
    for mode in [LoadMode::Resident, LoadMode::Lazy] {
        let engine = chain_engine(mode);
        let results = engine.search(&[1.9, 0.0], 3, 2, None).unwrap();

        assert_eq!(results.len(), 2, "{mode:?}");
        assert_eq!(results[0].0, 2);
        assert!((results[0].1 - 0.01).abs() < 1e-6);
        assert_eq!(results[1].0, 1);
        assert!((results[1].1 - 0.81).abs() < 1e-6);
    }
}

#[test]
fn test_early_stop_fires_only_when_saturated() {
    // Fan: far entry 0 points at 1..=4; the two global nearest (1, 2) must
    // survive ef=2 even though the entry itself is much worse.
    let dir = tempdir().unwrap();
    let path = dir.path().join("g.bin");
    write_graph(
        &path,
        0,
        0,
        &[
            (0, vec![vec![1, 2, 3, 4]]),
            (1, vec![vec![0]]),
            (2, vec![vec![0]]),
            (3, vec![vec![0]]),
            (4, vec![vec![0]]),
        ],
    );
    let graph = GraphStore::load(&path, LoadMode::Resident).unwrap();

    let mut source = MemorySource::new();
    source.insert(0, vec![10.0, 0.0]);
    source.insert(1, vec![0.0, 0.0]);
    source.insert(2, vec![0.5, 0.0]);
    source.insert(3, vec![9.0, 0.0]);
    source.insert(4, vec![8.0, 0.0]);
    let engine = SearchEngine::new(graph, source, 2);

    let results = engine.search(&[0.0, 0.0], 2, 2, None).unwrap();
    let labels: Vec<Label> = results.iter().map(|r| r.0).collect();
    assert_eq!(labels, vec![1, 2]);
}

#[test]
fn test_missing_vector_is_skipped() {
    // Label 9 exists in the graph but not in storage: the query completes
    // and 9 is absent from the results.
    let dir = tempdir().unwrap();
    let path = dir.path().join("g.bin");
    write_graph(
        &path,
        0,
        0,
        &[
            (0, vec![vec![1, 9]]),
            (1, vec![vec![0, 9]]),
            (9, vec![vec![0, 1]]),
        ],
    );
    let graph = GraphStore::load(&path, LoadMode::Resident).unwrap();

    let mut source = MemorySource::new();
    source.insert(0, vec![0.0, 0.0]);
    source.insert(1, vec![1.0, 0.0]);
    let engine = SearchEngine::new(graph, source, 2);

    let results = engine.search(&[0.5, 0.0], 4, 3, None).unwrap();
    let labels: Vec<Label> = results.iter().map(|r| r.0).collect();
    assert_eq!(labels, vec![0, 1]);
    assert!(!labels.contains(&9));
}

#[test]
fn test_search_is_deterministic() {
    let engine = chain_engine(LoadMode::Resident);
    let first = engine.search(&[1.2, 0.3], 3, 3, None).unwrap();
    for _ in 0..5 {
        assert_eq!(engine.search(&[1.2, 0.3], 3, 3, None).unwrap(), first);
    }
}

#[test]
fn test_results_sorted_and_bounded() {
    let engine = chain_engine(LoadMode::Resident);
    let results = engine.search(&[0.4, 0.0], 3, 2, None).unwrap();
    assert!(results.len() <= 2);
    for pair in results.windows(2) {
        assert!(pair[0].1 <= pair[1].1);
    }
}

#[test]
fn test_explicit_entry_overrides_default() {
    let engine = chain_engine(LoadMode::Resident);
    let results = engine.search(&[2.0, 0.0], 3, 1, Some(2)).unwrap();
    assert_eq!(results[0].0, 2);
}

#[test]
fn test_unknown_entry_label_is_an_error() {
    let engine = chain_engine(LoadMode::Resident);
    let err = engine.search(&[0.0, 0.0], 3, 1, Some(99)).unwrap_err();
    assert!(matches!(err, Error::UnknownLabel(99)));
}

#[test]
fn test_query_dimension_mismatch_is_fatal() {
    let engine = chain_engine(LoadMode::Resident);
    let err = engine.search(&[0.0, 0.0, 0.0], 3, 1, None).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn test_wrong_dimension_payload_is_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("g.bin");
    write_graph(&path, 0, 0, &[(0, vec![vec![]])]);
    let graph = GraphStore::load(&path, LoadMode::Resident).unwrap();

    let mut source = MemorySource::new();
    source.insert(0, vec![1.0, 2.0, 3.0]); // store says dim 3, engine says 2
    let engine = SearchEngine::new(graph, source, 2);

    let err = engine.search(&[0.0, 0.0], 2, 1, None).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn test_missing_entry_vector_yields_empty_result() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("g.bin");
    write_chain_graph(&path);
    let graph = GraphStore::load(&path, LoadMode::Resident).unwrap();

    // Storage has nothing at all; every fetch is a miss.
    let engine = SearchEngine::new(graph, MemorySource::new(), 2);
    let results = engine.search(&[0.0, 0.0], 3, 2, None).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_unreachable_storage_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("g.bin");
    write_chain_graph(&path);
    let graph = GraphStore::load(&path, LoadMode::Resident).unwrap();

    let engine = SearchEngine::new(graph, UnreachableSource, 2);
    let err = engine.search(&[0.0, 0.0], 3, 2, None).unwrap_err();
    assert!(matches!(err, Error::StorageUnreachable(_)));
}

#[test]
fn test_descent_through_upper_layers() {
    // Two clusters bridged at level 1: the walk must cross to the right
    // cluster before the base-layer search starts.
    let dir = tempdir().unwrap();
    let path = dir.path().join("g.bin");
    write_graph(
        &path,
        0,
        1,
        &[
            (0, vec![vec![1], vec![3]]),
            (1, vec![vec![0]]),
            (3, vec![vec![4], vec![0]]),
            (4, vec![vec![3]]),
        ],
    );
    let graph = GraphStore::load(&path, LoadMode::Resident).unwrap();

    let mut source = MemorySource::new();
    source.insert(0, vec![0.0, 0.0]);
    source.insert(1, vec![1.0, 0.0]);
    source.insert(3, vec![10.0, 0.0]);
    source.insert(4, vec![11.0, 0.0]);
    let engine = SearchEngine::new(graph, source, 2);

    let results = engine.search(&[11.0, 0.0], 2, 1, None).unwrap();
    assert_eq!(results[0].0, 4);
    assert!(results[0].1.abs() < 1e-9);
}

#[test]
fn test_unfetchable_descent_entry_keeps_entry() {
    // Entry 0 has no vector; descent keeps it and the base layer then
    // reports an empty (but successful) result.
    let dir = tempdir().unwrap();
    let path = dir.path().join("g.bin");
    write_graph(
        &path,
        0,
        1,
        &[(0, vec![vec![1], vec![1]]), (1, vec![vec![0], vec![0]])],
    );
    let graph = GraphStore::load(&path, LoadMode::Lazy).unwrap();

    let engine = SearchEngine::new(graph, MemorySource::new(), 2);
    let results = engine.search(&[0.0, 0.0], 2, 1, None).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_cross_query_cache_serves_repeat_queries() {
    let engine = chain_engine(LoadMode::Resident);
    let _ = engine.search(&[1.9, 0.0], 3, 2, None).unwrap();
    let before = engine.cache_stats().misses;
    let _ = engine.search(&[1.9, 0.0], 3, 2, None).unwrap();
    // Second query resolves every vector from the shared cache.
    assert_eq!(engine.cache_stats().misses, before);
}
