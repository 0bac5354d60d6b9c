//! Tests for builder-side HNSW construction.

use crate::error::Error;
use crate::hnsw::HnswIndex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn line_index(n: usize) -> HnswIndex {
    let mut index = HnswIndex::new(1, n, 4, 32);
    for i in 0..n {
        #[allow(clippy::cast_precision_loss)]
        index.add(u32::try_from(i).unwrap(), vec![i as f32]).unwrap();
    }
    index
}

#[test]
fn test_empty_index() {
    let index = HnswIndex::new(4, 16, 8, 100);
    assert!(index.is_empty());
    assert!(index.entry_internal().is_none());
    assert!(index.search(&[0.0; 4], 5, 10).unwrap().is_empty());
}

#[test]
fn test_first_insert_becomes_entry() {
    let mut index = HnswIndex::new(2, 16, 8, 100);
    index.add(42, vec![1.0, 2.0]).unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index.entry_internal(), Some(0));
    assert_eq!(index.external_label(0), 42);
    assert_eq!(index.element_level(0), index.max_level());
}

#[test]
fn test_duplicate_label_rejected() {
    let mut index = HnswIndex::new(2, 16, 8, 100);
    index.add(1, vec![0.0, 0.0]).unwrap();
    let err = index.add(1, vec![1.0, 1.0]).unwrap_err();
    assert!(matches!(err, Error::Index(_)));
}

#[test]
fn test_wrong_dimension_rejected() {
    let mut index = HnswIndex::new(2, 16, 8, 100);
    let err = index.add(1, vec![0.0, 0.0, 0.0]).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn test_exact_nearest_on_line() {
    let index = line_index(50);
    let results = index.search(&[17.2], 1, 50).unwrap();
    assert_eq!(results[0].0, 17);
    assert!((results[0].1 - 0.04).abs() < 1e-4);
    // Labels equal internal indices here, so the reported distance must
    // match a direct computation against the stored element.
    let direct = index.distance_to(&[17.2], 17).unwrap();
    assert_eq!(results[0].1.to_bits(), direct.to_bits());
}

#[test]
fn test_search_results_sorted() {
    let index = line_index(30);
    let results = index.search(&[12.5], 5, 30).unwrap();
    assert_eq!(results.len(), 5);
    for pair in results.windows(2) {
        assert!(pair[0].1 <= pair[1].1);
    }
}

#[test]
fn test_degrees_respect_connection_budget() {
    let mut index = HnswIndex::new(4, 128, 6, 64);
    let mut rng = StdRng::seed_from_u64(7);
    let normal = Normal::new(0.0f32, 1.0).unwrap();
    for i in 0..128u32 {
        let v: Vec<f32> = (0..4).map(|_| normal.sample(&mut rng)).collect();
        index.add(i, v).unwrap();
    }

    for internal in 0..index.len() {
        for level in 0..=index.element_level(internal) {
            let degree = index.neighbors_at(internal, level).len();
            let cap = if level == 0 { 12 } else { 6 };
            assert!(degree <= cap, "node {internal} level {level}: {degree}");
        }
    }
}

#[test]
fn test_neighbors_stay_in_range() {
    let index = line_index(64);
    for internal in 0..index.len() {
        for level in 0..=index.element_level(internal) {
            for &nb in index.neighbors_at(internal, level) {
                assert!(nb < index.len());
                assert_ne!(nb, internal, "self-loop at {internal} level {level}");
            }
        }
    }
}

#[test]
fn test_construction_is_deterministic() {
    let a = line_index(40);
    let b = line_index(40);
    assert_eq!(a.entry_internal(), b.entry_internal());
    assert_eq!(a.max_level(), b.max_level());
    for internal in 0..a.len() {
        assert_eq!(a.element_level(internal), b.element_level(internal));
        for level in 0..=a.element_level(internal) {
            assert_eq!(
                a.neighbors_at(internal, level),
                b.neighbors_at(internal, level)
            );
        }
    }
}

#[test]
fn test_recall_on_gaussian_corpus() {
    let dim = 8;
    let n = 300;
    let mut index = HnswIndex::new(dim, n, 12, 128);
    let mut rng = StdRng::seed_from_u64(123);
    let normal = Normal::new(0.0f32, 1.0).unwrap();

    let mut corpus: Vec<Vec<f32>> = Vec::with_capacity(n);
    for i in 0..n {
        let v: Vec<f32> = (0..dim).map(|_| normal.sample(&mut rng)).collect();
        corpus.push(v.clone());
        index.add(u32::try_from(i).unwrap(), v).unwrap();
    }

    // Query with stored points: the point itself must come back first.
    let mut exact_hits = 0;
    for (i, q) in corpus.iter().enumerate().step_by(10) {
        let results = index.search(q, 1, 64).unwrap();
        if results.first().map(|r| r.0) == Some(u32::try_from(i).unwrap()) {
            exact_hits += 1;
        }
    }
    // 30 probes; HNSW recall on this scale should be near-perfect.
    assert!(exact_hits >= 28, "self-recall too low: {exact_hits}/30");
}
