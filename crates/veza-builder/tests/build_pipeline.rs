//! End-to-end builder test: run the binary on a small corpus, then check
//! that the store holds the vectors and the exported graph loads cleanly.

use assert_cmd::Command;
use tempfile::TempDir;
use veza_core::{GraphStore, LoadMode};
use veza_storage::VectorStore;

#[test]
fn test_build_pipeline_produces_store_and_graph() {
    let dir = TempDir::new().unwrap();
    let dbpath = dir.path().join("db");
    let graph_out = dir.path().join("graph.bin");

    Command::cargo_bin("veza-builder")
        .unwrap()
        .args([
            "200",
            "8",
            dbpath.to_str().unwrap(),
            graph_out.to_str().unwrap(),
            "8",
            "64",
        ])
        .assert()
        .success();

    // Every label landed in the store, with the right dimension.
    let store = VectorStore::open(&dbpath).unwrap();
    assert_eq!(store.len(), 200);
    for label in [0u32, 1, 99, 199] {
        let v = store.get(label).unwrap();
        assert_eq!(v.len(), 8);
    }

    // The exported file passes both loaders' structural checks.
    for mode in [LoadMode::Resident, LoadMode::Lazy] {
        let graph = GraphStore::load(&graph_out, mode).unwrap();
        assert_eq!(graph.len(), 200);
        assert!(graph.contains(graph.entrypoint()));
    }

    // Rebuilding with the same arguments is reproducible.
    let first = std::fs::read(&graph_out).unwrap();
    Command::cargo_bin("veza-builder")
        .unwrap()
        .args([
            "200",
            "8",
            dir.path().join("db2").to_str().unwrap(),
            dir.path().join("graph2.bin").to_str().unwrap(),
            "8",
            "64",
        ])
        .assert()
        .success();
    let second = std::fs::read(dir.path().join("graph2.bin")).unwrap();
    assert_eq!(first, second);
}
