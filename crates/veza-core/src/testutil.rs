//! Shared fixtures for core tests: handwritten adjacency files.

use crate::graph::Label;
use std::io::Write;
use std::path::Path;

/// Writes an adjacency file from explicit per-node, per-level lists.
///
/// `nodes[i].0` is the label of internal index `i`; `nodes[i].1[l]` the
/// neighbor labels at level `l` (the node participates in exactly
/// `nodes[i].1.len()` levels).
pub fn write_graph(
    path: &Path,
    entrypoint: Label,
    max_level: u32,
    nodes: &[(Label, Vec<Vec<Label>>)],
) {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&entrypoint.to_le_bytes());
    bytes.extend_from_slice(&max_level.to_le_bytes());
    bytes.extend_from_slice(&u32::try_from(nodes.len()).unwrap().to_le_bytes());

    for (label, levels) in nodes {
        bytes.extend_from_slice(&label.to_le_bytes());
        bytes.extend_from_slice(&u32::try_from(levels.len()).unwrap().to_le_bytes());
        for list in levels {
            bytes.extend_from_slice(&u32::try_from(list.len()).unwrap().to_le_bytes());
            for n in list {
                bytes.extend_from_slice(&n.to_le_bytes());
            }
        }
    }

    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(&bytes).unwrap();
}

/// A single-level chain 0↔1, 1↔2 over labels 0,1,2 (entrypoint 0).
pub fn write_chain_graph(path: &Path) {
    write_graph(
        path,
        0,
        0,
        &[
            (0, vec![vec![1]]),
            (1, vec![vec![0, 2]]),
            (2, vec![vec![1]]),
        ],
    );
}
