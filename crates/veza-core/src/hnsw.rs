//! Builder-side HNSW index.
//!
//! Insert-only index used by the offline builder: it holds vectors and the
//! full layered graph in memory, and exposes the accessor surface the
//! exporter walks (internal indices, per-element levels, per-level
//! neighbor lists, internal→label translation). Search nodes never touch
//! this type; they load the exported adjacency file instead.
//!
//! The construction algorithm follows Malkov & Yashunin: exponential
//! layer draw with multiplier `1/ln(M)`, greedy descent through layers
//! above the node's, an `ef_construction` beam at and below it, heuristic
//! neighbor selection, and bidirectional edge repair with pruning at
//! `M` (`M0 = 2M` on layer 0).

use crate::distance::{l2_sq, l2_sq_unchecked};
use crate::error::{Error, Result};
use crate::graph::Label;
use crate::ordered_float::OrderedFloat;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Hard cap on the layer draw; layers beyond this carry no routing value.
const MAX_LAYER: usize = 15;

/// A single layer: adjacency lists by internal index.
#[derive(Debug, Default)]
struct Layer {
    neighbors: Vec<Vec<usize>>,
}

impl Layer {
    fn ensure_capacity(&mut self, node: usize) {
        if self.neighbors.len() <= node {
            self.neighbors.resize_with(node + 1, Vec::new);
        }
    }

    fn get(&self, node: usize) -> &[usize] {
        self.neighbors.get(node).map_or(&[], Vec::as_slice)
    }

    fn set(&mut self, node: usize, list: Vec<usize>) {
        self.ensure_capacity(node);
        self.neighbors[node] = list;
    }
}

/// In-memory HNSW index for offline construction.
pub struct HnswIndex {
    dim: usize,
    m: usize,
    m0: usize,
    ef_construction: usize,
    level_mult: f64,
    rng_state: u64,
    vectors: Vec<Vec<f32>>,
    labels: Vec<Label>,
    label_to_internal: FxHashMap<Label, usize>,
    /// Topmost layer each element participates in.
    levels: Vec<usize>,
    layers: Vec<Layer>,
    entry: Option<usize>,
    max_level: usize,
}

impl HnswIndex {
    /// Creates an empty index.
    ///
    /// # Arguments
    ///
    /// * `dim` - vector dimension, enforced on every insert
    /// * `capacity` - expected element count (pre-allocation hint)
    /// * `m` - max connections per node on layers ≥ 1 (layer 0 gets 2M)
    /// * `ef_construction` - construction-time beam width
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(dim: usize, capacity: usize, m: usize, ef_construction: usize) -> Self {
        let m = m.max(2);
        let level_mult = 1.0 / (m as f64).ln();
        Self {
            dim,
            m,
            m0: m * 2,
            ef_construction: ef_construction.max(1),
            level_mult,
            rng_state: 0x5DEE_CE66_D1A4_B5B5,
            vectors: Vec::with_capacity(capacity),
            labels: Vec::with_capacity(capacity),
            label_to_internal: FxHashMap::default(),
            levels: Vec::with_capacity(capacity),
            layers: vec![Layer::default()],
            entry: None,
            max_level: 0,
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns true if no elements have been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Highest occupied layer.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Internal index of the entry node, if any element was inserted.
    #[must_use]
    pub fn entry_internal(&self) -> Option<usize> {
        self.entry
    }

    /// Topmost layer of element `internal`.
    #[must_use]
    pub fn element_level(&self, internal: usize) -> usize {
        self.levels[internal]
    }

    /// External label of element `internal`.
    #[must_use]
    pub fn external_label(&self, internal: usize) -> Label {
        self.labels[internal]
    }

    /// Neighbor internal indices of `internal` at `level`.
    #[must_use]
    pub fn neighbors_at(&self, internal: usize, level: usize) -> &[usize] {
        self.layers.get(level).map_or(&[], |l| l.get(internal))
    }

    /// Inserts a vector under `label`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] for a wrong-sized vector and
    /// [`Error::Index`] for a duplicate label (the adjacency format has
    /// no notion of replacement).
    pub fn add(&mut self, label: Label, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if self.label_to_internal.contains_key(&label) {
            return Err(Error::Index(format!("label {label} already inserted")));
        }

        let internal = self.vectors.len();
        self.vectors.push(vector);
        self.labels.push(label);
        self.label_to_internal.insert(label, internal);

        let node_level = self.random_level();
        self.levels.push(node_level);

        while self.layers.len() <= node_level {
            self.layers.push(Layer::default());
        }
        for layer in &mut self.layers {
            layer.ensure_capacity(internal);
        }

        let Some(ep) = self.entry else {
            // First element seeds the graph.
            self.entry = Some(internal);
            self.max_level = node_level;
            return Ok(());
        };

        let query = self.vectors[internal].clone();
        let mut current = ep;
        if node_level < self.max_level {
            for level in (node_level + 1..=self.max_level).rev() {
                current = self.greedy_step(&query, current, level);
            }
        }

        for level in (0..=node_level.min(self.max_level)).rev() {
            let candidates = self.beam_search(&query, current, self.ef_construction, level);
            let max_conn = if level == 0 { self.m0 } else { self.m };
            let selected = self.select_neighbors(&query, &candidates, max_conn);

            self.layers[level].set(internal, selected.clone());
            for &neighbor in &selected {
                self.connect_back(neighbor, internal, level, max_conn);
            }

            if let Some(&(best, _)) = candidates.first() {
                current = best;
            }
        }

        if node_level > self.max_level {
            self.max_level = node_level;
            self.entry = Some(internal);
        }
        Ok(())
    }

    /// Top-k search against the in-memory index.
    ///
    /// Used by the builder's sanity checks and the exporter round-trip
    /// tests; production queries run against the exported file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] for a wrong-sized query.
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<(Label, f32)>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        let Some(ep) = self.entry else {
            return Ok(Vec::new());
        };

        let mut current = ep;
        for level in (1..=self.max_level).rev() {
            current = self.greedy_step(query, current, level);
        }

        let found = self.beam_search(query, current, ef.max(k), 0);
        Ok(found
            .into_iter()
            .take(k)
            .map(|(internal, dist)| (self.labels[internal], dist))
            .collect())
    }

    fn random_level(&mut self) -> usize {
        // xorshift64; deterministic across runs for a given insert order.
        let mut state = self.rng_state;
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        self.rng_state = state;

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let level = {
            let uniform = (state as f64) / (u64::MAX as f64);
            (-uniform.max(f64::MIN_POSITIVE).ln() * self.level_mult).floor() as usize
        };
        level.min(MAX_LAYER)
    }

    /// One greedy walk at `level`: ends on the local minimum.
    fn greedy_step(&self, query: &[f32], entry: usize, level: usize) -> usize {
        let mut best = entry;
        let mut best_dist = l2_sq_unchecked(query, &self.vectors[best]);

        loop {
            let mut improved = false;
            for &neighbor in self.layers[level].get(best) {
                let dist = l2_sq_unchecked(query, &self.vectors[neighbor]);
                if dist < best_dist {
                    best = neighbor;
                    best_dist = dist;
                    improved = true;
                }
            }
            if !improved {
                return best;
            }
        }
    }

    /// Best-first search with beam width `ef`; returns candidates sorted
    /// ascending by distance.
    fn beam_search(
        &self,
        query: &[f32],
        entry: usize,
        ef: usize,
        level: usize,
    ) -> Vec<(usize, f32)> {
        let mut visited: FxHashSet<usize> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, usize)>> = BinaryHeap::new();
        let mut results: BinaryHeap<(OrderedFloat, usize)> = BinaryHeap::new();

        let entry_dist = l2_sq_unchecked(query, &self.vectors[entry]);
        candidates.push(Reverse((OrderedFloat(entry_dist), entry)));
        results.push((OrderedFloat(entry_dist), entry));
        visited.insert(entry);

        while let Some(Reverse((OrderedFloat(dist), node))) = candidates.pop() {
            let worst = results.peek().map_or(f32::MAX, |r| r.0 .0);
            if dist > worst && results.len() >= ef {
                break;
            }

            for &neighbor in self.layers[level].get(node) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let d = l2_sq_unchecked(query, &self.vectors[neighbor]);
                let worst = results.peek().map_or(f32::MAX, |r| r.0 .0);
                if results.len() < ef || d < worst {
                    candidates.push(Reverse((OrderedFloat(d), neighbor)));
                    results.push((OrderedFloat(d), neighbor));
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut out: Vec<(usize, f32)> = results
            .into_iter()
            .map(|(OrderedFloat(d), n)| (n, d))
            .collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1));
        out
    }

    /// Heuristic neighbor selection: keep a candidate only if it is closer
    /// to the query than to every neighbor already kept, then fill the
    /// quota with the nearest rejects.
    fn select_neighbors(
        &self,
        _query: &[f32],
        candidates: &[(usize, f32)],
        max_neighbors: usize,
    ) -> Vec<usize> {
        if candidates.len() <= max_neighbors {
            return candidates.iter().map(|&(n, _)| n).collect();
        }

        let mut selected: Vec<usize> = Vec::with_capacity(max_neighbors);
        for &(candidate, candidate_dist) in candidates {
            if selected.len() >= max_neighbors {
                break;
            }
            let diverse = selected.iter().all(|&s| {
                candidate_dist <= l2_sq_unchecked(&self.vectors[candidate], &self.vectors[s])
            });
            if diverse || selected.is_empty() {
                selected.push(candidate);
            }
        }

        if selected.len() < max_neighbors {
            for &(candidate, _) in candidates {
                if selected.len() >= max_neighbors {
                    break;
                }
                if !selected.contains(&candidate) {
                    selected.push(candidate);
                }
            }
        }
        selected
    }

    /// Adds the reverse edge `neighbor → new_node`, pruning by distance if
    /// the neighbor is over its connection budget.
    fn connect_back(&mut self, neighbor: usize, new_node: usize, level: usize, max_conn: usize) {
        let current = self.layers[level].get(neighbor).to_vec();

        if current.len() < max_conn {
            let mut list = current;
            list.push(new_node);
            self.layers[level].set(neighbor, list);
            return;
        }

        let anchor = &self.vectors[neighbor];
        let mut with_dist: Vec<(usize, f32)> = current
            .iter()
            .chain(std::iter::once(&new_node))
            .map(|&n| (n, l2_sq_unchecked(anchor, &self.vectors[n])))
            .collect();
        with_dist.sort_by(|a, b| a.1.total_cmp(&b.1));

        let pruned: Vec<usize> = with_dist.into_iter().take(max_conn).map(|(n, _)| n).collect();
        self.layers[level].set(neighbor, pruned);
    }

    /// Used by the exporter round-trip tests to compare against the file.
    #[must_use]
    pub fn vector(&self, internal: usize) -> &[f32] {
        &self.vectors[internal]
    }

    /// Squared distance between a query and a stored element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] for a wrong-sized query.
    pub fn distance_to(&self, query: &[f32], internal: usize) -> Result<f32> {
        l2_sq(query, &self.vectors[internal])
    }
}
