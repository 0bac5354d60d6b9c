//! Hierarchical HNSW search over remote vector storage.
//!
//! The engine owns the loaded topology and a [`VectorSource`]; it never
//! holds vector payloads beyond its caches. A query runs sequentially on
//! one worker: greedy descent through the upper layers, then a best-first
//! beam search on layer 0 (Malkov & Yashunin), with every distance
//! evaluation backed by a fetch that is hidden by two cache tiers.
//!
//! # Caching discipline
//!
//! - a per-query scratch map, so one query never fetches a label twice
//!   (failed fetches are remembered too, so retries are not repeated);
//! - a shared bounded LRU across queries, `Arc`-valued so hits are
//!   pointer copies.

use crate::cache::LruCache;
use crate::client::StorageClient;
use crate::distance::l2_sq;
use crate::error::{Error, Result};
use crate::fetch::{FetchError, VectorSource};
use crate::graph::{GraphStore, Label};
use crate::ordered_float::OrderedFloat;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use tracing::debug;

/// Default capacity of the cross-query vector cache.
const VECTOR_CACHE_CAPACITY: usize = 100_000;

/// Per-query fetch memory: resolved vectors and labels that already
/// failed, so a label costs at most one fetch attempt per query.
struct QueryScratch {
    resolved: FxHashMap<Label, Arc<[f32]>>,
    failed: FxHashMap<Label, FetchError>,
}

impl QueryScratch {
    fn new() -> Self {
        Self {
            resolved: FxHashMap::default(),
            failed: FxHashMap::default(),
        }
    }
}

/// HNSW search engine over a loaded graph and a vector source.
pub struct SearchEngine<S: VectorSource> {
    graph: GraphStore,
    source: S,
    dim: usize,
    vector_cache: LruCache<Label, Arc<[f32]>>,
}

impl<S: VectorSource> SearchEngine<S> {
    /// Creates an engine with the default vector-cache capacity.
    #[must_use]
    pub fn new(graph: GraphStore, source: S, dim: usize) -> Self {
        Self::with_cache_capacity(graph, source, dim, VECTOR_CACHE_CAPACITY)
    }

    /// Creates an engine with an explicit vector-cache capacity
    /// (0 disables cross-query caching).
    #[must_use]
    pub fn with_cache_capacity(
        graph: GraphStore,
        source: S,
        dim: usize,
        cache_capacity: usize,
    ) -> Self {
        Self {
            graph,
            source,
            dim,
            vector_cache: LruCache::new(cache_capacity),
        }
    }

    /// The loaded topology.
    #[must_use]
    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    /// Deployment-wide vector dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Hit/miss/eviction counters of the cross-query vector cache.
    #[must_use]
    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.vector_cache.stats()
    }

    /// Top-k search: returns up to `k` `(label, squared distance)` pairs,
    /// sorted ascending by distance.
    ///
    /// `entry` overrides the graph's entrypoint; pass `None` for the
    /// default. Nodes whose vectors cannot be fetched are skipped, which
    /// at most biases recall.
    ///
    /// # Errors
    ///
    /// - [`Error::DimensionMismatch`] if the query (or any fetched
    ///   payload) disagrees with the deployment dimension.
    /// - [`Error::UnknownLabel`] if the entry label is not in the graph.
    /// - [`Error::StorageUnreachable`] / [`Error::Storage`] if the
    ///   base-layer entry vector cannot be fetched for transport reasons;
    ///   a merely missing entry vector yields an empty result instead.
    pub fn search(
        &self,
        query: &[f32],
        ef: usize,
        k: usize,
        entry: Option<Label>,
    ) -> Result<Vec<(Label, f32)>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let entry = entry.unwrap_or_else(|| self.graph.entrypoint());
        if !self.graph.contains(entry) {
            return Err(Error::UnknownLabel(entry));
        }

        let mut scratch = QueryScratch::new();
        let mut current = entry;
        for level in (1..=self.graph.max_level()).rev() {
            current = self.descend(&mut scratch, query, current, level)?;
        }

        self.search_base(&mut scratch, query, current, ef, k)
    }

    /// Greedy walk at `level`: move to the first strictly closer neighbor
    /// until none improves. Unfetchable neighbors are skipped; an
    /// unfetchable entry ends the walk at the entry itself.
    fn descend(
        &self,
        scratch: &mut QueryScratch,
        query: &[f32],
        entry: Label,
        level: usize,
    ) -> Result<Label> {
        let Ok(entry_vec) = self.fetch(scratch, entry) else {
            debug!(entry, level, "entry vector unfetchable, keeping entry");
            return Ok(entry);
        };
        let mut current = entry;
        let mut current_dist = l2_sq(query, &entry_vec)?;

        loop {
            let mut improved = false;
            for neighbor in self.graph.neighbors(current, level) {
                let Ok(vec) = self.fetch(scratch, neighbor) else {
                    continue;
                };
                let dist = l2_sq(query, &vec)?;
                if dist < current_dist {
                    current = neighbor;
                    current_dist = dist;
                    improved = true;
                    break;
                }
            }
            if !improved {
                return Ok(current);
            }
        }
    }

    /// Best-first beam search at layer 0.
    ///
    /// Candidates are a min-heap (expansion frontier), results a max-heap
    /// bounded to `ef`. The early stop (closest candidate worse than the
    /// worst kept result once `ef` results are held) is what keeps the
    /// search within HNSW's complexity bound; without the saturation
    /// check it would terminate before the beam is full.
    fn search_base(
        &self,
        scratch: &mut QueryScratch,
        query: &[f32],
        entry: Label,
        ef: usize,
        k: usize,
    ) -> Result<Vec<(Label, f32)>> {
        let entry_vec = match self.fetch(scratch, entry) {
            Ok(v) => v,
            // A missing entry vector is an empty (but successful) query.
            Err(FetchError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let entry_dist = l2_sq(query, &entry_vec)?;

        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, Label)>> = BinaryHeap::new();
        let mut results: BinaryHeap<(OrderedFloat, Label)> = BinaryHeap::new();
        let mut visited: FxHashSet<Label> = FxHashSet::default();

        candidates.push(Reverse((OrderedFloat(entry_dist), entry)));
        results.push((OrderedFloat(entry_dist), entry));
        visited.insert(entry);

        while let Some(Reverse((OrderedFloat(dist), node))) = candidates.pop() {
            let worst = results.peek().map_or(f32::MAX, |r| r.0 .0);
            if dist > worst && results.len() >= ef {
                break;
            }

            for neighbor in self.graph.neighbors(node, 0) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let Ok(vec) = self.fetch(scratch, neighbor) else {
                    continue;
                };
                let neighbor_dist = l2_sq(query, &vec)?;

                let worst = results.peek().map_or(f32::MAX, |r| r.0 .0);
                if results.len() < ef || neighbor_dist < worst {
                    candidates.push(Reverse((OrderedFloat(neighbor_dist), neighbor)));
                    results.push((OrderedFloat(neighbor_dist), neighbor));
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut out: Vec<(Label, f32)> = results
            .into_iter()
            .map(|(OrderedFloat(d), label)| (label, d))
            .collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        out.truncate(k);
        Ok(out)
    }

    /// Scratch → shared LRU → remote, in that order. Successful fetches
    /// populate both tiers; failures are remembered for this query only.
    fn fetch(
        &self,
        scratch: &mut QueryScratch,
        label: Label,
    ) -> std::result::Result<Arc<[f32]>, FetchError> {
        if let Some(v) = scratch.resolved.get(&label) {
            return Ok(Arc::clone(v));
        }
        if let Some(err) = scratch.failed.get(&label) {
            return Err(err.clone());
        }
        if let Some(v) = self.vector_cache.get(&label) {
            scratch.resolved.insert(label, Arc::clone(&v));
            return Ok(v);
        }

        match self.source.fetch(label) {
            Ok(v) => {
                self.vector_cache.insert(label, Arc::clone(&v));
                scratch.resolved.insert(label, Arc::clone(&v));
                Ok(v)
            }
            Err(e) => {
                scratch.failed.insert(label, e.clone());
                Err(e)
            }
        }
    }
}

impl SearchEngine<StorageClient> {
    /// Primes the vector cache with the entry vector and its layer-0
    /// neighborhood in a single batch round trip, so the first queries
    /// after startup do not pay one RTT per distance evaluation.
    ///
    /// Returns the number of vectors cached.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from the batch fetch; callers treat a
    /// failed warm-up as advisory (the storage service may simply not be
    /// up yet).
    pub fn warm_up(&self) -> Result<usize> {
        let entry = self.graph.entrypoint();
        let mut labels = vec![entry];
        labels.extend(self.graph.neighbors(entry, 0));

        let fetched = self.source.batch_fetch(&labels)?;
        let mut cached = 0;
        for (label, vector) in labels.iter().zip(fetched) {
            if let Some(v) = vector {
                self.vector_cache.insert(*label, Arc::from(v));
                cached += 1;
            }
        }
        debug!(cached, "vector cache warmed");
        Ok(cached)
    }
}
