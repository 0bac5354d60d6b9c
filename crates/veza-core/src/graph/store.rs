//! Graph loaders and the unified neighbor-lookup surface.
//!
//! [`GraphStore`] is a tagged variant over the two load strategies so mode
//! checks live here and nowhere in the query code. Both variants are
//! immutable after load and safe to share across workers: the lazy variant
//! reads the file with positional I/O (no seek+read races on the shared
//! handle) and its list cache is internally synchronized.

use super::format::{
    read_u32_le, GraphHeader, Label, HEADER_BYTES, MAX_REASONABLE_DEGREE,
};
use crate::cache::LruCache;
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Default capacity of the lazy-mode neighbor-list LRU.
const NEIGHBOR_CACHE_CAPACITY: usize = 10_000;

/// How the adjacency file is held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Materialize every neighbor list at load time.
    Resident,
    /// Keep offset tables only; read lists from the file on demand.
    Lazy,
}

/// Location of one neighbor list inside the adjacency file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeOffset {
    /// Byte offset of the first neighbor label (past the degree field).
    pub offset: u64,
    /// Number of neighbor labels at that offset.
    pub degree: u32,
}

/// Fully materialized graph.
#[derive(Debug)]
pub struct ResidentGraph {
    pub(crate) header: GraphHeader,
    pub(crate) id_to_index: FxHashMap<Label, usize>,
    /// Layer-0 adjacency, dense by internal index.
    pub(crate) adjacency: Vec<Vec<Label>>,
    /// Layers 1..=max_level, sparse by label. `upper[0]` is level 1.
    pub(crate) upper: Vec<FxHashMap<Label, Vec<Label>>>,
}

/// Offset-indexed graph with on-demand list reads.
#[derive(Debug)]
pub struct LazyGraph {
    pub(crate) header: GraphHeader,
    pub(crate) id_to_index: FxHashMap<Label, usize>,
    /// `level_offsets[l]` maps labels present at level `l` to their list.
    pub(crate) level_offsets: Vec<FxHashMap<Label, NodeOffset>>,
    file: File,
    lists: LruCache<(Label, u32), Arc<Vec<Label>>>,
}

/// A loaded graph in either mode.
#[derive(Debug)]
pub enum GraphStore {
    /// Everything in memory.
    Resident(ResidentGraph),
    /// Offsets in memory, lists on disk.
    Lazy(LazyGraph),
}

impl GraphStore {
    /// Loads an adjacency file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphCorrupted`] if the file fails any structural
    /// check (short read, impossible degree or level count, duplicate or
    /// unresolvable label) and [`Error::Io`] if it cannot be opened. A
    /// service that receives an error here must refuse to serve.
    pub fn load<P: AsRef<Path>>(path: P, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let header = GraphHeader::read_from(&mut reader)?;

        info!(
            nodes = header.node_count,
            entry = header.entrypoint,
            max_level = header.max_level,
            ?mode,
            "loading graph {}",
            path.display()
        );

        let store = match mode {
            LoadMode::Resident => Self::Resident(load_resident(&mut reader, header)?),
            LoadMode::Lazy => Self::Lazy(load_lazy(reader, header)?),
        };

        info!(
            nodes = store.len(),
            entry = store.entrypoint(),
            max_level = store.max_level(),
            "graph loaded"
        );
        Ok(store)
    }

    /// Neighbor labels of `label` at `level`. Unknown labels, levels above
    /// the graph, and unreadable lazy lists all yield an empty list.
    #[must_use]
    pub fn neighbors(&self, label: Label, level: usize) -> Vec<Label> {
        match self {
            Self::Resident(g) => g.neighbors(label, level),
            Self::Lazy(g) => g.neighbors(label, level),
        }
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.header().node_count as usize
    }

    /// Returns true if the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label of the top entry node.
    #[must_use]
    pub fn entrypoint(&self) -> Label {
        self.header().entrypoint
    }

    /// Highest layer present.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.header().max_level
    }

    /// Returns true if `label` names a node of this graph.
    #[must_use]
    pub fn contains(&self, label: Label) -> bool {
        match self {
            Self::Resident(g) => g.id_to_index.contains_key(&label),
            Self::Lazy(g) => g.id_to_index.contains_key(&label),
        }
    }

    /// The mode this graph was loaded in.
    #[must_use]
    pub fn mode(&self) -> LoadMode {
        match self {
            Self::Resident(_) => LoadMode::Resident,
            Self::Lazy(_) => LoadMode::Lazy,
        }
    }

    fn header(&self) -> &GraphHeader {
        match self {
            Self::Resident(g) => &g.header,
            Self::Lazy(g) => &g.header,
        }
    }
}

impl ResidentGraph {
    fn neighbors(&self, label: Label, level: usize) -> Vec<Label> {
        if level == 0 {
            return self
                .id_to_index
                .get(&label)
                .map(|&i| self.adjacency[i].clone())
                .unwrap_or_default();
        }
        self.upper
            .get(level - 1)
            .and_then(|m| m.get(&label))
            .cloned()
            .unwrap_or_default()
    }
}

impl LazyGraph {
    fn neighbors(&self, label: Label, level: usize) -> Vec<Label> {
        let Some(info) = self.level_offsets.get(level).and_then(|m| m.get(&label)) else {
            return Vec::new();
        };
        if info.degree == 0 {
            return Vec::new();
        }

        #[allow(clippy::cast_possible_truncation)]
        let key = (label, level as u32);
        if let Some(hit) = self.lists.get(&key) {
            return hit.as_ref().clone();
        }

        let mut buf = vec![0u8; info.degree as usize * 4];
        if let Err(e) = read_at(&self.file, &mut buf, info.offset) {
            // Non-fatal for the query: this node contributes nothing.
            warn!(label, level, offset = info.offset, "neighbor list unreadable: {e}");
            return Vec::new();
        }

        let list: Vec<Label> = buf
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        self.lists.insert(key, Arc::new(list.clone()));
        list
    }
}

/// Checks the fields shared by both loaders for one node record.
#[allow(clippy::cast_possible_truncation)]
fn check_record(header: &GraphHeader, index: u32, label: Label, levels: u32) -> Result<()> {
    if levels == 0 {
        return Err(Error::GraphCorrupted(format!(
            "node {label} (record {index}) participates in zero levels"
        )));
    }
    if levels > header.max_level as u32 + 1 {
        return Err(Error::GraphCorrupted(format!(
            "node {label} claims {levels} levels but max_level is {}",
            header.max_level
        )));
    }
    Ok(())
}

fn check_degree(header: &GraphHeader, label: Label, level: u32, degree: u32) -> Result<()> {
    let cap = MAX_REASONABLE_DEGREE.min(header.node_count);
    if degree > cap {
        return Err(Error::GraphCorrupted(format!(
            "node {label} level {level} claims degree {degree} (limit {cap})"
        )));
    }
    Ok(())
}

fn corrupt_read(what: &str, label: Label, err: &std::io::Error) -> Error {
    Error::GraphCorrupted(format!("short read of {what} for node {label}: {err}"))
}

fn load_resident(reader: &mut BufReader<File>, header: GraphHeader) -> Result<ResidentGraph> {
    let node_count = header.node_count as usize;
    let mut id_to_index: FxHashMap<Label, usize> = FxHashMap::default();
    id_to_index.reserve(node_count);
    let mut adjacency: Vec<Vec<Label>> = vec![Vec::new(); node_count];
    let mut upper: Vec<FxHashMap<Label, Vec<Label>>> =
        vec![FxHashMap::default(); header.max_level];

    for i in 0..header.node_count {
        let label = read_u32_le(reader).map_err(|e| corrupt_read("label", i, &e))?;
        let levels = read_u32_le(reader).map_err(|e| corrupt_read("levels", label, &e))?;
        check_record(&header, i, label, levels)?;

        if id_to_index.insert(label, i as usize).is_some() {
            return Err(Error::GraphCorrupted(format!("duplicate label {label}")));
        }

        for level in 0..levels {
            let degree =
                read_u32_le(reader).map_err(|e| corrupt_read("degree", label, &e))?;
            check_degree(&header, label, level, degree)?;

            let mut list = Vec::with_capacity(degree as usize);
            for _ in 0..degree {
                list.push(
                    read_u32_le(reader).map_err(|e| corrupt_read("neighbor", label, &e))?,
                );
            }

            if level == 0 {
                adjacency[i as usize] = list;
            } else {
                upper[level as usize - 1].insert(label, list);
            }
        }

        if (i + 1) % 10_000 == 0 {
            info!("loaded {}/{} nodes", i + 1, header.node_count);
        }
    }

    validate_closure(&header, &id_to_index, &adjacency, &upper)?;

    Ok(ResidentGraph {
        header,
        id_to_index,
        adjacency,
        upper,
    })
}

fn load_lazy(mut reader: BufReader<File>, header: GraphHeader) -> Result<LazyGraph> {
    let node_count = header.node_count as usize;
    let mut id_to_index: FxHashMap<Label, usize> = FxHashMap::default();
    id_to_index.reserve(node_count);
    let mut level_offsets: Vec<FxHashMap<Label, NodeOffset>> =
        vec![FxHashMap::default(); header.max_level + 1];
    let mut pos: u64 = HEADER_BYTES;

    for i in 0..header.node_count {
        let label = read_u32_le(&mut reader).map_err(|e| corrupt_read("label", i, &e))?;
        let levels =
            read_u32_le(&mut reader).map_err(|e| corrupt_read("levels", label, &e))?;
        pos += 8;
        check_record(&header, i, label, levels)?;

        if id_to_index.insert(label, i as usize).is_some() {
            return Err(Error::GraphCorrupted(format!("duplicate label {label}")));
        }

        for level in 0..levels {
            let degree =
                read_u32_le(&mut reader).map_err(|e| corrupt_read("degree", label, &e))?;
            pos += 4;
            check_degree(&header, label, level, degree)?;

            level_offsets[level as usize].insert(
                label,
                NodeOffset {
                    offset: pos,
                    degree,
                },
            );

            let skip = u64::from(degree) * 4;
            reader
                .seek_relative(i64::try_from(skip).expect("degree bounded above"))
                .map_err(|e| corrupt_read("neighbor list", label, &e))?;
            pos += skip;
        }

        if (i + 1) % 10_000 == 0 {
            info!("indexed {}/{} nodes", i + 1, header.node_count);
        }
    }

    // The skip-based walk cannot see neighbor labels, so closure is only
    // checked on the entrypoint here; resident loads check every edge.
    if !id_to_index.contains_key(&header.entrypoint) {
        return Err(Error::GraphCorrupted(format!(
            "entrypoint {} does not resolve to any node",
            header.entrypoint
        )));
    }

    Ok(LazyGraph {
        header,
        id_to_index,
        level_offsets,
        file: reader.into_inner(),
        lists: LruCache::new(NEIGHBOR_CACHE_CAPACITY),
    })
}

/// Post-load validation pass: the entrypoint and every neighbor label must
/// resolve via `id_to_index`.
fn validate_closure(
    header: &GraphHeader,
    id_to_index: &FxHashMap<Label, usize>,
    adjacency: &[Vec<Label>],
    upper: &[FxHashMap<Label, Vec<Label>>],
) -> Result<()> {
    if !id_to_index.contains_key(&header.entrypoint) {
        return Err(Error::GraphCorrupted(format!(
            "entrypoint {} does not resolve to any node",
            header.entrypoint
        )));
    }

    let check = |neighbor: Label| -> Result<()> {
        if id_to_index.contains_key(&neighbor) {
            Ok(())
        } else {
            Err(Error::GraphCorrupted(format!(
                "neighbor label {neighbor} does not resolve to any node"
            )))
        }
    };

    for list in adjacency {
        for &n in list {
            check(n)?;
        }
    }
    for level in upper {
        for list in level.values() {
            for &n in list {
                check(n)?;
            }
        }
    }
    Ok(())
}

/// Positional read: never moves a shared cursor, so concurrent lazy-mode
/// lookups need no external synchronization.
#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut read = 0usize;
    while read < buf.len() {
        let n = file.seek_read(&mut buf[read..], offset + read as u64)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "neighbor list extends past end of file",
            ));
        }
        read += n;
    }
    Ok(())
}
