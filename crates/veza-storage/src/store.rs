//! Memory-mapped vector store.
//!
//! An append-only data file holds `[len][label][payload]` records; an
//! in-memory index maps labels to payload slots. The index is persisted as
//! a sidecar file on flush and rebuilt by scanning the log when the
//! sidecar is missing or behind the data file, so a crash between flushes
//! loses no acknowledged write.
//!
//! Overwriting a label appends a fresh record and repoints the index; old
//! records become dead space (this store serves an append-mostly corpus,
//! compaction is not worth its complexity here).

use memmap2::MmapMut;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use veza_core::{Error, Label, Result};

/// Initial size of the data file.
const INITIAL_SIZE: u64 = 4 * 1024 * 1024;

/// Minimum growth step; each resize at least doubles capacity.
const MIN_GROWTH: u64 = 4 * 1024 * 1024;

/// Record header: payload length + label, both u32 LE.
const RECORD_HEADER: usize = 8;

/// Location of one payload inside the data file.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
struct Slot {
    /// Byte offset of the payload (past the record header).
    offset: u64,
    /// Payload length in bytes.
    len: u32,
}

#[derive(Default, serde::Serialize, serde::Deserialize)]
struct StoreIndex {
    slots: FxHashMap<Label, Slot>,
    /// First byte past the last record.
    next_offset: u64,
}

/// Persistent {label → vector} store backed by a memory-mapped log.
pub struct VectorStore {
    path: PathBuf,
    data_file: File,
    mmap: RwLock<MmapMut>,
    index: RwLock<StoreIndex>,
}

impl VectorStore {
    /// Opens or creates a store in directory `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory or files cannot be created
    /// or mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;

        let data_path = path.join("vectors.dat");
        let data_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&data_path)?;

        if data_file.metadata()?.len() == 0 {
            data_file.set_len(INITIAL_SIZE)?;
        }

        // SAFETY: the file is open read/write and set_len above guarantees
        // the mapped range is allocated.
        let mmap = unsafe { MmapMut::map_mut(&data_file)? };

        let mut index = Self::load_index(&path).unwrap_or_default();
        Self::recover_tail(&mmap, &mut index);

        info!(
            vectors = index.slots.len(),
            bytes = index.next_offset,
            "vector store opened at {}",
            path.display()
        );

        Ok(Self {
            path,
            data_file,
            mmap: RwLock::new(mmap),
            index: RwLock::new(index),
        })
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().slots.len()
    }

    /// Returns true if no vectors are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.read().slots.is_empty()
    }

    /// Stores `vector` under `label`, replacing any previous value.
    ///
    /// The write is atomic with respect to readers: the index is only
    /// repointed after the record bytes are fully in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] for an empty vector and [`Error::Io`] if
    /// the data file cannot grow.
    #[allow(clippy::cast_possible_truncation)]
    pub fn put(&self, label: Label, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::Storage("empty vector rejected".to_string()));
        }

        let payload = vector_to_bytes(vector);
        let needed = RECORD_HEADER + payload.len();

        let mut index = self.index.write();
        let offset = index.next_offset as usize;

        let mut mmap = self.mmap.write();
        if offset + needed > mmap.len() {
            self.grow(&mut mmap, (offset + needed) as u64)?;
        }

        mmap[offset..offset + 4].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        mmap[offset + 4..offset + 8].copy_from_slice(&label.to_le_bytes());
        mmap[offset + RECORD_HEADER..offset + needed].copy_from_slice(&payload);
        drop(mmap);

        index.slots.insert(
            label,
            Slot {
                offset: (offset + RECORD_HEADER) as u64,
                len: payload.len() as u32,
            },
        );
        index.next_offset = (offset + needed) as u64;
        Ok(())
    }

    /// Returns the vector stored under `label`, if any.
    #[must_use]
    pub fn get(&self, label: Label) -> Option<Vec<f32>> {
        let slot = *self.index.read().slots.get(&label)?;
        let mmap = self.mmap.read();
        let start = slot.offset as usize;
        let end = start + slot.len as usize;
        if end > mmap.len() {
            warn!(label, "slot points past the mapped region");
            return None;
        }
        Some(bytes_to_vector(&mmap[start..end]))
    }

    /// Positional lookup of several labels; `None` marks misses.
    #[must_use]
    pub fn batch_get(&self, labels: &[Label]) -> Vec<Option<Vec<f32>>> {
        labels.iter().map(|&l| self.get(l)).collect()
    }

    /// Flushes data to disk and persists the index sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on flush failure and [`Error::Serialization`]
    /// if the index cannot be encoded.
    pub fn flush(&self) -> Result<()> {
        self.mmap.read().flush()?;

        let index = self.index.read();
        let tmp = self.path.join("vectors.idx.tmp");
        let file = File::create(&tmp)?;
        bincode::serialize_into(io::BufWriter::new(file), &*index)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        std::fs::rename(&tmp, self.path.join("vectors.idx"))?;
        Ok(())
    }

    fn load_index(path: &Path) -> Option<StoreIndex> {
        let file = File::open(path.join("vectors.idx")).ok()?;
        match bincode::deserialize_from(io::BufReader::new(file)) {
            Ok(index) => Some(index),
            Err(e) => {
                warn!("index sidecar unreadable, rebuilding from log: {e}");
                None
            }
        }
    }

    /// Replays records past `index.next_offset` (writes that landed after
    /// the last persisted sidecar). A zero length header marks the end of
    /// the log; a header pointing past the map is a torn write and stops
    /// the scan.
    #[allow(clippy::cast_possible_truncation)]
    fn recover_tail(mmap: &MmapMut, index: &mut StoreIndex) {
        let mut offset = index.next_offset as usize;
        let mut recovered = 0u64;

        while offset + RECORD_HEADER <= mmap.len() {
            let len = u32::from_le_bytes(mmap[offset..offset + 4].try_into().unwrap()) as usize;
            if len == 0 || len % 4 != 0 || offset + RECORD_HEADER + len > mmap.len() {
                break;
            }
            let label =
                u32::from_le_bytes(mmap[offset + 4..offset + 8].try_into().unwrap());
            index.slots.insert(
                label,
                Slot {
                    offset: (offset + RECORD_HEADER) as u64,
                    len: len as u32,
                },
            );
            offset += RECORD_HEADER + len;
            recovered += 1;
        }

        index.next_offset = offset as u64;
        if recovered > 0 {
            info!(records = recovered, "recovered unindexed records from log");
        }
    }

    fn grow(&self, mmap: &mut MmapMut, required: u64) -> Result<()> {
        let current = mmap.len() as u64;
        let new_len = (current * 2).max(current + MIN_GROWTH).max(required);

        mmap.flush()?;
        self.data_file.set_len(new_len)?;
        // SAFETY: same file, freshly extended; the old map is replaced
        // under the write lock so no reader observes the swap.
        *mmap = unsafe { MmapMut::map_mut(&self.data_file)? };
        info!(from = current, to = new_len, "data file grown");
        Ok(())
    }
}

impl Drop for VectorStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("flush on shutdown failed: {e}");
        }
    }
}

fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for v in vector {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
