//! Binary layout of the adjacency file.
//!
//! All integers are little-endian u32. The layout is:
//!
//! ```text
//! header:   entrypoint | max_level | node_count
//! per node: label | levels | { degree | degree × neighbor-label }·levels
//! ```
//!
//! Records appear in internal-index order (0..N-1). Neighbor fields hold
//! external labels on both the producer and consumer side. There is no
//! magic number or version byte; the layout is frozen for compatibility
//! with files already in the field.

use crate::error::{Error, Result};
use std::io::{self, Read, Write};

/// External 32-bit identifier of a vector, stable across builds.
pub type Label = u32;

/// Degrees above this are treated as corruption (or memory-layout drift in
/// the producing index, on the export side).
pub const MAX_REASONABLE_DEGREE: u32 = 1_000_000;

/// Upper bound on `node_count` accepted by the loader. A header claiming
/// more nodes than this is corrupt long before allocation would fail.
pub const MAX_NODE_COUNT: u32 = 1 << 30;

/// Size of the fixed header in bytes.
pub(crate) const HEADER_BYTES: u64 = 12;

/// Parsed adjacency file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphHeader {
    /// Label of the graph's top entry node.
    pub entrypoint: Label,
    /// Highest layer present in the graph.
    pub max_level: usize,
    /// Number of node records that follow the header.
    pub node_count: u32,
}

impl GraphHeader {
    /// Reads and validates the header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphCorrupted`] on a short read or an absurd
    /// `node_count`.
    pub(crate) fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let entrypoint = read_u32_le(reader)
            .map_err(|e| Error::GraphCorrupted(format!("unreadable header: {e}")))?;
        let max_level = read_u32_le(reader)
            .map_err(|e| Error::GraphCorrupted(format!("unreadable header: {e}")))?;
        let node_count = read_u32_le(reader)
            .map_err(|e| Error::GraphCorrupted(format!("unreadable header: {e}")))?;

        if node_count > MAX_NODE_COUNT {
            return Err(Error::GraphCorrupted(format!(
                "header claims {node_count} nodes (limit {MAX_NODE_COUNT})"
            )));
        }

        Ok(Self {
            entrypoint,
            max_level: max_level as usize,
            node_count,
        })
    }

    /// Writes the header.
    ///
    /// # Errors
    ///
    /// Propagates IO errors from the writer.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_u32_le(writer, self.entrypoint)?;
        write_u32_le(writer, self.max_level as u32)?;
        write_u32_le(writer, self.node_count)
    }
}

/// Reads one little-endian u32.
pub(crate) fn read_u32_le<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Writes one little-endian u32.
pub(crate) fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}
