//! Export pipeline: flattens a built [`HnswIndex`] into the adjacency file.
//!
//! Neighbor fields in the produced file are external labels; the internal
//! indices of the in-memory index never leave this function. The file is
//! kept syntactically valid in the face of producer-side damage: an
//! out-of-range internal reference is written as label 0, an absurd degree
//! as 0. Both are logged; both indicate memory-layout drift in the index,
//! not a bug in the reader.

use crate::error::{Error, Result};
use crate::graph::{write_u32_le, GraphHeader, MAX_REASONABLE_DEGREE};
use crate::hnsw::HnswIndex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// Writes the adjacency file for `index` at `path`.
///
/// # Errors
///
/// Returns [`Error::Index`] for an empty index and [`Error::Io`] if the
/// file cannot be created or written.
#[allow(clippy::cast_possible_truncation)]
pub fn export_adjacency<P: AsRef<Path>>(index: &HnswIndex, path: P) -> Result<()> {
    let path = path.as_ref();
    let count = index.len();
    if count == 0 {
        return Err(Error::Index("cannot export an empty index".to_string()));
    }

    let entrypoint = index
        .entry_internal()
        .map_or(0, |i| index.external_label(i));
    let header = GraphHeader {
        entrypoint,
        max_level: index.max_level(),
        node_count: count as u32,
    };

    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    header.write_to(&mut out)?;

    for internal in 0..count {
        write_u32_le(&mut out, index.external_label(internal))?;

        let level = index.element_level(internal);
        write_u32_le(&mut out, level as u32 + 1)?;

        for l in 0..=level {
            let neighbors = index.neighbors_at(internal, l);

            if neighbors.len() > MAX_REASONABLE_DEGREE as usize {
                warn!(
                    internal,
                    level = l,
                    degree = neighbors.len(),
                    "unreasonable degree, writing empty list"
                );
                write_u32_le(&mut out, 0)?;
                continue;
            }

            write_u32_le(&mut out, neighbors.len() as u32)?;
            for &nb in neighbors {
                if nb >= count {
                    warn!(
                        internal,
                        level = l,
                        neighbor = nb,
                        "neighbor out of range, writing label 0"
                    );
                    write_u32_le(&mut out, 0)?;
                } else {
                    write_u32_le(&mut out, index.external_label(nb))?;
                }
            }
        }
    }

    out.flush()?;

    info!(
        nodes = count,
        entry = entrypoint,
        max_level = index.max_level(),
        "adjacency exported to {}",
        path.display()
    );
    Ok(())
}
