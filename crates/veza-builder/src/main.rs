#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
//! Veza index builder.
//!
//! Seeds a demo corpus of Gaussian vectors into the storage service's
//! backing store, builds an HNSW graph over it, and exports the adjacency
//! file the search service loads.
//!
//! Usage: `veza-builder [N] [dim] [dbpath] [graph_out] [M] [ef_construction]`

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use veza_core::{export_adjacency, HnswIndex};
use veza_storage::VectorStore;

/// Fixed seed so rebuilt demo corpora are reproducible across machines.
const CORPUS_SEED: u64 = 123;

/// Veza index builder - corpus seeding, HNSW construction, adjacency export
#[derive(Parser, Debug)]
#[command(name = "veza-builder")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of vectors to generate
    #[arg(default_value_t = 100_000)]
    n: usize,

    /// Vector dimension
    #[arg(default_value_t = 128)]
    dim: usize,

    /// Directory of the storage service's backing store
    #[arg(default_value = "./veza_data")]
    dbpath: String,

    /// Output path of the adjacency file
    #[arg(default_value = "./veza_graph.bin")]
    graph_out: String,

    /// Max connections per node on layers >= 1 (layer 0 gets 2M)
    #[arg(default_value_t = 16)]
    m: usize,

    /// Construction-time beam width
    #[arg(default_value_t = 200)]
    ef_construction: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!(
        n = args.n,
        dim = args.dim,
        m = args.m,
        ef_construction = args.ef_construction,
        "building index (db: {}, graph: {})",
        args.dbpath,
        args.graph_out
    );

    let store = VectorStore::open(&args.dbpath)
        .with_context(|| format!("cannot open store at {}", args.dbpath))?;
    let mut index = HnswIndex::new(args.dim, args.n, args.m, args.ef_construction);

    let mut rng = StdRng::seed_from_u64(CORPUS_SEED);
    let normal = Normal::new(0.0f32, 1.0).expect("valid distribution parameters");

    let mut vector = vec![0.0f32; args.dim];
    for i in 0..args.n {
        for v in &mut vector {
            *v = normal.sample(&mut rng);
        }
        let label = i as u32;
        store
            .put(label, &vector)
            .with_context(|| format!("cannot store vector {label}"))?;
        index
            .add(label, vector.clone())
            .with_context(|| format!("cannot index vector {label}"))?;

        if (i + 1) % 10_000 == 0 {
            info!("added {}/{} points", i + 1, args.n);
        }
    }

    store.flush().context("cannot flush store")?;
    export_adjacency(&index, &args.graph_out)
        .with_context(|| format!("cannot export adjacency to {}", args.graph_out))?;

    info!(
        nodes = index.len(),
        max_level = index.max_level(),
        "index built and exported"
    );
    Ok(())
}
