#![allow(clippy::doc_markdown)]
//! Veza search service binary.
//!
//! Loads the adjacency file in the configured mode and refuses to serve
//! if the graph fails any structural check.

use anyhow::Context;
use axum::Router;
use clap::Parser;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use veza_core::{GraphStore, SearchEngine, StorageClient, VezaConfig};
use veza_search::{app, ApiDoc, AppState};

/// Veza search service - HNSW compute node over remote vector storage
#[derive(Parser, Debug)]
#[command(name = "veza-search")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the adjacency file (overrides config)
    #[arg(long, env = "VEZA_SEARCH__GRAPH")]
    graph: Option<String>,

    /// Storage service base URL (overrides config)
    #[arg(long, env = "VEZA_SEARCH__STORAGE_URL")]
    storage: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(long, env = "VEZA_SEARCH__PORT")]
    port: Option<u16>,

    /// Default base-layer beam width (overrides config)
    #[arg(long)]
    ef: Option<usize>,

    /// Default result count (overrides config)
    #[arg(long)]
    k: Option<usize>,

    /// Default entry label (overrides the file's entrypoint)
    #[arg(long)]
    entry: Option<u32>,

    /// Lazy graph loading: 1/true for offset-indexed reads, 0/false for
    /// fully resident
    #[arg(long, value_parser = parse_switch)]
    optimized: Option<bool>,

    /// Deployment-wide vector dimension (overrides config)
    #[arg(long)]
    dim: Option<usize>,

    /// Optional path to a veza.toml configuration file
    #[arg(long)]
    config: Option<String>,
}

/// Accepts the historical `--optimized 0|1` spelling alongside booleans.
fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(format!("expected 0, 1, true or false, got '{other}'")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => VezaConfig::load_from(path)?,
        None => VezaConfig::load()?,
    };
    let search = &mut config.search;
    if let Some(graph) = args.graph {
        search.graph = graph;
    }
    if let Some(storage) = args.storage {
        search.storage_url = storage;
    }
    if let Some(port) = args.port {
        search.port = port;
    }
    if let Some(ef) = args.ef {
        search.ef = ef;
    }
    if let Some(k) = args.k {
        search.k = k;
    }
    if args.entry.is_some() {
        search.entry = args.entry;
    }
    if let Some(optimized) = args.optimized {
        search.optimized = optimized;
    }
    if let Some(dim) = args.dim {
        search.dim = dim;
    }
    config.validate()?;
    let search = config.search;

    tracing::info!("Starting Veza search service... [mode: {}]",
        if search.optimized { "optimized (storage-compute separation)" } else { "normal (resident graph)" });

    // A corrupt graph must never reach the serving state.
    let graph = GraphStore::load(&search.graph, search.load_mode())
        .with_context(|| format!("cannot load graph {}", search.graph))?;

    let client = StorageClient::new(search.storage_url.clone(), search.client_options());
    let engine = SearchEngine::with_cache_capacity(graph, client, search.dim, search.vector_cache);

    let state = Arc::new(AppState {
        engine: Arc::new(engine),
        ef: search.ef,
        k: search.k,
        entry: search.entry,
        storage_url: search.storage_url.clone(),
    });

    // Advisory: the storage service may not be up yet; queries will fetch
    // on demand either way.
    let warm_engine = Arc::clone(&state.engine);
    match tokio::task::spawn_blocking(move || warm_engine.warm_up()).await? {
        Ok(cached) => tracing::info!("vector cache warmed with {cached} entries"),
        Err(e) => tracing::warn!("cache warm-up skipped: {e}"),
    }

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());
    let service = app(state)
        .merge(Router::<()>::new().merge(swagger_ui))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", search.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("veza-search listening on http://{}", addr);

    axum::serve(listener, service).await?;
    Ok(())
}
