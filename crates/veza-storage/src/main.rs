#![allow(clippy::doc_markdown)]
//! Veza storage service binary.

use anyhow::Context;
use axum::Router;
use clap::Parser;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use veza_core::VezaConfig;
use veza_storage::{app, ApiDoc, AppState, VectorStore};

/// Veza storage service - persistent vector storage for compute nodes
#[derive(Parser, Debug)]
#[command(name = "veza-storage")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory for the backing store (overrides config)
    #[arg(long, env = "VEZA_STORAGE__DB_PATH")]
    db_path: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "VEZA_STORAGE__PORT")]
    port: Option<u16>,

    /// Optional path to a veza.toml configuration file
    #[arg(long)]
    config: Option<String>,
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
    if let Some(db_path) = args.db_path {
        config.storage.db_path = db_path;
    }
    if let Some(port) = args.port {
        config.storage.port = port;
    }

    tracing::info!("Starting Veza storage service...");
    let store = VectorStore::open(&config.storage.db_path)
        .with_context(|| format!("cannot open store at {}", config.storage.db_path))?;
    let state = Arc::new(AppState { store });

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());
    let service = app(state)
        .merge(Router::<()>::new().merge(swagger_ui))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.storage.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "veza-storage listening on http://{} (db: {})",
        addr,
        config.storage.db_path
    );

    axum::serve(listener, service).await?;
    Ok(())
}
