//! Veza configuration module.
//!
//! Configuration file support via `veza.toml` plus environment variables.
//!
//! # Priority (highest to lowest)
//!
//! 1. CLI flags (applied by the binaries on top of the loaded config)
//! 2. Environment variables (`VEZA_*`, `__`-separated nesting)
//! 3. Configuration file (`veza.toml`)
//! 4. Default values

use crate::client::ClientOptions;
use crate::error::{Error, Result};
use crate::graph::LoadMode;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Search-service (compute node) configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Path to the adjacency file.
    pub graph: String,
    /// Base URL of the storage service.
    pub storage_url: String,
    /// Port the search service listens on.
    pub port: u16,
    /// Default base-layer beam width.
    pub ef: usize,
    /// Default result count.
    pub k: usize,
    /// Default entry label override; `None` uses the file's entrypoint.
    pub entry: Option<u32>,
    /// Load the graph lazily (offset tables + on-demand reads) instead of
    /// fully resident.
    pub optimized: bool,
    /// Deployment-wide vector dimension.
    pub dim: usize,
    /// Capacity of the cross-query vector cache (entries; 0 disables).
    pub vector_cache: usize,
    /// Maximum fetch attempts per vector.
    pub fetch_retries: u32,
    /// First retry backoff in milliseconds (doubles per attempt).
    pub fetch_backoff_ms: u64,
    /// TCP connect timeout towards the storage service, seconds.
    pub connect_timeout_s: u64,
    /// Whole-request timeout towards the storage service, seconds.
    pub request_timeout_s: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            graph: "./veza_graph.bin".to_string(),
            storage_url: "http://127.0.0.1:8081".to_string(),
            port: 8080,
            ef: 200,
            k: 10,
            entry: None,
            optimized: false,
            dim: 128,
            vector_cache: 100_000,
            fetch_retries: 3,
            fetch_backoff_ms: 100,
            connect_timeout_s: 5,
            request_timeout_s: 10,
        }
    }
}

impl SearchConfig {
    /// The graph load mode this configuration selects.
    #[must_use]
    pub fn load_mode(&self) -> LoadMode {
        if self.optimized {
            LoadMode::Lazy
        } else {
            LoadMode::Resident
        }
    }

    /// Client retry/timeout policy derived from this configuration.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            max_retries: self.fetch_retries,
            backoff: Duration::from_millis(self.fetch_backoff_ms),
            connect_timeout: Duration::from_secs(self.connect_timeout_s),
            request_timeout: Duration::from_secs(self.request_timeout_s),
        }
    }
}

/// Storage-service configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the vector store files.
    pub db_path: String,
    /// Port the storage service listens on.
    pub port: u16,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "./veza_data".to_string(),
            port: 8081,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VezaConfig {
    /// Compute-node section.
    pub search: SearchConfig,
    /// Storage-service section.
    pub storage: StorageConfig,
}

impl VezaConfig {
    /// Loads configuration from `veza.toml` in the working directory (if
    /// present) and `VEZA_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a provider fails to parse or the
    /// resulting values fail validation.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment("veza.toml"))
    }

    /// Loads configuration with an explicit file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file does not exist, fails to
    /// parse, or the resulting values fail validation.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        Self::from_figment(Self::figment(path))
    }

    fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VEZA_").split("__"))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.search.dim == 0 {
            return Err(Error::Config("search.dim must be positive".to_string()));
        }
        if self.search.ef == 0 {
            return Err(Error::Config("search.ef must be positive".to_string()));
        }
        if self.search.k == 0 {
            return Err(Error::Config("search.k must be positive".to_string()));
        }
        if self.search.fetch_retries == 0 {
            return Err(Error::Config(
                "search.fetch_retries must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
