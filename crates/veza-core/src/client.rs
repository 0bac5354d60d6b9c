//! Blocking HTTP client for the storage service.
//!
//! One reusable `reqwest` client is created lazily per process and shared
//! by every worker; per-request state is limited to the URL and body.
//! Creation is deferred because the client must be built on a blocking
//! thread, never inside the async accept loop.

use crate::error::{Error, Result};
use crate::fetch::{FetchError, VectorSource};
use crate::graph::Label;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry/backoff and timeout policy for vector fetches.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Maximum fetch attempts per label.
    pub max_retries: u32,
    /// First backoff delay; doubles on each subsequent attempt.
    pub backoff: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout (covers the read).
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Wire shape of `GET /vec/get`.
#[derive(Debug, Deserialize)]
struct VectorPayload {
    #[allow(dead_code)]
    id: Label,
    values: Vec<f32>,
}

/// Client for the storage service's `/vec/*` endpoints.
pub struct StorageClient {
    base_url: String,
    options: ClientOptions,
    http: OnceLock<reqwest::blocking::Client>,
}

impl StorageClient {
    /// Creates a client for the storage service at `base_url`
    /// (e.g. `http://127.0.0.1:8081`). No connection is made until the
    /// first request.
    #[must_use]
    pub fn new(base_url: impl Into<String>, options: ClientOptions) -> Self {
        Self {
            base_url: base_url.into(),
            options,
            http: OnceLock::new(),
        }
    }

    /// The storage service base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn http(&self) -> &reqwest::blocking::Client {
        self.http.get_or_init(|| {
            reqwest::blocking::Client::builder()
                .connect_timeout(self.options.connect_timeout)
                .timeout(self.options.request_timeout)
                .build()
                .expect("HTTP client construction cannot fail with static options")
        })
    }

    /// Stores a vector under `label` via `POST /vec/put`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] on a non-200 response and
    /// [`Error::StorageUnreachable`] on transport failure.
    #[allow(clippy::cast_possible_truncation)]
    pub fn put(&self, label: Label, vector: &[f32]) -> Result<()> {
        let mut body = Vec::with_capacity(8 + vector.len() * 4);
        body.extend_from_slice(&label.to_le_bytes());
        body.extend_from_slice(&(vector.len() as u32).to_le_bytes());
        for v in vector {
            body.extend_from_slice(&v.to_le_bytes());
        }

        let url = format!("{}/vec/put", self.base_url);
        let resp = self
            .http()
            .post(&url)
            .body(body)
            .send()
            .map_err(|e| Error::StorageUnreachable(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::Storage(format!(
                "put of vector {label} rejected with status {}",
                resp.status()
            )))
        }
    }

    /// Fetches several vectors in one round trip via `POST /vec/batch_get`.
    ///
    /// The result is positional: `None` marks labels the store does not
    /// hold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnreachable`] on transport failure and
    /// [`Error::Storage`] on a non-200 response or an undecodable body.
    pub fn batch_fetch(&self, labels: &[Label]) -> Result<Vec<Option<Vec<f32>>>> {
        let url = format!("{}/vec/batch_get", self.base_url);
        let resp = self
            .http()
            .post(&url)
            .json(&labels)
            .send()
            .map_err(|e| Error::StorageUnreachable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Storage(format!(
                "batch_get rejected with status {}",
                resp.status()
            )));
        }

        let out: Vec<Option<Vec<f32>>> = resp
            .json()
            .map_err(|e| Error::Storage(format!("batch_get body undecodable: {e}")))?;

        if out.len() == labels.len() {
            Ok(out)
        } else {
            Err(Error::Storage(format!(
                "batch_get returned {} entries for {} labels",
                out.len(),
                labels.len()
            )))
        }
    }
}

impl VectorSource for StorageClient {
    /// `GET /vec/get?id=<label>` with bounded retries and exponential
    /// backoff. A 404 is final immediately; transport errors and non-200s
    /// are retried up to [`ClientOptions::max_retries`] attempts.
    fn fetch(&self, label: Label) -> std::result::Result<Arc<[f32]>, FetchError> {
        let url = format!("{}/vec/get?id={label}", self.base_url);
        let mut last_failure = String::new();
        let mut connect_failure = false;

        for attempt in 0..self.options.max_retries {
            if attempt > 0 {
                // 100ms, 200ms, 400ms, ...
                std::thread::sleep(self.options.backoff * (1u32 << (attempt - 1)));
            }

            match self.http().get(&url).send() {
                Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => {
                    return Err(FetchError::NotFound(label));
                }
                Ok(resp) if resp.status().is_success() => {
                    let body = resp.text().map_err(|e| FetchError::BadPayload {
                        label,
                        reason: e.to_string(),
                    })?;
                    let payload: VectorPayload =
                        serde_json::from_str(&body).map_err(|e| FetchError::BadPayload {
                            label,
                            reason: e.to_string(),
                        })?;
                    return Ok(Arc::from(payload.values));
                }
                Ok(resp) => {
                    last_failure = format!("status {}", resp.status());
                    connect_failure = false;
                    debug!(label, attempt, %last_failure, "vector fetch retrying");
                }
                Err(e) => {
                    connect_failure = e.is_connect();
                    last_failure = e.to_string();
                    debug!(label, attempt, %last_failure, "vector fetch retrying");
                }
            }
        }

        warn!(
            label,
            attempts = self.options.max_retries,
            %last_failure,
            "vector fetch exhausted retries"
        );
        if connect_failure {
            Err(FetchError::Unreachable(last_failure))
        } else {
            Err(FetchError::Transient {
                label,
                reason: last_failure,
            })
        }
    }
}
