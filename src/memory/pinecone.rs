//! Pinecone serverless index client.
//!
//! The control plane (`api.pinecone.io`) resolves or creates the index and
//! yields its data-plane host; the data plane carries upserts and queries.
//! The index schema is a fixed-dimension cosine vector plus a metadata map.

use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use super::{IndexMatch, MemoryRecord, VectorIndex};
use crate::error::{AgentError, Result};

/// Control-plane endpoint for index management.
pub const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// How many times to poll a freshly created index before giving up.
const READY_POLL_ATTEMPTS: u32 = 30;
const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Settings for the managed index, all sourced from the environment.
#[derive(Debug, Clone)]
pub struct PineconeSettings {
    pub api_key: String,
    pub index_name: String,
    pub cloud: String,
    pub region: String,
    /// Must match the embedding model's output width.
    pub dimension: usize,
}

/// Handle to one serverless index, bound to its data-plane host.
#[derive(Clone)]
pub struct PineconeIndex {
    http: reqwest::Client,
    settings: PineconeSettings,
    host: String,
}

impl std::fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeIndex")
            .field("index_name", &self.settings.index_name)
            .field("host", &self.host)
            .finish()
    }
}

impl PineconeIndex {
    /// Connect to the configured index, creating it when absent, and
    /// resolve the data-plane host.
    ///
    /// # Errors
    ///
    /// Returns a config error if the HTTP client cannot be built, or a
    /// platform error if the control plane rejects the request or the
    /// index never becomes ready.
    pub async fn connect(settings: PineconeSettings) -> Result<Self> {
        Self::connect_with_control_plane(settings, CONTROL_PLANE_URL).await
    }

    /// Like [`Self::connect`] but against a custom control plane (tests).
    ///
    /// # Errors
    ///
    /// See [`Self::connect`].
    pub async fn connect_with_control_plane(
        settings: PineconeSettings,
        control_plane: &str,
    ) -> Result<Self> {
        let http = build_client()?;
        let host = ensure_index(&http, &settings, control_plane).await?;
        info!(index = %settings.index_name, host = %host, "connected to vector index");
        Ok(Self {
            http,
            settings,
            host,
        })
    }

    /// Delete and recreate the index, dropping every stored memory.
    /// Backs the `reset-index` maintenance subcommand.
    ///
    /// # Errors
    ///
    /// Returns a platform error if deletion or recreation fails.
    pub async fn reset(settings: &PineconeSettings) -> Result<()> {
        let http = build_client()?;
        let url = format!(
            "{}/indexes/{}",
            CONTROL_PLANE_URL.trim_end_matches('/'),
            settings.index_name
        );
        let resp = http
            .delete(&url)
            .header("Api-Key", &settings.api_key)
            .send()
            .await?;
        // A missing index is fine; we are about to recreate it anyway.
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(AgentError::Platform(format!(
                "failed to delete index '{}': HTTP {}",
                settings.index_name,
                resp.status()
            )));
        }
        info!(index = %settings.index_name, "index deleted, recreating");
        ensure_index(&http, settings, CONTROL_PLANE_URL).await?;
        Ok(())
    }

    fn data_url(&self, path: &str) -> String {
        format!("https://{}/{path}", self.host.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, record: MemoryRecord) -> Result<()> {
        let body = serde_json::json!({ "vectors": [record] });
        self.http
            .post(self.data_url("vectors/upsert"))
            .header("Api-Key", &self.settings.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<IndexMatch>> {
        let body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true
        });
        let resp: QueryResponse = self
            .http
            .post(self.data_url("query"))
            .header("Api-Key", &self.settings.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.matches)
    }
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))
}

/// Describe the index, creating it when absent, and return its host.
async fn ensure_index(
    http: &reqwest::Client,
    settings: &PineconeSettings,
    control_plane: &str,
) -> Result<String> {
    let base = control_plane.trim_end_matches('/');
    let describe_url = format!("{base}/indexes/{}", settings.index_name);

    let resp = http
        .get(&describe_url)
        .header("Api-Key", &settings.api_key)
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        info!(
            index = %settings.index_name,
            dimension = settings.dimension,
            "index missing, creating serverless index"
        );
        let body = serde_json::json!({
            "name": settings.index_name,
            "dimension": settings.dimension,
            "metric": "cosine",
            "spec": {
                "serverless": { "cloud": settings.cloud, "region": settings.region }
            }
        });
        http.post(format!("{base}/indexes"))
            .header("Api-Key", &settings.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        return await_ready(http, settings, &describe_url).await;
    }

    let desc: IndexDescription = resp.error_for_status()?.json().await?;
    if desc.dimension != 0 && desc.dimension != settings.dimension {
        return Err(AgentError::Config(format!(
            "index '{}' has dimension {} but the embedding model produces {}",
            settings.index_name, desc.dimension, settings.dimension
        )));
    }
    Ok(desc.host)
}

/// Poll a freshly created index until the control plane reports it ready.
async fn await_ready(
    http: &reqwest::Client,
    settings: &PineconeSettings,
    describe_url: &str,
) -> Result<String> {
    for _ in 0..READY_POLL_ATTEMPTS {
        tokio::time::sleep(READY_POLL_INTERVAL).await;
        let resp = http
            .get(describe_url)
            .header("Api-Key", &settings.api_key)
            .send()
            .await?;
        if resp.status().is_success() {
            let desc: IndexDescription = resp.json().await?;
            if desc.status.ready && !desc.host.is_empty() {
                return Ok(desc.host);
            }
        }
    }
    Err(AgentError::Platform(format!(
        "index '{}' did not become ready in time",
        settings.index_name
    )))
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    #[serde(default)]
    host: String,
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}
