//! Gemini Generative Language API driver.
//!
//! Implements [`LanguageModel`] via `models/{model}:generateContent` and
//! [`Embedder`] via `models/{model}:embedContent`. Requests are plain
//! JSON-over-HTTPS with the API key in a header; no streaming.

use std::time::Duration;

use serde::Deserialize;

use super::{Embedder, LanguageModel, LlmSettings};
use crate::error::{AgentError, Result};

/// Default base URL for the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Default completion model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";
/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "embedding-001";
/// Output width of the default embedding model.
pub const EMBEDDING_DIMENSION: usize = 768;

/// Timeout applied to every outbound LLM call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Gemini completion and embedding endpoints.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .field("embedding_model", &self.settings.embedding_model)
            .finish()
    }
}

impl GeminiClient {
    /// Create a new client with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the HTTP client cannot be built.
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, settings })
    }

    fn model_url(&self, model: &str, action: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:{action}",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = self.model_url(&self.settings.model, "generateContent");
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let resp: GenerateContentResponse = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = resp
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AgentError::Platform(
                "model returned no text candidates".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.model_url(&self.settings.embedding_model, "embedContent");
        let body = serde_json::json!({
            "model": format!("models/{}", self.settings.embedding_model),
            "content": { "parts": [{ "text": text }] }
        });

        let resp: EmbedContentResponse = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if resp.embedding.values.is_empty() {
            return Err(AgentError::Platform("empty embedding returned".to_string()));
        }
        Ok(resp.embedding.values)
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}
