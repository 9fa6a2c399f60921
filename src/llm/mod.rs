//! LLM client traits and the Gemini implementation.
//!
//! The [`LanguageModel`] and [`Embedder`] traits are the seams the query
//! router and memory store depend on; [`GeminiClient`] implements both
//! against the hosted Generative Language REST API.

pub mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;

/// Connection and model settings for the hosted LLM API.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the API (overridable for tests).
    pub base_url: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Completion model identifier (e.g. `gemini-1.5-pro-latest`).
    pub model: String,
    /// Embedding model identifier (e.g. `embedding-001`).
    pub embedding_model: String,
}

/// Produces a text answer for a prompt.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a single prompt and return the model's text response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the model yields no text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Maps a text to a fixed-dimension semantic vector.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Compute the embedding for `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedding request fails.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output width of the embedding model. The vector index must match.
    fn dimension(&self) -> usize;
}
