//! Configuration: CLI flags, layered server settings, and the required
//! secrets for the three remote services.
//!
//! Server settings come from defaults, CLI flags, and `YRA_`-prefixed
//! environment variables. API keys are loaded explicitly; a missing
//! required value is a fatal startup error.

use clap::{Parser, Subcommand};
use config::{Config, Environment};
use serde::Deserialize;
use std::env;

use crate::error::AgentError;
use crate::llm::LlmSettings;
use crate::llm::gemini::{
    DEFAULT_BASE_URL as GEMINI_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL,
    EMBEDDING_DIMENSION,
};
use crate::memory::PineconeSettings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Host/interface to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Maintenance subcommands run instead of the server.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Delete and recreate the vector index, dropping all stored memories
    ResetIndex,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Per-request budget enforced by the timeout middleware.
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Layered load: defaults, then `YRA_`-prefixed environment variables,
    /// then explicit CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns a `config::ConfigError` for malformed values.
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.request_timeout_secs", 60)?;

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.clone())?;
        }

        // E.g. YRA_SERVER__PORT=8080. The key separator is `__` but the
        // prefix is still joined with a single underscore.
        builder = builder.add_source(
            Environment::with_prefix("YRA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

fn required_env(name: &str) -> Result<String, AgentError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AgentError::Config(format!("missing required environment variable: {name}")))
}

/// Load Gemini settings. `GEMINI_API_KEY` is required; base URL and model
/// names are overridable for tests and upgrades.
///
/// # Errors
///
/// Returns [`AgentError::Config`] when the API key is missing or empty.
pub fn load_llm_settings() -> Result<LlmSettings, AgentError> {
    Ok(LlmSettings {
        base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| GEMINI_BASE_URL.to_string()),
        api_key: required_env("GEMINI_API_KEY")?,
        model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        embedding_model: env::var("GEMINI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
    })
}

/// Load vector-index settings. Key and index name are required; cloud and
/// region fall back to the serverless defaults.
///
/// # Errors
///
/// Returns [`AgentError::Config`] when a required value is missing.
pub fn load_pinecone_settings() -> Result<PineconeSettings, AgentError> {
    Ok(PineconeSettings {
        api_key: required_env("PINECONE_API_KEY")?,
        index_name: required_env("PINECONE_INDEX")?,
        cloud: env::var("PINECONE_CLOUD").unwrap_or_else(|_| "aws".to_string()),
        region: env::var("PINECONE_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        dimension: EMBEDDING_DIMENSION,
    })
}

/// Load the YouTube Data API key.
///
/// # Errors
///
/// Returns [`AgentError::Config`] when the key is missing or empty.
pub fn load_youtube_api_key() -> Result<String, AgentError> {
    required_env("YOUTUBE_API_KEY")
}
