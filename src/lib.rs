//! YouTube Research Agent
//!
//! A backend that accepts a natural-language question, optionally detects
//! that it references a YouTube channel, fetches channel/video statistics
//! from the YouTube Data API, keeps conversational memory in a managed
//! vector index, and delegates answer generation to a hosted LLM.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP façade ([`server`])
//! - **Router**: context-tagged query routing ([`agent`])
//! - **Video platform**: YouTube Data API v3 client ([`youtube`])
//! - **Memory**: embeddings + Pinecone vector index ([`memory`])
//! - **LLM**: Gemini completion and embedding driver ([`llm`])
//!
//! Each request flows extractor → platform client → LLM strictly
//! sequentially; the only shared mutable state lives in the remote
//! services.

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::unused_async)]

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod server;
pub mod youtube;

use std::sync::Arc;

use agent::Agent;
use memory::MemoryStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Query router producing answers.
    pub agent: Arc<Agent>,
    /// Append-only conversational memory.
    pub memory: Arc<MemoryStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}
