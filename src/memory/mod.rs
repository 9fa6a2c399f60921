//! Append-only conversational memory backed by a managed vector index.
//!
//! [`MemoryStore`] composes an [`Embedder`] with a [`VectorIndex`]: `store`
//! embeds a text and upserts it under a fresh id, `retrieve` embeds a query
//! and returns the nearest stored texts. Records are never mutated or
//! evicted; the index owns all persistence.

pub mod pinecone;

pub use pinecone::{PineconeIndex, PineconeSettings};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::llm::Embedder;

/// One (id, vector, metadata) triple as sent to the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Map<String, Value>,
}

/// Raw nearest-neighbour match as returned by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A stored memory as surfaced to callers, most-similar first.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryMatch {
    pub text: String,
    pub score: f32,
    pub metadata: Map<String, Value>,
}

/// Storage seam over the managed vector index.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite a record.
    ///
    /// # Errors
    ///
    /// Propagates the index's error verbatim; no retry.
    async fn upsert(&self, record: MemoryRecord) -> Result<()>;

    /// Nearest-neighbour query returning at most `top_k` matches with
    /// metadata, ordered by relevance.
    ///
    /// # Errors
    ///
    /// Propagates the index's error verbatim.
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<IndexMatch>>;
}

/// Conversational memory: embed, append, similarity-search.
pub struct MemoryStore {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("dimension", &self.embedder.dimension())
            .finish()
    }
}

impl MemoryStore {
    pub fn new<E, I>(embedder: Arc<E>, index: Arc<I>) -> Self
    where
        E: Embedder + 'static,
        I: VectorIndex + 'static,
    {
        Self { embedder, index }
    }

    /// Embed `text` and append it to the index under a fresh unique id.
    /// The text itself is stored in the metadata under the `text` key.
    ///
    /// # Errors
    ///
    /// Propagates embedding and index errors verbatim.
    pub async fn store(&self, text: &str, metadata: Map<String, Value>) -> Result<String> {
        let values = self.embedder.embed(text).await?;
        let id = Uuid::new_v4().to_string();

        let mut metadata = metadata;
        metadata.insert("text".to_string(), Value::String(text.to_string()));

        self.index
            .upsert(MemoryRecord {
                id: id.clone(),
                values,
                metadata,
            })
            .await?;
        debug!(id = %id, "memory stored");
        Ok(id)
    }

    /// Return the `top_k` stored texts most similar to `query`, preserving
    /// the index's relevance ordering. Matches without a `text` metadata
    /// key are discarded.
    ///
    /// # Errors
    ///
    /// Propagates embedding and index errors verbatim.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<MemoryMatch>> {
        let vector = self.embedder.embed(query).await?;
        let matches = self.index.query(vector, top_k).await?;

        Ok(matches
            .into_iter()
            .filter_map(|m| {
                let mut metadata = m.metadata;
                let text = match metadata.remove("text") {
                    Some(Value::String(s)) => s,
                    _ => return None,
                };
                Some(MemoryMatch {
                    text,
                    score: m.score,
                    metadata,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    /// Deterministic toy embedder: a normalized character histogram.
    struct HistogramEmbedder;

    #[async_trait::async_trait]
    impl Embedder for HistogramEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; 26];
            for c in text.to_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                v[(c - b'a') as usize] += 1.0;
            }
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for x in &mut v {
                    *x /= norm;
                }
            }
            Ok(v)
        }

        fn dimension(&self) -> usize {
            26
        }
    }

    #[derive(Default)]
    struct InMemoryIndex {
        records: Mutex<Vec<MemoryRecord>>,
    }

    #[async_trait::async_trait]
    impl VectorIndex for InMemoryIndex {
        async fn upsert(&self, record: MemoryRecord) -> Result<()> {
            self.records.lock().await.push(record);
            Ok(())
        }

        async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<IndexMatch>> {
            let records = self.records.lock().await;
            let mut scored: Vec<IndexMatch> = records
                .iter()
                .map(|r| IndexMatch {
                    id: r.id.clone(),
                    score: r.values.iter().zip(&vector).map(|(a, b)| a * b).sum(),
                    metadata: r.metadata.clone(),
                })
                .collect();
            scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            scored.truncate(top_k);
            Ok(scored)
        }
    }

    fn store_with_index() -> (MemoryStore, Arc<InMemoryIndex>) {
        let index = Arc::new(InMemoryIndex::default());
        let store = MemoryStore::new(Arc::new(HistogramEmbedder), Arc::clone(&index));
        (store, index)
    }

    #[tokio::test]
    async fn test_store_then_retrieve_returns_top_match() {
        let (store, _) = store_with_index();
        store
            .store("the quick brown fox", Map::new())
            .await
            .unwrap();
        store
            .store("completely unrelated zzz", Map::new())
            .await
            .unwrap();

        let matches = store.retrieve("the quick brown fox", 2).await.unwrap();
        assert_eq!(matches[0].text, "the quick brown fox");
        assert!(matches[0].score > matches[1].score);
    }

    #[tokio::test]
    async fn test_store_generates_unique_ids() {
        let (store, _) = store_with_index();
        let a = store.store("same text", Map::new()).await.unwrap();
        let b = store.store("same text", Map::new()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_retrieve_drops_matches_without_text() {
        let (store, index) = store_with_index();
        // A record written out-of-band with no `text` metadata key.
        index
            .upsert(MemoryRecord {
                id: "raw".to_string(),
                values: vec![1.0; 26],
                metadata: Map::new(),
            })
            .await
            .unwrap();
        store.store("remember this", Map::new()).await.unwrap();

        let matches = store.retrieve("remember this", 5).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "remember this");
    }

    #[tokio::test]
    async fn test_metadata_round_trip_without_text_key() {
        let (store, _) = store_with_index();
        let mut metadata = Map::new();
        metadata.insert("topic".to_string(), Value::String("ai".to_string()));
        store.store("a note about ai", metadata).await.unwrap();

        let matches = store.retrieve("a note about ai", 1).await.unwrap();
        assert_eq!(matches[0].metadata.get("topic").unwrap(), "ai");
        assert!(!matches[0].metadata.contains_key("text"));
    }
}
