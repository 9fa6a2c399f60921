//! End-to-end tests of the HTTP surface with in-process doubles standing
//! in for the three remote services (LLM, video platform, vector index).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use yt_research_agent::AppState;
use yt_research_agent::agent::Agent;
use yt_research_agent::error::{AgentError, Result};
use yt_research_agent::llm::{Embedder, LanguageModel};
use yt_research_agent::memory::{IndexMatch, MemoryRecord, MemoryStore, VectorIndex};
use yt_research_agent::server::router;
use yt_research_agent::youtube::{ChannelDigest, ChannelInfo, VideoPlatform, VideoSummary};

struct FixedLlm {
    reply: &'static str,
}

#[async_trait::async_trait]
impl LanguageModel for FixedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.reply.to_string())
    }
}

struct StubPlatform {
    calls: AtomicUsize,
    fail: bool,
}

impl StubPlatform {
    fn healthy() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    fn digest() -> ChannelDigest {
        ChannelDigest {
            channel: ChannelInfo {
                channel_id: "UC-mrbeast".to_string(),
                name: "MrBeast".to_string(),
                subscriber_count: 250_000_000,
                video_count: 800,
                view_count: 50_000_000_000,
            },
            videos: vec![VideoSummary {
                video_id: "vid1".to_string(),
                title: "I Gave Away A House".to_string(),
                published_at: Utc.with_ymd_and_hms(2024, 6, 2, 10, 0, 0).unwrap(),
                view_count: 1_200_000,
                like_count: 80_000,
                comment_count: 4_000,
                duration: Some("PT15M2S".to_string()),
                url: "https://www.youtube.com/watch?v=vid1".to_string(),
            }],
        }
    }
}

#[async_trait::async_trait]
impl VideoPlatform for StubPlatform {
    async fn channel_info(&self, _name: &str) -> Result<ChannelInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::digest().channel)
    }

    async fn latest_videos(&self, name: &str, _max_results: usize) -> Result<ChannelDigest> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AgentError::Platform(format!(
                "YouTube API error for '{name}'"
            )));
        }
        Ok(Self::digest())
    }
}

/// Deterministic toy embedder: normalized character histogram.
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

fn test_server(llm_reply: &'static str, platform: Arc<StubPlatform>) -> TestServer {
    let state = AppState {
        agent: Arc::new(Agent::new(Arc::new(FixedLlm { reply: llm_reply }), platform)),
        memory: Arc::new(MemoryStore::new(
            Arc::new(HistogramEmbedder),
            Arc::new(InMemoryIndex::default()),
        )),
    };
    TestServer::new(router(state, 30)).expect("test server")
}

#[tokio::test]
async fn test_health() {
    let server = test_server("unused", StubPlatform::healthy());
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_chat_missing_question_is_400() {
    let server = test_server("unused", StubPlatform::healthy());
    let response = server.post("/chat").json(&json!({})).await;
    response.assert_status_bad_request();
    let body = response.json::<Value>();
    assert!(body["error"].as_str().unwrap().contains("question"));
}

#[tokio::test]
async fn test_chat_blank_question_is_400() {
    let server = test_server("unused", StubPlatform::healthy());
    let response = server.post("/chat").json(&json!({ "question": "  " })).await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_chat_uses_llm_only() {
    let platform = StubPlatform::healthy();
    let server = test_server("The answer is 4.", Arc::clone(&platform));

    let response = server
        .post("/chat")
        .json(&json!({ "question": "2+2?" }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["response"], "The answer is 4.");
    assert!(body.get("data").is_none());
    assert!(body.get("error").is_none());
    assert_eq!(platform.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_youtube_unparseable_question() {
    let server = test_server("unused", StubPlatform::healthy());
    let response = server
        .post("/youtube")
        .json(&json!({ "question": "tell me a joke" }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert!(body["response"].as_str().unwrap().contains("couldn't identify"));
    assert!(body.get("data").is_none());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_youtube_happy_path_attaches_data() {
    let server = test_server("Their newest video has 1.2M views.", StubPlatform::healthy());
    let response = server
        .post("/youtube")
        .json(&json!({ "question": "show the latest videos from mrbeast" }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["response"], "Their newest video has 1.2M views.");
    assert_eq!(body["data"]["channel"]["name"], "MrBeast");
    assert_eq!(body["data"]["videos"][0]["video_id"], "vid1");
}

#[tokio::test]
async fn test_youtube_platform_failure_is_500_with_error() {
    let server = test_server("unused", StubPlatform::failing());
    let response = server
        .post("/youtube")
        .json(&json!({ "question": "show the latest videos from mrbeast" }))
        .await;
    response.assert_status_internal_server_error();
    let body = response.json::<Value>();
    assert!(body["error"].as_str().unwrap().contains("YouTube API error"));
    assert!(body["response"].as_str().unwrap().contains("mrbeast"));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_memory_store_then_search() {
    let server = test_server("unused", StubPlatform::healthy());

    let saved = server
        .post("/memory")
        .json(&json!({
            "text": "rust borrow checker basics",
            "metadata": { "topic": "rust" }
        }))
        .await;
    saved.assert_status_ok();
    assert!(!saved.json::<Value>()["id"].as_str().unwrap().is_empty());

    server
        .post("/memory")
        .json(&json!({ "text": "zebra zoo zzz" }))
        .await
        .assert_status_ok();

    let found = server
        .get("/memory")
        .add_query_param("q", "rust borrow checker basics")
        .add_query_param("top_k", "2")
        .await;
    found.assert_status_ok();
    let body = found.json::<Value>();
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches[0]["text"], "rust borrow checker basics");
    assert_eq!(matches[0]["metadata"]["topic"], "rust");
}

#[tokio::test]
async fn test_memory_missing_text_is_400() {
    let server = test_server("unused", StubPlatform::healthy());
    let response = server.post("/memory").json(&json!({ "text": "" })).await;
    response.assert_status_bad_request();
}
