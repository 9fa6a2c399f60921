//! Query router: decides between the YouTube-enrichment path and plain
//! chat, and always terminates in exactly one [`AgentResult`].
//!
//! Every external-call failure is caught here, logged, and converted into
//! a result with `error` set and a polite apology as the response text.
//! Nothing escapes the router.

pub mod extract;

pub use extract::extract_channel_name;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::llm::LanguageModel;
use crate::youtube::{ChannelDigest, VideoPlatform};

/// How many recent uploads the enrichment path fetches.
const DEFAULT_MAX_VIDEOS: usize = 5;

const UNKNOWN_CHANNEL_RESPONSE: &str = "I couldn't identify a specific YouTube channel in your \
     question. Try asking about a specific channel, for example: 'Show me the latest videos from \
     MrBeast' or 'What are the channel stats for PewDiePie?'";

const GENERIC_APOLOGY: &str = "I apologize, but I encountered an error processing your request. \
     Please try again or rephrase your question.";

/// Caller-supplied tag selecting the routing path.
///
/// Anything that is not `youtube` routes to the general path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryContext {
    Youtube,
    #[default]
    #[serde(other)]
    General,
}

/// Uniform return contract of the router. Exactly one of a successful
/// `response` or an `error` is meaningful at a time.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResult {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResult {
    fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            data: None,
            error: None,
        }
    }

    fn failure(response: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            data: None,
            error: Some(error.into()),
        }
    }

    /// Whether this result wraps an external failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Routes questions to the YouTube-enrichment path or straight to the LLM.
pub struct Agent {
    llm: Arc<dyn LanguageModel>,
    platform: Arc<dyn VideoPlatform>,
    max_videos: usize,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("max_videos", &self.max_videos)
            .finish()
    }
}

impl Agent {
    pub fn new<L, P>(llm: Arc<L>, platform: Arc<P>) -> Self
    where
        L: LanguageModel + 'static,
        P: VideoPlatform + 'static,
    {
        Self {
            llm,
            platform,
            max_videos: DEFAULT_MAX_VIDEOS,
        }
    }

    /// Answer `question` under the given context tag.
    pub async fn answer(&self, question: &str, context: QueryContext) -> AgentResult {
        match context {
            QueryContext::Youtube => self.answer_youtube(question).await,
            QueryContext::General => self.answer_general(question).await,
        }
    }

    /// General path: forward the raw question to the LLM verbatim.
    async fn answer_general(&self, question: &str) -> AgentResult {
        match self.llm.complete(question).await {
            Ok(text) => AgentResult::text(text),
            Err(err) => {
                error!(%err, "LLM call failed");
                AgentResult::failure(GENERIC_APOLOGY, err.to_string())
            }
        }
    }

    /// YouTube path: extract a channel name, fetch its recent uploads,
    /// and answer from a prompt that embeds the fetched data.
    async fn answer_youtube(&self, question: &str) -> AgentResult {
        let Some(channel_name) = extract_channel_name(question) else {
            return AgentResult::text(UNKNOWN_CHANNEL_RESPONSE);
        };
        info!(channel = %channel_name, "resolved channel name from question");

        let digest = match self
            .platform
            .latest_videos(&channel_name, self.max_videos)
            .await
        {
            Ok(digest) => digest,
            Err(err) => {
                error!(%err, channel = %channel_name, "video platform lookup failed");
                return AgentResult::failure(
                    format!("I encountered an error while fetching data for {channel_name}: {err}"),
                    err.to_string(),
                );
            }
        };

        let prompt = build_prompt(question, &digest);
        match self.llm.complete(&prompt).await {
            Ok(text) => AgentResult {
                response: text,
                data: serde_json::to_value(&digest).ok(),
                error: None,
            },
            Err(err) => {
                error!(%err, channel = %channel_name, "LLM call failed");
                AgentResult::failure(GENERIC_APOLOGY, err.to_string())
            }
        }
    }
}

/// Build the single composite prompt for the enrichment path.
fn build_prompt(question: &str, digest: &ChannelDigest) -> String {
    format!(
        "You are a YouTube research assistant. Answer the question using only \
         the channel data below. Be concise and cite concrete numbers.\n\n\
         Question: {question}\n\n{}",
        format_digest(digest)
    )
}

/// Render the fetched data as a readable digest for the prompt.
fn format_digest(digest: &ChannelDigest) -> String {
    let channel = &digest.channel;
    let mut out = format!(
        "Channel stats for {}:\n- {} subscribers\n- {} total views\n- {} videos\n\nLatest videos:\n",
        channel.name,
        format_count(channel.subscriber_count),
        format_count(channel.view_count),
        channel.video_count,
    );
    for (i, video) in digest.videos.iter().enumerate() {
        out.push_str(&format!(
            "{}. \"{}\" (published {}) - {} views, {} likes, {} comments\n",
            i + 1,
            video.title,
            video.published_at.format("%Y-%m-%d"),
            format_count(video.view_count),
            format_count(video.like_count),
            format_count(video.comment_count),
        ));
    }
    out
}

/// Render large counts the way they read on the site: 1.2K, 3.4M, 1.1B.
#[must_use]
pub fn format_count(n: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let f = n as f64;
    if n >= 1_000_000_000 {
        format!("{:.1}B", f / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.1}M", f / 1e6)
    } else if n >= 1_000 {
        format!("{:.1}K", f / 1e3)
    } else {
        n.to_string()
    }
}
