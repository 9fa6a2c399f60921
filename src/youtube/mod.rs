//! Video-platform client: channel resolution and recent-upload statistics.

pub mod data_api;

pub use data_api::YouTubeClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Aggregate statistics for a resolved channel.
///
/// The channel id is resolved by name search before statistics are fetched;
/// numeric fields default to 0 when absent from the platform response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub name: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
}

/// One recent upload with its engagement statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// ISO-8601 duration as reported by the platform (e.g. `PT12M34S`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub url: String,
}

/// A channel plus its most recent uploads, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDigest {
    pub channel: ChannelInfo,
    pub videos: Vec<VideoSummary>,
}

/// Read-only access to the video platform.
///
/// Implemented by [`YouTubeClient`] for production and by test doubles in
/// the integration tests. No caching, no retries, a single page per call.
#[async_trait::async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Resolve a channel by name (top search result only) and fetch its
    /// aggregate statistics.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::NotFound`] when no channel
    /// matches, or a platform error for remote failures.
    async fn channel_info(&self, name: &str) -> Result<ChannelInfo>;

    /// Fetch the channel's most recent uploads (at most `max_results`),
    /// ordered by publish date descending, with per-video statistics.
    ///
    /// # Errors
    ///
    /// Short-circuits with the underlying error when the channel cannot
    /// be resolved.
    async fn latest_videos(&self, name: &str, max_results: usize) -> Result<ChannelDigest>;
}
