//! YouTube Data API v3 client.
//!
//! Three remote calls back the two composite operations: `search.list` for
//! channel and video lookup, `channels.list` for channel statistics, and
//! `videos.list` for batch video statistics. Search metadata is joined to
//! statistics by video id, never by list position.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{ChannelDigest, ChannelInfo, VideoPlatform, VideoSummary};
use crate::error::{AgentError, Result};

/// Default base URL for the Data API.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the YouTube Data API v3.
///
/// Constructed explicitly with an API key; no global state.
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl YouTubeClient {
    /// Create a client against the production API.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the HTTP client cannot be built.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl VideoPlatform for YouTubeClient {
    async fn channel_info(&self, name: &str) -> Result<ChannelInfo> {
        let search: SearchListResponse = self
            .get_json(
                "search",
                &[
                    ("part", "id,snippet".to_string()),
                    ("type", "channel".to_string()),
                    ("maxResults", "1".to_string()),
                    ("q", name.to_string()),
                ],
            )
            .await?;

        // Top-1 only; ambiguous names are not disambiguated.
        let item = search
            .items
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::NotFound(format!("channel '{name}' not found")))?;
        let channel_id = item
            .id
            .channel_id
            .ok_or_else(|| AgentError::Platform("search result missing channel id".to_string()))?;
        let title = item
            .snippet
            .map_or_else(|| name.to_string(), |s| s.title);

        let channels: ChannelListResponse = self
            .get_json(
                "channels",
                &[
                    ("part", "statistics".to_string()),
                    ("id", channel_id.clone()),
                ],
            )
            .await?;
        let stats = channels
            .items
            .into_iter()
            .next()
            .map(|c| c.statistics)
            .ok_or_else(|| {
                AgentError::NotFound(format!("could not fetch statistics for channel '{title}'"))
            })?;

        Ok(ChannelInfo {
            channel_id,
            name: title,
            subscriber_count: parse_count(stats.subscriber_count.as_deref()),
            video_count: parse_count(stats.video_count.as_deref()),
            view_count: parse_count(stats.view_count.as_deref()),
        })
    }

    async fn latest_videos(&self, name: &str, max_results: usize) -> Result<ChannelDigest> {
        let channel = self.channel_info(name).await?;

        let search: SearchListResponse = self
            .get_json(
                "search",
                &[
                    ("part", "id,snippet".to_string()),
                    ("channelId", channel.channel_id.clone()),
                    ("type", "video".to_string()),
                    ("order", "date".to_string()),
                    ("maxResults", max_results.to_string()),
                ],
            )
            .await?;
        if search.items.is_empty() {
            return Err(AgentError::NotFound(format!(
                "no videos found for channel '{}'",
                channel.name
            )));
        }

        let ids: Vec<String> = search
            .items
            .iter()
            .filter_map(|i| i.id.video_id.clone())
            .collect();
        let details: VideoListResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,statistics,contentDetails".to_string()),
                    ("id", ids.join(",")),
                ],
            )
            .await?;

        let videos = join_by_video_id(search.items, details.items, max_results);
        debug!(
            channel = %channel.name,
            videos = videos.len(),
            "joined search results with video statistics"
        );
        Ok(ChannelDigest { channel, videos })
    }
}

/// Join search hits with their statistics keyed on video id.
///
/// Search-result order (publish date descending, platform-side) is
/// preserved; hits with no matching statistics entry are dropped rather
/// than misattributed.
fn join_by_video_id(
    search_items: Vec<SearchItem>,
    detail_items: Vec<VideoItem>,
    max_results: usize,
) -> Vec<VideoSummary> {
    let mut by_id: HashMap<String, VideoItem> = detail_items
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();

    search_items
        .into_iter()
        .filter_map(|hit| {
            let video_id = hit.id.video_id?;
            let detail = by_id.remove(&video_id)?;
            let snippet = detail.snippet.or(hit.snippet)?;
            let published_at = snippet.published_at?;
            Some(VideoSummary {
                url: format!("https://www.youtube.com/watch?v={video_id}"),
                video_id,
                title: snippet.title,
                published_at,
                view_count: parse_count(detail.statistics.view_count.as_deref()),
                like_count: parse_count(detail.statistics.like_count.as_deref()),
                comment_count: parse_count(detail.statistics.comment_count.as_deref()),
                duration: detail.content_details.and_then(|c| c.duration),
            })
        })
        .take(max_results)
        .collect()
}

/// The Data API reports counts as decimal strings; absent or malformed
/// values collapse to 0.
fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    #[serde(default)]
    statistics: ChannelStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    #[serde(default)]
    subscriber_count: Option<String>,
    #[serde(default)]
    video_count: Option<String>,
    #[serde(default)]
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Option<Snippet>,
    #[serde(default)]
    statistics: VideoStatistics,
    #[serde(default)]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    #[serde(default)]
    view_count: Option<String>,
    #[serde(default)]
    like_count: Option<String>,
    #[serde(default)]
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}
