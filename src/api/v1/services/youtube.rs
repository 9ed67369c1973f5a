//! YouTube Data API client used by the video sync pipeline.
//!
//! Wraps the four read-only operations the pipeline consumes: channel
//! search, video enumeration, batched video details and top-level
//! comments. Paginated operations never fail outright; they report how
//! far they got through [`FetchResult`].

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::errors::AppError;

/// Hard cap on stored comments per video.
pub const MAX_COMMENTS_PER_VIDEO: usize = 100;

const VIDEO_PAGE_SIZE: usize = 50;

/// Configuration for the YouTube client.
#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    /// Base URL of the YouTube Data API
    pub base_url: String,
    /// API key sent with every request
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl YoutubeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("YOUTUBE_API_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".to_string()),
            api_key: std::env::var("YOUTUBE_API_KEY").unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("YOUTUBE_API_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

/// How a paginated remote fetch ended. `Partial` and `Failed` carry the
/// error text of the call that stopped the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Complete,
    Partial(String),
    Failed(String),
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, FetchOutcome::Complete)
    }
}

/// Items accumulated by a paginated fetch plus how the fetch ended.
#[derive(Debug, Clone)]
pub struct FetchResult<T> {
    pub items: Vec<T>,
    pub outcome: FetchOutcome,
}

/// A video normalized from the remote snippet + statistics.
#[derive(Debug, Clone)]
pub struct VideoDetail {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub published_at: NaiveDateTime,
    pub thumbnail_url: String,
    pub channel_id: String,
    pub channel_title: String,
    pub view_count: i32,
    pub like_count: i32,
    pub dislike_count: i32,
    pub comment_count: i32,
}

/// A top-level comment normalized from the remote thread snippet.
#[derive(Debug, Clone)]
pub struct CommentDetail {
    pub text: String,
    pub like_count: i32,
    pub published_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    channel_id: Option<String>,
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    published_at: String,
    channel_id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
    channel_title: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub standard: Option<Thumbnail>,
    pub maxres: Option<Thumbnail>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    dislike_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadListResponse {
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    text_display: String,
    like_count: Option<i32>,
    published_at: String,
}

#[derive(Clone)]
pub struct YoutubeClient {
    http: Client,
    config: YoutubeConfig,
}

impl YoutubeClient {
    pub fn new(config: YoutubeConfig) -> Result<Self, AppError> {
        if config.api_key.is_empty() {
            warn!("YOUTUBE_API_KEY is not set; remote calls will be rejected by the API");
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                AppError::Unexpected(anyhow::Error::new(e).context("Failed to build HTTP client"))
            })?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(YoutubeConfig::from_env())
    }

    /// Looks up the remote channel id for a display name. Requests a
    /// single result and takes the first match; `None` when the search
    /// comes back empty.
    #[tracing::instrument(name = "Search channel id", skip(self))]
    pub async fn search_channel_id(&self, name: &str) -> Result<Option<String>, AppError> {
        let url = format!("{}/search", self.config.base_url);
        let params = [
            ("part", "snippet".to_string()),
            ("type", "channel".to_string()),
            ("q", name.to_string()),
            ("maxResults", "1".to_string()),
            ("key", self.config.api_key.clone()),
        ];

        let response: SearchListResponse =
            self.get_json(self.http.get(&url).query(&params)).await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.id.channel_id))
    }

    /// Collects every video id of a channel, newest first, 50 per page.
    /// A failed page stops the run and keeps what was accumulated.
    #[tracing::instrument(name = "Enumerate channel videos", skip(self))]
    pub async fn list_channel_video_ids(&self, channel_id: &str) -> FetchResult<String> {
        let url = format!("{}/search", self.config.base_url);
        let mut ids: Vec<String> = Vec::new();
        let mut next_page_token: Option<String> = None;
        let mut page_count = 0;

        loop {
            page_count += 1;
            let mut params = vec![
                ("part", "snippet".to_string()),
                ("channelId", channel_id.to_string()),
                ("type", "video".to_string()),
                ("order", "date".to_string()),
                ("maxResults", VIDEO_PAGE_SIZE.to_string()),
                ("key", self.config.api_key.clone()),
            ];
            if let Some(token) = &next_page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: SearchListResponse =
                match self.get_json(self.http.get(&url).query(&params)).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(
                            "Video enumeration for channel {} stopped at page {}: {}",
                            channel_id, page_count, e
                        );
                        let reason = e.to_string();
                        let outcome = if page_count > 1 {
                            FetchOutcome::Partial(reason)
                        } else {
                            FetchOutcome::Failed(reason)
                        };
                        return FetchResult {
                            items: ids,
                            outcome,
                        };
                    }
                };

            ids.extend(page.items.into_iter().filter_map(|item| item.id.video_id));

            match page.next_page_token {
                Some(token) => next_page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "Enumerated {} video ids for channel {} over {} pages",
            ids.len(),
            channel_id,
            page_count
        );
        FetchResult {
            items: ids,
            outcome: FetchOutcome::Complete,
        }
    }

    /// Fetches snippet + statistics for a batch of video ids in one call
    /// and normalizes them. Items without a snippet or with an
    /// unparseable publish time are dropped.
    #[tracing::instrument(name = "Fetch video details", skip(self, video_ids), fields(batch_size = video_ids.len()))]
    pub async fn fetch_video_details(
        &self,
        video_ids: &[String],
    ) -> Result<Vec<VideoDetail>, AppError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/videos", self.config.base_url);
        let params = [
            ("part", "snippet,statistics".to_string()),
            ("id", video_ids.join(",")),
            ("key", self.config.api_key.clone()),
        ];

        let response: VideoListResponse =
            self.get_json(self.http.get(&url).query(&params)).await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(normalize_video_item)
            .collect())
    }

    /// Accumulates top-level comments for a video until the remote side
    /// runs out of pages or the hard cap is reached. When a page pushes
    /// the total past the cap the list is truncated to exactly the cap,
    /// so the surviving comments from that page are the first-fetched.
    #[tracing::instrument(name = "Fetch video comments", skip(self))]
    pub async fn fetch_video_comments(&self, video_id: &str) -> FetchResult<CommentDetail> {
        let url = format!("{}/commentThreads", self.config.base_url);
        let mut comments: Vec<CommentDetail> = Vec::new();
        let mut next_page_token: Option<String> = None;
        let mut page_count = 0;

        loop {
            page_count += 1;
            let mut params = vec![
                ("part", "snippet".to_string()),
                ("videoId", video_id.to_string()),
                ("maxResults", MAX_COMMENTS_PER_VIDEO.to_string()),
                ("key", self.config.api_key.clone()),
            ];
            if let Some(token) = &next_page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: CommentThreadListResponse =
                match self.get_json(self.http.get(&url).query(&params)).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(
                            "Comment fetch for video {} stopped at page {}: {}",
                            video_id, page_count, e
                        );
                        let reason = e.to_string();
                        let outcome = if page_count > 1 {
                            FetchOutcome::Partial(reason)
                        } else {
                            FetchOutcome::Failed(reason)
                        };
                        return FetchResult {
                            items: comments,
                            outcome,
                        };
                    }
                };

            let next_token = page.next_page_token;
            for thread in page.items {
                let snippet = thread.snippet.top_level_comment.snippet;
                let published_at = match parse_timestamp(&snippet.published_at) {
                    Some(ts) => ts,
                    None => {
                        warn!(
                            "Skipping comment with unparseable publishedAt '{}' on video {}",
                            snippet.published_at, video_id
                        );
                        continue;
                    }
                };
                comments.push(CommentDetail {
                    text: snippet.text_display,
                    like_count: snippet.like_count.unwrap_or(0),
                    published_at,
                });
            }

            if comments.len() >= MAX_COMMENTS_PER_VIDEO {
                comments.truncate(MAX_COMMENTS_PER_VIDEO);
                break;
            }

            match next_token {
                Some(token) => next_page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "Collected {} comments for video {} over {} pages",
            comments.len(),
            video_id,
            page_count
        );
        FetchResult {
            items: comments,
            outcome: FetchOutcome::Complete,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AppError> {
        let response = request.send().await.map_err(AppError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("YouTube API error ({}): {}", status, error_text);
            return Err(AppError::ExternalService(anyhow::anyhow!(
                "YouTube API error ({}): {}",
                status,
                error_text
            )));
        }

        response.json().await.map_err(|e| {
            error!("Failed to parse YouTube API response: {:?}", e);
            AppError::ExternalService(anyhow::Error::new(e).context("Failed to parse response"))
        })
    }
}

fn normalize_video_item(item: VideoItem) -> Option<VideoDetail> {
    let snippet = match item.snippet {
        Some(snippet) => snippet,
        None => {
            warn!("Video {} returned without snippet, skipping", item.id);
            return None;
        }
    };

    let published_at = match parse_timestamp(&snippet.published_at) {
        Some(ts) => ts,
        None => {
            warn!(
                "Video {} has unparseable publishedAt '{}', skipping",
                item.id, snippet.published_at
            );
            return None;
        }
    };

    let statistics = item.statistics.unwrap_or_default();

    Some(VideoDetail {
        video_id: item.id,
        title: snippet.title,
        description: snippet.description,
        published_at,
        thumbnail_url: best_thumbnail(&snippet.thumbnails),
        channel_id: snippet.channel_id,
        channel_title: snippet.channel_title,
        view_count: parse_count(statistics.view_count.as_deref()),
        like_count: parse_count(statistics.like_count.as_deref()),
        dislike_count: parse_count(statistics.dislike_count.as_deref()),
        comment_count: parse_count(statistics.comment_count.as_deref()),
    })
}

/// Highest-resolution thumbnail available, empty string when the remote
/// side provided none.
fn best_thumbnail(thumbnails: &Thumbnails) -> String {
    thumbnails
        .maxres
        .as_ref()
        .or(thumbnails.standard.as_ref())
        .or(thumbnails.high.as_ref())
        .or(thumbnails.medium.as_ref())
        .or(thumbnails.default.as_ref())
        .map(|t| t.url.clone())
        .unwrap_or_default()
}

/// Remote statistics are optional decimal strings; absent or
/// non-numeric values count as zero, and counts wider than the stored
/// column clamp to `i32::MAX`.
fn parse_count(raw: Option<&str>) -> i32 {
    raw.and_then(|value| value.parse::<i64>().ok())
        .map(|value| value.clamp(0, i64::from(i32::MAX)) as i32)
        .unwrap_or(0)
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
        .ok()
}
