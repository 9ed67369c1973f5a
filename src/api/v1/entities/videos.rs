use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored video. `video_id` is the remote platform's identifier;
/// `channel_id`/`channel_title` are copied from the remote snippet at
/// creation time. Counts are snapshots from fetch time and are never
/// refreshed by later syncs.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: NaiveDateTime,
    pub thumbnail_url: Option<String>,
    pub channel_id: String,
    pub channel_title: String,
    pub view_count: i32,
    pub like_count: i32,
    pub dislike_count: i32,
    pub comment_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insert payload for a video row; id and timestamps are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub user_id: String,
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: NaiveDateTime,
    pub thumbnail_url: Option<String>,
    pub channel_id: String,
    pub channel_title: String,
    pub view_count: i32,
    pub like_count: i32,
    pub dislike_count: i32,
    pub comment_count: i32,
}
