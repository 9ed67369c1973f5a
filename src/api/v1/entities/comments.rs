use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored top-level comment. `video_id` references the owning video's
/// internal id, not the remote one. Comments are append-only: a video's
/// comments are captured once, when the video row is first created.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VideoComment {
    pub id: String,
    pub video_id: String,
    pub user_id: String,
    pub comment_text: String,
    pub like_count: i32,
    pub dislike_count: i32,
    pub published_at: NaiveDateTime,
    pub is_used: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insert payload for a comment row. The remote API stopped exposing
/// dislike counts, so the stored dislike_count is always zero.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub video_id: String,
    pub user_id: String,
    pub comment_text: String,
    pub like_count: i32,
    pub published_at: NaiveDateTime,
}
