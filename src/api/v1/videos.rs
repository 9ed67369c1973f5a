use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use tower_cookies::Cookies;

use crate::api::common::middleware::request_token;
use crate::api::common::utils::timeout_query;
use crate::api::v1::auth::get_user_id_from_token;
use crate::api::v1::entities::comments::VideoComment;
use crate::api::v1::entities::videos::Video;
use crate::errors::AppError;
use crate::InnerState;

#[tracing::instrument(name = "Get all videos for user", skip(cookies, headers, inner))]
pub async fn all_videos(
    cookies: Cookies,
    headers: HeaderMap,
    State(inner): State<InnerState>,
) -> Result<Json<Vec<Video>>, AppError> {
    let start_time = std::time::Instant::now();
    tracing::info!("Starting all_videos request");

    let fetch_videos_timeout = tokio::time::Duration::from_millis(10000);
    let InnerState { db, .. } = inner;

    let auth_token = request_token(&headers, &cookies).unwrap_or_default();

    if auth_token.is_empty() {
        tracing::warn!("all_videos: Missing authentication token");
        return Err(AppError::Authentication(anyhow::anyhow!("Missing token")));
    }

    let user_id = get_user_id_from_token(auth_token).await?;

    let videos = timeout_query(
        fetch_videos_timeout,
        sqlx::query_as::<_, Video>(
            r#"SELECT * FROM videos WHERE user_id = $1 ORDER BY published_at DESC"#,
        )
        .bind(&user_id)
        .fetch_all(&db),
    )
    .await?;

    let duration = start_time.elapsed();
    tracing::info!(
        "all_videos: Fetched {} videos in {:?}",
        videos.len(),
        duration
    );
    Ok(Json(videos))
}

#[tracing::instrument(name = "Get comments for video", skip(cookies, headers, inner), fields(video_id = %video_id))]
pub async fn video_comments(
    cookies: Cookies,
    headers: HeaderMap,
    State(inner): State<InnerState>,
    Path(video_id): Path<String>,
) -> Result<Json<Vec<VideoComment>>, AppError> {
    let fetch_comments_timeout = tokio::time::Duration::from_millis(10000);
    let InnerState { db, .. } = inner;

    let auth_token = request_token(&headers, &cookies).unwrap_or_default();

    if auth_token.is_empty() {
        tracing::warn!("video_comments: Missing authentication token");
        return Err(AppError::Authentication(anyhow::anyhow!("Missing token")));
    }

    let user_id = get_user_id_from_token(auth_token).await?;

    // ownership check; comments are scoped to the owner's video row
    let video = timeout_query(
        fetch_comments_timeout,
        sqlx::query_as::<_, Video>(r#"SELECT * FROM videos WHERE id = $1 AND user_id = $2"#)
            .bind(&video_id)
            .bind(&user_id)
            .fetch_optional(&db),
    )
    .await?;

    if video.is_none() {
        tracing::warn!(
            "video_comments: No video {} found for user {}",
            video_id,
            user_id
        );
        return Err(AppError::NotFound("Video not found".to_string()));
    }

    let comments = timeout_query(
        fetch_comments_timeout,
        sqlx::query_as::<_, VideoComment>(
            r#"SELECT * FROM video_comments WHERE video_id = $1 AND user_id = $2 ORDER BY published_at DESC"#,
        )
        .bind(&video_id)
        .bind(&user_id)
        .fetch_all(&db),
    )
    .await?;

    tracing::info!(
        "video_comments: Fetched {} comments for video {}",
        comments.len(),
        video_id
    );
    Ok(Json(comments))
}
