use anyhow::Result;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tower_cookies::Cookies;

use crate::api::common::middleware::request_token;
use crate::api::v1::auth::get_user_id_from_token;
use crate::api::v1::entities::sync_jobs::SyncJob;
use crate::api::v1::entities::videos::Video;
use crate::api::v1::services::video_sync::VideoSyncService;
use crate::errors::AppError;
use crate::store::postgres::PgStore;
use crate::store::SyncStore;
use crate::InnerState;

/// Runs a sync for the caller and responds with the videos this run
/// created. Runs inline; the response is only sent once every channel
/// has been processed.
#[tracing::instrument(name = "Trigger video sync", skip(cookies, headers, inner))]
pub async fn sync_videos(
    cookies: Cookies,
    headers: HeaderMap,
    State(inner): State<InnerState>,
) -> Result<Json<Vec<Video>>, AppError> {
    let start_time = std::time::Instant::now();
    tracing::info!("Starting sync_videos request");

    let InnerState { db, youtube } = inner;

    let auth_token = request_token(&headers, &cookies).unwrap_or_default();

    if auth_token.is_empty() {
        tracing::warn!("sync_videos: Missing authentication token");
        return Err(AppError::Authentication(anyhow::anyhow!("Missing token")));
    }

    let user_id = match get_user_id_from_token(auth_token).await {
        Ok(user_id) => {
            tracing::debug!("sync_videos: Successfully extracted user_id from token");
            user_id
        }
        Err(e) => {
            tracing::error!("sync_videos: Failed to extract user_id from token: {:?}", e);
            return Err(e);
        }
    };

    tracing::info!("sync_videos: Starting sync for user_id: {}", user_id);

    let service = VideoSyncService::new(PgStore::new(db), youtube);
    let report = service.sync_videos(&user_id).await?;

    let duration = start_time.elapsed();
    tracing::info!(
        "sync_videos: Completed in {:?} with {} new videos ({} channels synced, {} skipped)",
        duration,
        report.new_videos.len(),
        report.channels_synced,
        report.channels_skipped
    );
    Ok(Json(report.new_videos))
}

#[tracing::instrument(name = "Get sync status", skip(cookies, headers, inner))]
pub async fn sync_status(
    cookies: Cookies,
    headers: HeaderMap,
    State(inner): State<InnerState>,
) -> Result<Json<SyncJob>, AppError> {
    let InnerState { db, .. } = inner;

    let auth_token = request_token(&headers, &cookies).unwrap_or_default();

    if auth_token.is_empty() {
        tracing::warn!("sync_status: Missing authentication token");
        return Err(AppError::Authentication(anyhow::anyhow!("Missing token")));
    }

    let user_id = get_user_id_from_token(auth_token).await?;

    let store = PgStore::new(db);
    match store.sync_job_for_owner(&user_id).await? {
        Some(job) => Ok(Json(job)),
        None => Err(AppError::NotFound(
            "No sync has run for this user".to_string(),
        )),
    }
}
