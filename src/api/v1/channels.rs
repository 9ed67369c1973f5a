use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::api::common::middleware::request_token;
use crate::api::common::utils::timeout_query;
use crate::api::v1::auth::get_user_id_from_token;
use crate::api::v1::entities::channels::Channel;
use crate::errors::AppError;
use crate::InnerState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    /// Display name to register; the remote channel id starts unresolved
    /// and is filled in by the next sync.
    pub name: String,
}

#[tracing::instrument(name = "Get all channels for user", skip(cookies, headers, inner))]
pub async fn all_channels(
    cookies: Cookies,
    headers: HeaderMap,
    State(inner): State<InnerState>,
) -> Result<Json<Vec<Channel>>, AppError> {
    let start_time = std::time::Instant::now();
    tracing::info!("Starting all_channels request");

    let fetch_channels_timeout = tokio::time::Duration::from_millis(10000);
    let InnerState { db, .. } = inner;

    let auth_token = request_token(&headers, &cookies).unwrap_or_default();

    if auth_token.is_empty() {
        tracing::warn!("all_channels: Missing authentication token");
        return Err(AppError::Authentication(anyhow::anyhow!("Missing token")));
    }

    let user_id = match get_user_id_from_token(auth_token).await {
        Ok(user_id) => {
            tracing::debug!("all_channels: Successfully extracted user_id from token");
            user_id
        }
        Err(e) => {
            tracing::error!("all_channels: Failed to extract user_id from token: {:?}", e);
            return Err(e);
        }
    };

    tracing::info!("all_channels: Fetching channels for user_id: {}", user_id);

    let channels = match tokio::time::timeout(
        fetch_channels_timeout,
        sqlx::query_as::<_, Channel>(
            r#"SELECT * FROM youtube_channels WHERE user_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(&user_id)
        .fetch_all(&db),
    )
    .await
    {
        Ok(Ok(channels)) => {
            tracing::info!(
                "all_channels: Successfully fetched {} channels",
                channels.len()
            );
            channels
        }
        Ok(Err(e)) => {
            tracing::error!(
                "all_channels: Database error while fetching channels: {:?}",
                e
            );
            return Err(AppError::from(e));
        }
        Err(elapsed) => {
            tracing::error!("all_channels: Timeout while fetching channels: {:?}", elapsed);
            return Err(AppError::Database(anyhow::anyhow!(
                "Database query timeout after {:?}",
                fetch_channels_timeout
            )));
        }
    };

    let duration = start_time.elapsed();
    tracing::info!("all_channels: Completed successfully in {:?}", duration);
    Ok(Json(channels))
}

#[tracing::instrument(name = "Create new channel", skip(cookies, headers, inner, payload), fields(channel_name = %payload.name))]
pub async fn create_channel(
    cookies: Cookies,
    headers: HeaderMap,
    State(inner): State<InnerState>,
    Json(payload): Json<CreateChannelRequest>,
) -> Result<Json<Channel>, AppError> {
    let start_time = std::time::Instant::now();
    tracing::info!("Starting create_channel request");

    let create_channel_timeout = tokio::time::Duration::from_millis(10000);
    let InnerState { db, .. } = inner;

    let auth_token = request_token(&headers, &cookies).unwrap_or_default();

    if auth_token.is_empty() {
        tracing::warn!("create_channel: Missing authentication token");
        return Err(AppError::Authentication(anyhow::anyhow!("Missing token")));
    }

    let user_id = match get_user_id_from_token(auth_token).await {
        Ok(user_id) => {
            tracing::debug!("create_channel: Successfully extracted user_id from token");
            user_id
        }
        Err(e) => {
            tracing::error!(
                "create_channel: Failed to extract user_id from token: {:?}",
                e
            );
            return Err(e);
        }
    };

    let name = payload.name.trim();
    if name.is_empty() {
        tracing::warn!("create_channel: Rejected empty channel name");
        return Err(AppError::Validation(
            "Channel name must not be empty".to_string(),
        ));
    }

    let uuid = Uuid::new_v4().to_string();
    tracing::info!(
        "create_channel: Creating channel with id: {}, name: {}, user_id: {}",
        uuid,
        name,
        user_id
    );

    let created_channel = match tokio::time::timeout(
        create_channel_timeout,
        sqlx::query_as::<_, Channel>(
            r#"INSERT INTO youtube_channels (id, user_id, name) VALUES ($1, $2, $3) RETURNING *"#,
        )
        .bind(&uuid)
        .bind(&user_id)
        .bind(name)
        .fetch_one(&db),
    )
    .await
    {
        Ok(Ok(channel)) => {
            tracing::info!(
                "create_channel: Successfully created channel with id: {}",
                uuid
            );
            channel
        }
        Ok(Err(e)) => {
            tracing::error!(
                "create_channel: Database error while creating channel: {:?}",
                e
            );
            return Err(AppError::from(e));
        }
        Err(elapsed) => {
            tracing::error!(
                "create_channel: Timeout while creating channel: {:?}",
                elapsed
            );
            return Err(AppError::Database(anyhow::anyhow!(
                "Database query timeout after {:?}",
                create_channel_timeout
            )));
        }
    };

    let duration = start_time.elapsed();
    tracing::info!("create_channel: Completed successfully in {:?}", duration);
    Ok(Json(created_channel))
}

#[tracing::instrument(name = "Delete channel", skip(cookies, headers, inner), fields(channel_id = %channel_id))]
pub async fn delete_channel(
    cookies: Cookies,
    headers: HeaderMap,
    State(inner): State<InnerState>,
    Path(channel_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let delete_channel_timeout = tokio::time::Duration::from_millis(10000);
    let InnerState { db, .. } = inner;

    let auth_token = request_token(&headers, &cookies).unwrap_or_default();

    if auth_token.is_empty() {
        tracing::warn!("delete_channel: Missing authentication token");
        return Err(AppError::Authentication(anyhow::anyhow!("Missing token")));
    }

    let user_id = get_user_id_from_token(auth_token).await?;

    let result = timeout_query(
        delete_channel_timeout,
        sqlx::query(r#"DELETE FROM youtube_channels WHERE id = $1 AND user_id = $2"#)
            .bind(&channel_id)
            .bind(&user_id)
            .execute(&db),
    )
    .await?;

    if result.rows_affected() == 0 {
        tracing::warn!(
            "delete_channel: No channel {} found for user {}",
            channel_id,
            user_id
        );
        return Err(AppError::NotFound("Channel not found".to_string()));
    }

    tracing::info!("delete_channel: Deleted channel {}", channel_id);
    Ok(Json(json!({ "deleted": channel_id })))
}
