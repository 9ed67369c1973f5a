//! API Version 1 endpoints
//!
//! Channel registration, synced videos/comments and the sync trigger.
//! Everything here requires an authenticated caller.

pub mod auth;
pub mod channels;
pub mod entities;
pub mod services;
pub mod sync;
pub mod videos;

use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_cookies::CookieManagerLayer;

use crate::api::common::middleware::auth_middleware;
use crate::InnerState;

/// Creates the V1 API router
#[tracing::instrument(name = "create_v1_router", skip(state))]
pub fn create_v1_router(state: InnerState) -> Router {
    tracing::info!("Creating V1 API router");

    Router::new()
        .route("/api/v1/channels", get(channels::all_channels))
        .route("/api/v1/channels", post(channels::create_channel))
        .route("/api/v1/channels/:channel_id", delete(channels::delete_channel))

        .route("/api/v1/videos", get(videos::all_videos))
        .route("/api/v1/videos/:video_id/comments", get(videos::video_comments))

        .route("/api/v1/videos/sync", post(sync::sync_videos))
        .route("/api/v1/videos/sync/status", get(sync::sync_status))

        .layer(CookieManagerLayer::new())
        .layer(middleware::from_fn(auth_middleware))
        .with_state(state)
}
