//! Postgres-backed [`SyncStore`].

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::v1::entities::channels::Channel;
use crate::api::v1::entities::comments::NewComment;
use crate::api::v1::entities::sync_jobs::{SyncJob, SyncJobStatus};
use crate::api::v1::entities::videos::{NewVideo, Video};
use crate::errors::AppError;

use super::{SyncJobCompletion, SyncStore, VideoWrite};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStore for PgStore {
    async fn channels_for_owner(&self, user_id: &str) -> Result<Vec<Channel>, AppError> {
        let channels = sqlx::query_as::<_, Channel>(
            "SELECT * FROM youtube_channels WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }

    async fn set_channel_remote_id(&self, id: &str, remote_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE youtube_channels SET channel_id = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(remote_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_video_if_absent(&self, video: NewVideo) -> Result<VideoWrite, AppError> {
        // ON CONFLICT DO NOTHING keeps the first-synced snapshot intact
        // when two runs race on the same (user_id, video_id) pair.
        let inserted = sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos
                (id, user_id, video_id, title, description, published_at, thumbnail_url,
                 channel_id, channel_title, view_count, like_count, dislike_count, comment_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id, video_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&video.user_id)
        .bind(&video.video_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.published_at)
        .bind(&video.thumbnail_url)
        .bind(&video.channel_id)
        .bind(&video.channel_title)
        .bind(video.view_count)
        .bind(video.like_count)
        .bind(video.dislike_count)
        .bind(video.comment_count)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok(VideoWrite::Created(row)),
            None => {
                let existing = sqlx::query_as::<_, Video>(
                    "SELECT * FROM videos WHERE user_id = $1 AND video_id = $2",
                )
                .bind(&video.user_id)
                .bind(&video.video_id)
                .fetch_one(&self.pool)
                .await?;

                Ok(VideoWrite::Existing(existing))
            }
        }
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO video_comments
                (id, video_id, user_id, comment_text, like_count, dislike_count, published_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&comment.video_id)
        .bind(&comment.user_id)
        .bind(&comment.comment_text)
        .bind(comment.like_count)
        .bind(comment.published_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn begin_sync_job(&self, user_id: &str) -> Result<Option<SyncJob>, AppError> {
        // The conditional upsert claims the per-user slot atomically;
        // no row comes back while another run is still `running`.
        let job = sqlx::query_as::<_, SyncJob>(
            r#"
            INSERT INTO sync_jobs (id, user_id, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
                SET id = EXCLUDED.id,
                    status = EXCLUDED.status,
                    started_at = now(),
                    finished_at = NULL,
                    new_videos = 0,
                    channels_synced = 0,
                    channels_skipped = 0,
                    error = NULL
                WHERE sync_jobs.status <> $3
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(SyncJobStatus::Running.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn finish_sync_job(
        &self,
        user_id: &str,
        completion: SyncJobCompletion,
    ) -> Result<SyncJob, AppError> {
        let job = sqlx::query_as::<_, SyncJob>(
            r#"
            UPDATE sync_jobs
            SET status = $2,
                finished_at = now(),
                new_videos = $3,
                channels_synced = $4,
                channels_skipped = $5,
                error = $6
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(completion.status.as_str())
        .bind(completion.new_videos)
        .bind(completion.channels_synced)
        .bind(completion.channels_skipped)
        .bind(&completion.error)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    async fn sync_job_for_owner(&self, user_id: &str) -> Result<Option<SyncJob>, AppError> {
        let job = sqlx::query_as::<_, SyncJob>("SELECT * FROM sync_jobs WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }
}
