//! Persistence seam used by the video sync pipeline.
//!
//! Handlers talk to Postgres directly; the pipeline goes through
//! [`SyncStore`] so it can run against an in-memory store in tests.

use async_trait::async_trait;

use crate::api::v1::entities::channels::Channel;
use crate::api::v1::entities::comments::NewComment;
use crate::api::v1::entities::sync_jobs::{SyncJob, SyncJobStatus};
use crate::api::v1::entities::videos::{NewVideo, Video};
use crate::errors::AppError;

pub mod postgres;

#[cfg(test)]
pub mod memory;

/// Outcome of an insert-if-absent video write.
#[derive(Debug, Clone)]
pub enum VideoWrite {
    /// This call inserted the row.
    Created(Video),
    /// A row with the same (owner, remote video) pair already existed.
    /// The stored row is carried back unchanged.
    Existing(Video),
}

impl VideoWrite {
    pub fn is_created(&self) -> bool {
        matches!(self, VideoWrite::Created(_))
    }

    pub fn into_video(self) -> Video {
        match self {
            VideoWrite::Created(video) | VideoWrite::Existing(video) => video,
        }
    }
}

/// Final counters written to a sync job when a run ends.
#[derive(Debug, Clone)]
pub struct SyncJobCompletion {
    pub status: SyncJobStatus,
    pub new_videos: i32,
    pub channels_synced: i32,
    pub channels_skipped: i32,
    pub error: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Channels registered by an owner, oldest first.
    async fn channels_for_owner(&self, user_id: &str) -> Result<Vec<Channel>, AppError>;

    /// Persists a freshly resolved remote channel id.
    async fn set_channel_remote_id(&self, id: &str, remote_id: &str) -> Result<(), AppError>;

    /// Inserts a video unless the owner already has one with the same
    /// remote id. Existing rows are never modified.
    async fn insert_video_if_absent(&self, video: NewVideo) -> Result<VideoWrite, AppError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<(), AppError>;

    /// Claims the sync job slot for an owner. Returns the fresh
    /// `running` job, or `None` when another run currently holds it.
    async fn begin_sync_job(&self, user_id: &str) -> Result<Option<SyncJob>, AppError>;

    /// Releases the job slot, recording counters and final status.
    async fn finish_sync_job(
        &self,
        user_id: &str,
        completion: SyncJobCompletion,
    ) -> Result<SyncJob, AppError>;

    /// Most recent sync job for an owner, if any run ever happened.
    async fn sync_job_for_owner(&self, user_id: &str) -> Result<Option<SyncJob>, AppError>;
}
