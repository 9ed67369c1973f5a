//! In-memory [`SyncStore`] mirroring the Postgres write semantics,
//! used by pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::api::v1::entities::channels::Channel;
use crate::api::v1::entities::comments::{NewComment, VideoComment};
use crate::api::v1::entities::sync_jobs::{SyncJob, SyncJobStatus};
use crate::api::v1::entities::videos::{NewVideo, Video};
use crate::errors::AppError;

use super::{SyncJobCompletion, SyncStore, VideoWrite};

#[derive(Default)]
struct MemoryState {
    channels: Vec<Channel>,
    videos: Vec<Video>,
    comments: Vec<VideoComment>,
    jobs: HashMap<String, SyncJob>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_channel(&self, user_id: &str, name: &str, remote_id: Option<&str>) -> Channel {
        let now = Utc::now().naive_utc();
        let channel = Channel {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            channel_id: remote_id.map(|s| s.to_string()),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().channels.push(channel.clone());
        channel
    }

    pub fn videos(&self) -> Vec<Video> {
        self.state.lock().unwrap().videos.clone()
    }

    pub fn comments(&self) -> Vec<VideoComment> {
        self.state.lock().unwrap().comments.clone()
    }

    pub fn comments_for_video(&self, video_id: &str) -> Vec<VideoComment> {
        self.state
            .lock()
            .unwrap()
            .comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .cloned()
            .collect()
    }

    pub fn channel(&self, id: &str) -> Option<Channel> {
        self.state
            .lock()
            .unwrap()
            .channels
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn job_for(&self, user_id: &str) -> Option<SyncJob> {
        self.state.lock().unwrap().jobs.get(user_id).cloned()
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn channels_for_owner(&self, user_id: &str) -> Result<Vec<Channel>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .channels
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_channel_remote_id(&self, id: &str, remote_id: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some(channel) = state.channels.iter_mut().find(|c| c.id == id) {
            channel.channel_id = Some(remote_id.to_string());
            channel.updated_at = Utc::now().naive_utc();
        }
        Ok(())
    }

    async fn insert_video_if_absent(&self, video: NewVideo) -> Result<VideoWrite, AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .videos
            .iter()
            .find(|v| v.user_id == video.user_id && v.video_id == video.video_id)
        {
            return Ok(VideoWrite::Existing(existing.clone()));
        }

        let now = Utc::now().naive_utc();
        let row = Video {
            id: Uuid::new_v4().to_string(),
            user_id: video.user_id,
            video_id: video.video_id,
            title: video.title,
            description: video.description,
            published_at: video.published_at,
            thumbnail_url: video.thumbnail_url,
            channel_id: video.channel_id,
            channel_title: video.channel_title,
            view_count: video.view_count,
            like_count: video.like_count,
            dislike_count: video.dislike_count,
            comment_count: video.comment_count,
            created_at: now,
            updated_at: now,
        };
        state.videos.push(row.clone());
        Ok(VideoWrite::Created(row))
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<(), AppError> {
        let now = Utc::now().naive_utc();
        self.state.lock().unwrap().comments.push(VideoComment {
            id: Uuid::new_v4().to_string(),
            video_id: comment.video_id,
            user_id: comment.user_id,
            comment_text: comment.comment_text,
            like_count: comment.like_count,
            dislike_count: 0,
            published_at: comment.published_at,
            is_used: false,
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn begin_sync_job(&self, user_id: &str) -> Result<Option<SyncJob>, AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some(job) = state.jobs.get(user_id) {
            if job.is_running() {
                return Ok(None);
            }
        }

        let job = SyncJob {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: SyncJobStatus::Running.as_str().to_string(),
            started_at: Utc::now().naive_utc(),
            finished_at: None,
            new_videos: 0,
            channels_synced: 0,
            channels_skipped: 0,
            error: None,
        };
        state.jobs.insert(user_id.to_string(), job.clone());
        Ok(Some(job))
    }

    async fn finish_sync_job(
        &self,
        user_id: &str,
        completion: SyncJobCompletion,
    ) -> Result<SyncJob, AppError> {
        let mut state = self.state.lock().unwrap();
        let job = state
            .jobs
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound("No sync job to finish".to_string()))?;

        job.status = completion.status.as_str().to_string();
        job.finished_at = Some(Utc::now().naive_utc());
        job.new_videos = completion.new_videos;
        job.channels_synced = completion.channels_synced;
        job.channels_skipped = completion.channels_skipped;
        job.error = completion.error;
        Ok(job.clone())
    }

    async fn sync_job_for_owner(&self, user_id: &str) -> Result<Option<SyncJob>, AppError> {
        Ok(self.state.lock().unwrap().jobs.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_video(user_id: &str, video_id: &str) -> NewVideo {
        NewVideo {
            user_id: user_id.to_string(),
            video_id: video_id.to_string(),
            title: "a title".to_string(),
            description: Some("a description".to_string()),
            published_at: Utc::now().naive_utc(),
            thumbnail_url: Some("http://img/max.jpg".to_string()),
            channel_id: "UC123".to_string(),
            channel_title: "My Channel".to_string(),
            view_count: 10,
            like_count: 2,
            dislike_count: 0,
            comment_count: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_video_if_absent_keeps_first_row() {
        let store = MemoryStore::new();

        let first = store.insert_video_if_absent(new_video("u1", "v1")).await.unwrap();
        assert!(first.is_created());

        let mut changed = new_video("u1", "v1");
        changed.title = "a newer title".to_string();
        let second = store.insert_video_if_absent(changed).await.unwrap();
        assert!(!second.is_created());
        assert_eq!(second.into_video().title, "a title");

        assert_eq!(store.videos().len(), 1);
    }

    #[tokio::test]
    async fn test_same_video_id_under_two_owners_makes_two_rows() {
        let store = MemoryStore::new();

        assert!(store.insert_video_if_absent(new_video("u1", "v1")).await.unwrap().is_created());
        assert!(store.insert_video_if_absent(new_video("u2", "v1")).await.unwrap().is_created());

        assert_eq!(store.videos().len(), 2);
    }

    #[tokio::test]
    async fn test_begin_sync_job_rejects_overlap() {
        let store = MemoryStore::new();

        let first = store.begin_sync_job("u1").await.unwrap();
        assert!(first.is_some());

        let overlapping = store.begin_sync_job("u1").await.unwrap();
        assert!(overlapping.is_none());

        // other owners are unaffected
        assert!(store.begin_sync_job("u2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_finished_job_slot_can_be_reclaimed() {
        let store = MemoryStore::new();

        store.begin_sync_job("u1").await.unwrap();
        let finished = store
            .finish_sync_job(
                "u1",
                SyncJobCompletion {
                    status: SyncJobStatus::Completed,
                    new_videos: 3,
                    channels_synced: 2,
                    channels_skipped: 1,
                    error: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(finished.status, "completed");
        assert_eq!(finished.new_videos, 3);
        assert!(finished.finished_at.is_some());

        let reclaimed = store.begin_sync_job("u1").await.unwrap();
        assert!(reclaimed.is_some());
        assert!(store.job_for("u1").unwrap().is_running());
    }
}
