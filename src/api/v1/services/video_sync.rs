//! Channel video sync pipeline.
//!
//! Walks every channel registered by an owner: resolves missing remote
//! channel ids, enumerates the channel's videos, stores the ones not
//! seen before and captures top-level comments for each newly stored
//! video. Remote failures degrade to partial results; only a missing
//! owner or an empty channel list abort the run.

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::api::v1::entities::channels::Channel;
use crate::api::v1::entities::comments::NewComment;
use crate::api::v1::entities::sync_jobs::SyncJobStatus;
use crate::api::v1::entities::videos::{NewVideo, Video};
use crate::errors::AppError;
use crate::store::{SyncJobCompletion, SyncStore, VideoWrite};

use super::youtube::{FetchOutcome, VideoDetail, YoutubeClient};

const DEFAULT_SYNC_CONCURRENCY: usize = 4;

/// What one sync run produced. `new_videos` keeps channel registration
/// order, then the remote detail order within each channel.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub new_videos: Vec<Video>,
    pub channels_synced: i32,
    pub channels_skipped: i32,
}

enum ChannelSync {
    /// Channel was processed; carries the videos created for it.
    Synced(Vec<Video>),
    /// No remote id could be resolved; nothing was written.
    Skipped,
    /// Storage failed partway through the channel's videos; carries the
    /// rows that were already created so they still reach the report.
    Failed { videos: Vec<Video>, error: AppError },
}

pub struct VideoSyncService<S: SyncStore> {
    store: S,
    youtube: YoutubeClient,
    concurrency: usize,
}

impl<S: SyncStore> VideoSyncService<S> {
    pub fn new(store: S, youtube: YoutubeClient) -> Self {
        let concurrency = std::env::var("SYNC_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SYNC_CONCURRENCY);

        Self {
            store,
            youtube,
            concurrency: concurrency.max(1),
        }
    }

    #[cfg(test)]
    fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs a full sync for one owner and returns the videos created by
    /// this run. Fails before any remote call when the owner has no
    /// channels or another run currently holds the owner's job slot.
    #[tracing::instrument(name = "Sync videos", skip(self))]
    pub async fn sync_videos(&self, user_id: &str) -> Result<SyncReport, AppError> {
        let channels = self.store.channels_for_owner(user_id).await?;
        if channels.is_empty() {
            return Err(AppError::Validation(
                "No channels registered. Add a channel before syncing.".to_string(),
            ));
        }

        let job = match self.store.begin_sync_job(user_id).await? {
            Some(job) => job,
            None => {
                return Err(AppError::Conflict(
                    "A sync is already running for this user".to_string(),
                ));
            }
        };
        info!("Started sync job {} for user {}", job.id, user_id);

        let results: Vec<(String, Result<ChannelSync, AppError>)> = stream::iter(channels)
            .map(|channel| async move {
                let name = channel.name.clone();
                let outcome = self.sync_channel(user_id, &channel).await;
                (name, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = SyncReport::default();
        let mut failures: Vec<String> = Vec::new();
        for (name, outcome) in results {
            match outcome {
                Ok(ChannelSync::Synced(videos)) => {
                    info!("Synced {} new videos for channel {}", videos.len(), name);
                    report.channels_synced += 1;
                    report.new_videos.extend(videos);
                }
                Ok(ChannelSync::Skipped) => {
                    report.channels_skipped += 1;
                }
                Ok(ChannelSync::Failed { videos, error }) => {
                    error!("Failed to sync videos for channel {}: {:?}", name, error);
                    failures.push(format!("{}: {}", name, error));
                    report.new_videos.extend(videos);
                }
                Err(e) => {
                    error!("Failed to sync videos for channel {}: {:?}", name, e);
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }

        let status = if report.channels_synced == 0 && !failures.is_empty() {
            SyncJobStatus::Failed
        } else {
            SyncJobStatus::Completed
        };
        let error = if failures.is_empty() {
            None
        } else {
            Some(failures.join("; "))
        };

        self.store
            .finish_sync_job(
                user_id,
                SyncJobCompletion {
                    status,
                    new_videos: report.new_videos.len() as i32,
                    channels_synced: report.channels_synced,
                    channels_skipped: report.channels_skipped,
                    error,
                },
            )
            .await?;

        info!(
            "Sync finished for user {}: {} new videos, {} channels synced, {} skipped",
            user_id,
            report.new_videos.len(),
            report.channels_synced,
            report.channels_skipped
        );
        Ok(report)
    }

    /// One channel's pass. Remote errors degrade to skip or partial
    /// data. A storage failure during the video writes comes back as
    /// `Failed` carrying the rows created before it; an `Err` is a
    /// storage failure before any video was written. Either way only
    /// this channel fails.
    async fn sync_channel(
        &self,
        user_id: &str,
        channel: &Channel,
    ) -> Result<ChannelSync, AppError> {
        let remote_id = match &channel.channel_id {
            Some(id) => id.clone(),
            None => match self.youtube.search_channel_id(&channel.name).await {
                Ok(Some(id)) => {
                    self.store.set_channel_remote_id(&channel.id, &id).await?;
                    info!("Resolved channel '{}' to {}", channel.name, id);
                    id
                }
                Ok(None) => {
                    warn!("No remote channel found for '{}', skipping", channel.name);
                    return Ok(ChannelSync::Skipped);
                }
                Err(e) => {
                    warn!("Channel lookup failed for '{}', skipping: {}", channel.name, e);
                    return Ok(ChannelSync::Skipped);
                }
            },
        };

        info!("Syncing videos for channel: {}", channel.name);

        let enumeration = self.youtube.list_channel_video_ids(&remote_id).await;
        match &enumeration.outcome {
            FetchOutcome::Complete => {}
            FetchOutcome::Partial(reason) => {
                warn!(
                    "Enumeration for channel {} kept {} ids after early stop: {}",
                    channel.name,
                    enumeration.items.len(),
                    reason
                );
            }
            FetchOutcome::Failed(reason) => {
                warn!("Enumeration for channel {} failed: {}", channel.name, reason);
            }
        }

        if enumeration.items.is_empty() {
            info!("No videos found for channel: {}", channel.name);
            return Ok(ChannelSync::Synced(Vec::new()));
        }

        let details = match self.youtube.fetch_video_details(&enumeration.items).await {
            Ok(details) => details,
            Err(e) => {
                warn!(
                    "Detail fetch for channel {} failed, treating batch as empty: {}",
                    channel.name, e
                );
                Vec::new()
            }
        };

        let writes: Vec<Result<Option<Video>, AppError>> = stream::iter(details)
            .map(|detail| self.store_video_with_comments(user_id, detail))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut new_videos = Vec::new();
        let mut write_error: Option<AppError> = None;
        for write in writes {
            match write {
                Ok(Some(video)) => new_videos.push(video),
                Ok(None) => {}
                Err(e) => {
                    if write_error.is_none() {
                        write_error = Some(e);
                    } else {
                        warn!(
                            "Further video write failure in channel {}: {}",
                            channel.name, e
                        );
                    }
                }
            }
        }

        match write_error {
            Some(error) => Ok(ChannelSync::Failed {
                videos: new_videos,
                error,
            }),
            None => Ok(ChannelSync::Synced(new_videos)),
        }
    }

    /// Inserts one video unless the owner already has it. Comments are
    /// captured only when this call created the row, so an existing
    /// video never gets re-fetched comments.
    async fn store_video_with_comments(
        &self,
        user_id: &str,
        detail: VideoDetail,
    ) -> Result<Option<Video>, AppError> {
        let write = self
            .store
            .insert_video_if_absent(NewVideo {
                user_id: user_id.to_string(),
                video_id: detail.video_id,
                title: detail.title,
                description: Some(detail.description),
                published_at: detail.published_at,
                thumbnail_url: Some(detail.thumbnail_url),
                channel_id: detail.channel_id,
                channel_title: detail.channel_title,
                view_count: detail.view_count,
                like_count: detail.like_count,
                dislike_count: detail.dislike_count,
                comment_count: detail.comment_count,
            })
            .await?;

        let video = match write {
            VideoWrite::Existing(_) => return Ok(None),
            VideoWrite::Created(video) => video,
        };

        let comments = self.youtube.fetch_video_comments(&video.video_id).await;
        match &comments.outcome {
            FetchOutcome::Complete => {}
            FetchOutcome::Partial(reason) | FetchOutcome::Failed(reason) => {
                warn!(
                    "Comment fetch for video {} kept {} comments after early stop: {}",
                    video.video_id,
                    comments.items.len(),
                    reason
                );
            }
        }

        for comment in comments.items {
            self.store
                .insert_comment(NewComment {
                    video_id: video.id.clone(),
                    user_id: user_id.to_string(),
                    comment_text: comment.text,
                    like_count: comment.like_count,
                    published_at: comment.published_at,
                })
                .await?;
        }

        Ok(Some(video))
    }
}
