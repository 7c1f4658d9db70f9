use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::models::video::YOUTUBE_ID_LEN;
use crate::models::{Video, VideoChanges, VideoCreate, VideoFilter, VideoListQuery, VideoUpdate};
use crate::store::{ChannelStore, VideoStore};

use super::{page_params, ServiceError};

pub struct VideoService {
    videos: Arc<dyn VideoStore>,
    // Needed to verify the channel a new video points at actually exists
    channels: Arc<dyn ChannelStore>,
    api: ApiConfig,
}

impl VideoService {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        channels: Arc<dyn ChannelStore>,
        api: ApiConfig,
    ) -> Self {
        Self { videos, channels, api }
    }

    pub async fn create(&self, data: VideoCreate) -> Result<Video, ServiceError> {
        validate_title(&data.title)?;
        validate_youtube_id(&data.youtube_id)?;
        if let Some(duration) = data.duration_seconds {
            validate_duration(duration)?;
        }
        let view_count = data.view_count.unwrap_or(0);
        validate_view_count(view_count)?;

        // A video must never reference a channel that does not exist
        if self.channels.find(data.channel_id).await?.is_none() {
            return Err(ServiceError::field_error(
                "channel_id",
                format!("Channel with ID {} does not exist", data.channel_id),
            ));
        }

        if self.videos.find_by_youtube_id(&data.youtube_id).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Video with YouTube ID '{}' already exists",
                data.youtube_id
            )));
        }

        let now = Utc::now();
        let video = self
            .videos
            .insert(Video {
                id: Uuid::new_v4(),
                title: data.title,
                description: data.description,
                youtube_id: data.youtube_id,
                channel_id: data.channel_id,
                thumbnail_url: data.thumbnail_url,
                duration_seconds: data.duration_seconds,
                view_count,
                is_live: data.is_live.unwrap_or(false),
                is_active: data.is_active.unwrap_or(true),
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Created video {} ({})", video.youtube_id, video.id);
        Ok(video)
    }

    /// Conjunctive filters, newest first
    pub async fn list(&self, query: VideoListQuery) -> Result<Vec<Video>, ServiceError> {
        let (skip, limit) = page_params(&self.api, query.skip, query.limit);
        let filter = VideoFilter {
            channel_id: query.channel_id,
            is_active: query.is_active,
            skip,
            limit,
        };
        Ok(self.videos.list(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Video, ServiceError> {
        self.videos
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Video with ID {} not found", id)))
    }

    pub async fn get_by_youtube_id(&self, youtube_id: &str) -> Result<Video, ServiceError> {
        self.videos
            .find_by_youtube_id(youtube_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Video with YouTube ID '{}' not found",
                    youtube_id
                ))
            })
    }

    /// Merge only the provided fields, re-validating each one
    pub async fn update(&self, id: Uuid, data: VideoUpdate) -> Result<Video, ServiceError> {
        if let Some(title) = &data.title {
            validate_title(title)?;
        }
        if let Some(duration) = data.duration_seconds {
            validate_duration(duration)?;
        }
        if let Some(view_count) = data.view_count {
            validate_view_count(view_count)?;
        }

        self.videos
            .update(id, VideoChanges::from(data))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Video with ID {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.videos.delete(id).await? {
            return Err(ServiceError::NotFound(format!(
                "Video with ID {} not found",
                id
            )));
        }
        info!("Deleted video {}", id);
        Ok(())
    }

    /// Atomic view-count bump, delegated to the store layer
    pub async fn increment_view(&self, id: Uuid) -> Result<Video, ServiceError> {
        self.videos
            .increment_view(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Video with ID {} not found", id)))
    }
}

fn validate_title(title: &str) -> Result<(), ServiceError> {
    if title.is_empty() || title.len() > 500 {
        return Err(ServiceError::field_error(
            "title",
            "Title must be between 1 and 500 characters",
        ));
    }
    Ok(())
}

fn validate_youtube_id(youtube_id: &str) -> Result<(), ServiceError> {
    if youtube_id.chars().count() != YOUTUBE_ID_LEN {
        return Err(ServiceError::field_error(
            "youtube_id",
            format!("YouTube ID must be exactly {} characters", YOUTUBE_ID_LEN),
        ));
    }
    Ok(())
}

fn validate_duration(duration: i32) -> Result<(), ServiceError> {
    if duration < 0 {
        return Err(ServiceError::field_error(
            "duration_seconds",
            "Duration must not be negative",
        ));
    }
    Ok(())
}

fn validate_view_count(view_count: i64) -> Result<(), ServiceError> {
    if view_count < 0 {
        return Err(ServiceError::field_error(
            "view_count",
            "View count must not be negative",
        ));
    }
    Ok(())
}
