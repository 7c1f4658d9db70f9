use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::models::channel::ALLOWED_CATEGORIES;
use crate::models::{Channel, ChannelChanges, ChannelCreate, ChannelUpdate};
use crate::store::{ChannelStore, VideoStore};

use super::{page_params, ServiceError};

pub struct ChannelService {
    channels: Arc<dyn ChannelStore>,
    // Needed to refuse deleting a channel that still has videos
    videos: Arc<dyn VideoStore>,
    api: ApiConfig,
}

impl ChannelService {
    pub fn new(
        channels: Arc<dyn ChannelStore>,
        videos: Arc<dyn VideoStore>,
        api: ApiConfig,
    ) -> Self {
        Self { channels, videos, api }
    }

    pub async fn list(
        &self,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Channel>, ServiceError> {
        let (skip, limit) = page_params(&self.api, skip, limit);
        Ok(self.channels.list(skip, limit).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Channel, ServiceError> {
        self.channels
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Channel with ID {} not found", id)))
    }

    pub async fn create(
        &self,
        data: ChannelCreate,
        owner_id: Option<Uuid>,
    ) -> Result<Channel, ServiceError> {
        validate_name(&data.name)?;
        validate_category(&data.category)?;

        if self.channels.find_by_name(&data.name).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Channel '{}' already exists",
                data.name
            )));
        }

        let now = Utc::now();
        let channel = self
            .channels
            .insert(Channel {
                id: Uuid::new_v4(),
                name: data.name,
                category: data.category,
                description: data.description,
                logo_url: data.logo_url,
                owner_id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Created channel {} ({})", channel.name, channel.id);
        Ok(channel)
    }

    /// Merge only the provided fields, re-validating each one
    pub async fn update(&self, id: Uuid, data: ChannelUpdate) -> Result<Channel, ServiceError> {
        if let Some(name) = &data.name {
            validate_name(name)?;
            if let Some(existing) = self.channels.find_by_name(name).await? {
                if existing.id != id {
                    return Err(ServiceError::Conflict(format!(
                        "Channel '{}' already exists",
                        name
                    )));
                }
            }
        }
        if let Some(category) = &data.category {
            validate_category(category)?;
        }

        let changes = ChannelChanges::from(data);
        if changes.is_empty() {
            return self.get(id).await;
        }

        self.channels
            .update(id, changes)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Channel with ID {} not found", id)))
    }

    /// Deletion policy: refuse while videos still reference the channel,
    /// rather than cascading or orphaning them.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        // Existence check first so an absent channel is NotFound, not Conflict
        self.get(id).await?;

        let video_count = self.videos.count_by_channel(id).await?;
        if video_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "Channel has {} videos; delete them first",
                video_count
            )));
        }

        if !self.channels.delete(id).await? {
            return Err(ServiceError::NotFound(format!(
                "Channel with ID {} not found",
                id
            )));
        }

        info!("Deleted channel {}", id);
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.is_empty() || name.len() > 255 {
        return Err(ServiceError::field_error(
            "name",
            "Channel name must be between 1 and 255 characters",
        ));
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), ServiceError> {
    if !ALLOWED_CATEGORIES.contains(&category) {
        let mut field_errors = HashMap::new();
        field_errors.insert(
            "category".to_string(),
            format!("Category must be one of: {}", ALLOWED_CATEGORIES.join(", ")),
        );
        return Err(ServiceError::Validation {
            message: format!("Unknown category '{}'", category),
            field_errors: Some(field_errors),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{VideoCreate, VideoListQuery};
    use crate::services::VideoService;
    use crate::store::MemoryStore;

    fn services() -> (ChannelService, VideoService) {
        let store = Arc::new(MemoryStore::default());
        let api = AppConfig::default().api;
        (
            ChannelService::new(store.clone(), store.clone(), api.clone()),
            VideoService::new(store.clone(), store, api),
        )
    }

    fn tech_channel() -> ChannelCreate {
        ChannelCreate {
            name: "Tech".to_string(),
            category: "knowledge".to_string(),
            description: Some("Technology talks".to_string()),
            logo_url: None,
        }
    }

    #[tokio::test]
    async fn create_get_round_trip() {
        let (channels, _) = services();
        let owner = Uuid::new_v4();
        let created = channels.create(tech_channel(), Some(owner)).await.unwrap();
        assert_eq!(created.owner_id, Some(owner));

        let fetched = channels.get(created.id).await.unwrap();
        assert_eq!(fetched.name, "Tech");
    }

    #[tokio::test]
    async fn empty_name_fails_validation() {
        let (channels, _) = services();
        let mut data = tech_channel();
        data.name = String::new();

        assert!(matches!(
            channels.create(data, None).await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_category_fails_validation() {
        let (channels, _) = services();
        let mut data = tech_channel();
        data.category = "cooking".to_string();

        assert!(matches!(
            channels.create(data, None).await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let (channels, _) = services();
        channels.create(tech_channel(), None).await.unwrap();

        assert!(matches!(
            channels.create(tech_channel(), None).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn update_merges_only_provided_fields() {
        let (channels, _) = services();
        let created = channels.create(tech_channel(), None).await.unwrap();

        let updated = channels
            .update(
                created.id,
                ChannelUpdate {
                    description: Some("Updated description".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Tech");
        assert_eq!(updated.description.as_deref(), Some("Updated description"));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (channels, _) = services();
        let created = channels.create(tech_channel(), None).await.unwrap();

        channels.delete(created.id).await.unwrap();
        assert!(matches!(
            channels.get(created.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let (channels, _) = services();
        assert!(matches!(
            channels.delete(Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_refused_while_videos_remain() {
        let (channels, videos) = services();
        let channel = channels.create(tech_channel(), None).await.unwrap();

        let video = videos
            .create(VideoCreate {
                title: "Intro".to_string(),
                description: None,
                youtube_id: "dQw4w9WgXcQ".to_string(),
                channel_id: channel.id,
                thumbnail_url: None,
                duration_seconds: Some(213),
                view_count: None,
                is_live: None,
                is_active: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            channels.delete(channel.id).await,
            Err(ServiceError::Conflict(_))
        ));

        // After the video goes away the channel can be deleted
        videos.delete(video.id).await.unwrap();
        channels.delete(channel.id).await.unwrap();

        let remaining = videos
            .list(VideoListQuery {
                channel_id: Some(channel.id),
                is_active: None,
                skip: None,
                limit: None,
            })
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }
}
