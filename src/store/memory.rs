//! In-memory store used by the test suite. One lock guards all tables, so
//! every operation is atomic; in particular `increment_view` mutates under
//! the write lock and concurrent increments cannot lose updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Channel, ChannelChanges, User, Video, VideoChanges, VideoFilter};

use super::{ChannelStore, HealthProbe, StoreError, UserStore, VideoStore};

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

// Rows kept in insertion order, which doubles as creation order
#[derive(Default)]
struct Inner {
    users: Vec<User>,
    channels: Vec<Channel>,
    videos: Vec<Video>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("User already exists".to_string()));
        }
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("User already exists".to_string()));
        }
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username_or_email(&self, ident: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.username == ident || u.email == ident)
            .cloned())
    }

    async fn set_last_login(&self, id: Uuid, when: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
            user.last_login = Some(when);
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelStore for MemoryStore {
    async fn insert(&self, channel: Channel) -> Result<Channel, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.channels.iter().any(|c| c.name == channel.name) {
            return Err(StoreError::Conflict("Channel already exists".to_string()));
        }
        inner.channels.push(channel.clone());
        Ok(channel)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Channel>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.channels.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Channel>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.channels.iter().find(|c| c.name == name).cloned())
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Channel>, StoreError> {
        let inner = self.inner.read().await;
        let mut channels = inner.channels.clone();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(channels
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ChannelChanges,
    ) -> Result<Option<Channel>, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(new_name) = &changes.name {
            if inner.channels.iter().any(|c| c.id != id && &c.name == new_name) {
                return Err(StoreError::Conflict("Channel already exists".to_string()));
            }
        }
        let Some(channel) = inner.channels.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            channel.name = name;
        }
        if let Some(category) = changes.category {
            channel.category = category;
        }
        if let Some(description) = changes.description {
            channel.description = Some(description);
        }
        if let Some(logo_url) = changes.logo_url {
            channel.logo_url = Some(logo_url);
        }
        channel.updated_at = Utc::now();

        Ok(Some(channel.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.channels.len();
        inner.channels.retain(|c| c.id != id);
        Ok(inner.channels.len() < before)
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn insert(&self, video: Video) -> Result<Video, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.videos.iter().any(|v| v.youtube_id == video.youtube_id) {
            return Err(StoreError::Conflict("Video already exists".to_string()));
        }
        inner.videos.push(video.clone());
        Ok(video)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.videos.iter().find(|v| v.id == id).cloned())
    }

    async fn find_by_youtube_id(&self, youtube_id: &str) -> Result<Option<Video>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.videos.iter().find(|v| v.youtube_id == youtube_id).cloned())
    }

    async fn list(&self, filter: VideoFilter) -> Result<Vec<Video>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .videos
            .iter()
            .rev() // newest first
            .filter(|v| filter.channel_id.map_or(true, |id| v.channel_id == id))
            .filter(|v| filter.is_active.map_or(true, |active| v.is_active == active))
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, changes: VideoChanges) -> Result<Option<Video>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(video) = inner.videos.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            video.title = title;
        }
        if let Some(description) = changes.description {
            video.description = Some(description);
        }
        if let Some(thumbnail_url) = changes.thumbnail_url {
            video.thumbnail_url = Some(thumbnail_url);
        }
        if let Some(duration_seconds) = changes.duration_seconds {
            video.duration_seconds = Some(duration_seconds);
        }
        if let Some(view_count) = changes.view_count {
            video.view_count = view_count;
        }
        if let Some(is_live) = changes.is_live {
            video.is_live = is_live;
        }
        if let Some(is_active) = changes.is_active {
            video.is_active = is_active;
        }
        video.updated_at = Utc::now();

        Ok(Some(video.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.videos.len();
        inner.videos.retain(|v| v.id != id);
        Ok(inner.videos.len() < before)
    }

    async fn increment_view(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(video) = inner.videos.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };
        video.view_count += 1;
        video.updated_at = Utc::now();
        Ok(Some(video.clone()))
    }

    async fn count_by_channel(&self, channel_id: Uuid) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.videos.iter().filter(|v| v.channel_id == channel_id).count() as i64)
    }
}

#[async_trait]
impl HealthProbe for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
