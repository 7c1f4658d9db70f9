//! Persistence abstraction. Each entity gets one store trait so services
//! can be wired against Postgres in production and the in-memory store in
//! tests without touching business logic.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Channel, ChannelChanges, User, Video, VideoChanges, VideoFilter};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Errors surfaced by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> Result<User, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Lookup for login, where the identifier may be a username or an email
    async fn find_by_username_or_email(&self, ident: &str) -> Result<Option<User>, StoreError>;
    async fn set_last_login(&self, id: Uuid, when: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn insert(&self, channel: Channel) -> Result<Channel, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Channel>, StoreError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Channel>, StoreError>;
    /// Channels in name order
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Channel>, StoreError>;
    /// Apply the given changes in one store-level operation. Returns `None`
    /// when the channel does not exist.
    async fn update(&self, id: Uuid, changes: ChannelChanges)
        -> Result<Option<Channel>, StoreError>;
    /// Returns whether a row was actually removed
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn insert(&self, video: Video) -> Result<Video, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Video>, StoreError>;
    async fn find_by_youtube_id(&self, youtube_id: &str) -> Result<Option<Video>, StoreError>;
    /// Videos matching the filter, newest first
    async fn list(&self, filter: VideoFilter) -> Result<Vec<Video>, StoreError>;
    async fn update(&self, id: Uuid, changes: VideoChanges) -> Result<Option<Video>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    /// Atomic increment. Must not lose updates under concurrent calls on the
    /// same id, so implementations mutate in a single store-level operation
    /// rather than read-modify-write in application code.
    async fn increment_view(&self, id: Uuid) -> Result<Option<Video>, StoreError>;
    /// How many videos still reference the channel
    async fn count_by_channel(&self, channel_id: Uuid) -> Result<i64, StoreError>;
}

/// Liveness probe for the health endpoint
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}
