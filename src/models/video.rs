use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// YouTube video ids are always exactly this long
pub const YOUTUBE_ID_LEN: usize = 11;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub youtube_id: String,
    pub channel_id: Uuid,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub view_count: i64,
    pub is_live: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoCreate {
    pub title: String,
    pub description: Option<String>,
    pub youtube_id: String,
    pub channel_id: Uuid,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i32>,
    #[serde(default)]
    pub view_count: Option<i64>,
    #[serde(default)]
    pub is_live: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update. The youtube_id and channel_id are immutable once set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub view_count: Option<i64>,
    pub is_live: Option<bool>,
    pub is_active: Option<bool>,
}

/// Validated field changes handed to the store
#[derive(Debug, Clone, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub view_count: Option<i64>,
    pub is_live: Option<bool>,
    pub is_active: Option<bool>,
}

impl From<VideoUpdate> for VideoChanges {
    fn from(update: VideoUpdate) -> Self {
        Self {
            title: update.title,
            description: update.description,
            thumbnail_url: update.thumbnail_url,
            duration_seconds: update.duration_seconds,
            view_count: update.view_count,
            is_live: update.is_live,
            is_active: update.is_active,
        }
    }
}

/// Query-string parameters accepted by the video list endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListQuery {
    pub channel_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Resolved list filter applied conjunctively by the store
#[derive(Debug, Clone)]
pub struct VideoFilter {
    pub channel_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub skip: i64,
    pub limit: i64,
}
