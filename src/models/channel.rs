use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Categories a channel may belong to
pub const ALLOWED_CATEGORIES: &[&str] = &["sport", "entertainment", "kids", "knowledge", "gaming"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Channel {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    /// User that created the channel
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelCreate {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

/// Validated field changes handed to the store. Only present fields are
/// written; `updated_at` is bumped by the store itself.
#[derive(Debug, Clone, Default)]
pub struct ChannelChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

impl From<ChannelUpdate> for ChannelChanges {
    fn from(update: ChannelUpdate) -> Self {
        Self {
            name: update.name,
            category: update.category,
            description: update.description,
            logo_url: update.logo_url,
        }
    }
}

impl ChannelChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.logo_url.is_none()
    }
}
