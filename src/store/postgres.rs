use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::{Channel, ChannelChanges, User, Video, VideoChanges, VideoFilter};

use super::{ChannelStore, HealthProbe, StoreError, UserStore, VideoStore};

/// Postgres-backed implementation of all entity stores, sharing one pool
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;

        info!("Connected to database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the schema if it does not exist yet. Idempotent, run at startup.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id            UUID PRIMARY KEY,
                username      TEXT NOT NULL UNIQUE,
                email         TEXT NOT NULL UNIQUE,
                full_name     TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                is_active     BOOLEAN NOT NULL DEFAULT TRUE,
                is_admin      BOOLEAN NOT NULL DEFAULT FALSE,
                created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                last_login    TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS channels (
                id          UUID PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                category    TEXT NOT NULL,
                description TEXT,
                logo_url    TEXT,
                owner_id    UUID REFERENCES users (id),
                created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                id               UUID PRIMARY KEY,
                title            TEXT NOT NULL,
                description      TEXT,
                youtube_id       VARCHAR(20) NOT NULL UNIQUE,
                channel_id       UUID NOT NULL REFERENCES channels (id),
                thumbnail_url    TEXT,
                duration_seconds INTEGER,
                view_count       BIGINT NOT NULL DEFAULT 0,
                is_live          BOOLEAN NOT NULL DEFAULT FALSE,
                is_active        BOOLEAN NOT NULL DEFAULT TRUE,
                created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_videos_channel_id ON videos (channel_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_videos_created_at ON videos (created_at)")
            .execute(&self.pool)
            .await?;

        info!("Database schema initialized");
        Ok(())
    }
}

/// Backstop for insert races: services pre-check uniqueness, but two
/// concurrent inserts can both pass the check. The constraint wins.
fn map_unique_violation(err: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(format!("{} already exists", what));
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, full_name, password_hash,
                               is_active, is_admin, created_at, last_login)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.last_login)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "User"))
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username_or_email(&self, ident: &str) -> Result<Option<User>, StoreError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 OR email = $1")
                .bind(ident)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn set_last_login(&self, id: Uuid, when: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(when)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelStore for PostgresStore {
    async fn insert(&self, channel: Channel) -> Result<Channel, StoreError> {
        sqlx::query_as::<_, Channel>(
            r#"
            INSERT INTO channels (id, name, category, description, logo_url,
                                  owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(channel.id)
        .bind(&channel.name)
        .bind(&channel.category)
        .bind(&channel.description)
        .bind(&channel.logo_url)
        .bind(channel.owner_id)
        .bind(channel.created_at)
        .bind(channel.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Channel"))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Channel>, StoreError> {
        let channel = sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(channel)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Channel>, StoreError> {
        let channel = sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(channel)
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Channel>, StoreError> {
        let channels = sqlx::query_as::<_, Channel>(
            "SELECT * FROM channels ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(channels)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ChannelChanges,
    ) -> Result<Option<Channel>, StoreError> {
        // Single statement so the merge is atomic with respect to other
        // writers on the same row
        let channel = sqlx::query_as::<_, Channel>(
            r#"
            UPDATE channels SET
                name        = COALESCE($2, name),
                category    = COALESCE($3, category),
                description = COALESCE($4, description),
                logo_url    = COALESCE($5, logo_url),
                updated_at  = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.category)
        .bind(changes.description)
        .bind(changes.logo_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Channel"))?;
        Ok(channel)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM channels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl VideoStore for PostgresStore {
    async fn insert(&self, video: Video) -> Result<Video, StoreError> {
        sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (id, title, description, youtube_id, channel_id,
                                thumbnail_url, duration_seconds, view_count,
                                is_live, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.youtube_id)
        .bind(video.channel_id)
        .bind(&video.thumbnail_url)
        .bind(video.duration_seconds)
        .bind(video.view_count)
        .bind(video.is_live)
        .bind(video.is_active)
        .bind(video.created_at)
        .bind(video.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Video"))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    async fn find_by_youtube_id(&self, youtube_id: &str) -> Result<Option<Video>, StoreError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE youtube_id = $1")
            .bind(youtube_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    async fn list(&self, filter: VideoFilter) -> Result<Vec<Video>, StoreError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM videos");

        let mut has_where = false;
        if let Some(channel_id) = filter.channel_id {
            query.push(" WHERE channel_id = ").push_bind(channel_id);
            has_where = true;
        }
        if let Some(is_active) = filter.is_active {
            query.push(if has_where { " AND " } else { " WHERE " });
            query.push("is_active = ").push_bind(is_active);
        }

        query.push(" ORDER BY created_at DESC");
        query.push(" LIMIT ").push_bind(filter.limit);
        query.push(" OFFSET ").push_bind(filter.skip);

        let videos = query.build_query_as::<Video>().fetch_all(&self.pool).await?;
        Ok(videos)
    }

    async fn update(&self, id: Uuid, changes: VideoChanges) -> Result<Option<Video>, StoreError> {
        // COALESCE keeps unspecified fields untouched, and the single
        // statement cannot clobber a concurrent view-count increment unless
        // view_count itself was provided
        let video = sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos SET
                title            = COALESCE($2, title),
                description      = COALESCE($3, description),
                thumbnail_url    = COALESCE($4, thumbnail_url),
                duration_seconds = COALESCE($5, duration_seconds),
                view_count       = COALESCE($6, view_count),
                is_live          = COALESCE($7, is_live),
                is_active        = COALESCE($8, is_active),
                updated_at       = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.thumbnail_url)
        .bind(changes.duration_seconds)
        .bind(changes.view_count)
        .bind(changes.is_live)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_view(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        // Atomic in-database increment; concurrent calls serialize on the
        // row lock and none are lost
        let video = sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET view_count = view_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    async fn count_by_channel(&self, channel_id: Uuid) -> Result<i64, StoreError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM videos WHERE channel_id = $1")
                .bind(channel_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }
}

#[async_trait]
impl HealthProbe for PostgresStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
