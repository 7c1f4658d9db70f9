pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::TokenError;
use crate::config::AppConfig;
use crate::services::{AuthService, ChannelService, VideoService};
use crate::store::{ChannelStore, HealthProbe, UserStore, VideoStore};

/// Shared application state. Everything is wired here, once, through
/// constructors; handlers reach services, never stores directly.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub channels: Arc<ChannelService>,
    pub videos: Arc<VideoService>,
    pub probe: Arc<dyn HealthProbe>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        channels: Arc<dyn ChannelStore>,
        videos: Arc<dyn VideoStore>,
        probe: Arc<dyn HealthProbe>,
    ) -> Result<Self, TokenError> {
        let auth = Arc::new(AuthService::new(users, &config.security)?);
        let channel_service = Arc::new(ChannelService::new(
            channels.clone(),
            videos.clone(),
            config.api.clone(),
        ));
        let video_service = Arc::new(VideoService::new(videos, channels, config.api.clone()));

        Ok(Self {
            config: Arc::new(config),
            auth,
            channels: channel_service,
            videos: video_service,
            probe,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let enable_cors = state.config.api.enable_cors;

    let mut app = Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Resources
        .merge(auth_routes(state.clone()))
        .merge(channel_routes(state.clone()))
        .merge(video_routes(state.clone()))
        .with_state(state);

    // Global middleware
    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }
    app.layer(TraceLayer::new_for_http())
}

fn auth_routes(state: AppState) -> Router<AppState> {
    use axum::routing::post;
    use crate::handlers::auth;

    let protected = Router::new()
        .route("/auth/me", get(auth::me_get))
        .route_layer(from_fn_with_state(state, middleware::require_auth));

    Router::new()
        // Token acquisition
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
        .route("/auth/refresh", post(auth::refresh_post))
        .merge(protected)
}

fn channel_routes(state: AppState) -> Router<AppState> {
    use axum::routing::{delete, post, put};
    use crate::handlers::channels;

    let protected = Router::new()
        .route("/channels", post(channels::channel_create))
        .route("/channels/", post(channels::channel_create))
        .route("/channels/:id", put(channels::channel_update))
        .route("/channels/:id", delete(channels::channel_delete))
        .route_layer(from_fn_with_state(state, middleware::require_auth));

    Router::new()
        .route("/channels", get(channels::channel_list))
        .route("/channels/", get(channels::channel_list))
        .route("/channels/:id", get(channels::channel_get))
        .merge(protected)
}

fn video_routes(state: AppState) -> Router<AppState> {
    use axum::routing::{delete, post, put};
    use crate::handlers::videos;

    let protected = Router::new()
        .route("/videos", post(videos::video_create))
        .route("/videos/", post(videos::video_create))
        .route("/videos/:id", put(videos::video_update))
        .route("/videos/:id", delete(videos::video_delete))
        .route("/videos/:id/view", post(videos::video_increment_view))
        .route_layer(from_fn_with_state(state, middleware::require_auth));

    Router::new()
        .route("/videos", get(videos::video_list))
        .route("/videos/", get(videos::video_list))
        .route("/videos/:id", get(videos::video_get))
        .route("/videos/youtube/:youtube_id", get(videos::video_get_by_youtube_id))
        .merge(protected)
}
