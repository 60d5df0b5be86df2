pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::{sync::Arc, time::Duration};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use middleware::rate_limit::RateLimiter;
use services::{photo_mirror::JsonPhotoStore, photos::MAX_FILES_PER_UPLOAD, storage::StorageRegistry};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub storage: Arc<StorageRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
    pub photo_mirror: Arc<JsonPhotoStore>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let storage = StorageRegistry::from_config(&config.storage_providers, &config.app_base_url);
        let rate_limiter = RateLimiter::new(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
        );
        let photo_mirror = JsonPhotoStore::new(&config.photo_mirror_path);
        Self {
            db,
            config: Arc::new(config),
            storage: Arc::new(storage),
            rate_limiter: Arc::new(rate_limiter),
            photo_mirror: Arc::new(photo_mirror),
        }
    }
}

/// The app base URL plus localhost for development.
fn cors_layer(base_url: &str) -> CorsLayer {
    let base = base_url.trim_end_matches('/').to_string();
    let origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let Ok(o) = origin.to_str() else {
            return false;
        };
        o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") || o == base
    });

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-admin-key"),
        ]))
        .allow_origin(origin)
}

pub fn app(state: AppState) -> Router {
    // Room for a full batch of files plus the text fields
    let body_limit = (state.config.max_upload_bytes as usize)
        .saturating_mul(MAX_FILES_PER_UPLOAD)
        .saturating_add(1024 * 1024);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Group-scoped content
        .route("/api/groups", get(routes::site::list_groups))
        .route("/api/countdown", get(routes::site::get_countdown))
        .route("/api/{group}/events", get(routes::site::list_events))
        .route("/api/{group}/events/{id}", get(routes::site::get_event))
        .route("/api/{group}/events/{id}/calendar.ics", get(routes::site::event_calendar))
        .route("/api/{group}/nav", get(routes::site::list_nav))
        .route("/api/{group}/theme", get(routes::site::get_theme))
        .route("/api/{group}/outfits", get(routes::site::list_outfits))
        // RSVP
        .route("/api/rsvp", post(routes::rsvp::submit_rsvp))
        // Photos
        .route("/api/photos", get(routes::photos::list_photos).post(routes::photos::upload_photos))
        .route("/api/photos/{id}", delete(routes::photos::delete_photo))
        .route("/media/files/{*path}", get(routes::files::serve_file))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.app_base_url))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
