pub mod auth;
pub mod blobs;
pub mod cli;
pub mod collections;
pub mod config;
pub mod constants;
pub mod db;
pub mod discovery;
pub mod error;
pub mod follows;
pub mod jobs;
pub mod models;
pub mod notifications;
pub mod optimistic;
pub mod presence;
pub mod recipes;
pub mod routes;
pub mod social;
pub mod users;

use axum::{Router, routing::get};
use sqlx::SqlitePool;
use time::Duration;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_sessions::{Expiry, SessionManagerLayer, cookie::SameSite};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::Level;

use crate::blobs::SqliteBlobStore;
use crate::discovery::LikeWindowScan;
use crate::follows::FollowEdgeScan;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub blobs: SqliteBlobStore,
    pub trending: LikeWindowScan,
    pub follow_counts: FollowEdgeScan,
}

impl AppState {
    pub fn new(db: SqlitePool, blob_base_url: &str) -> Self {
        Self {
            blobs: SqliteBlobStore::new(db.clone(), blob_base_url),
            trending: LikeWindowScan::new(db.clone()),
            follow_counts: FollowEdgeScan::new(db.clone()),
            db,
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// Caller is responsible for running database migrations on `pool` beforehand.
/// This function sets up the session store (and migrates its table), then
/// assembles all route modules, middleware, and state.
pub async fn build_app(
    pool: SqlitePool,
    secure_cookies: bool,
    blob_base_url: &str,
) -> Result<Router, sqlx::Error> {
    let session_store = SqliteStore::new(pool.clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(30)))
        .with_secure(secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax);

    let state = AppState::new(pool, blob_base_url);

    Ok(Router::new()
        .route("/health", get(health))
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::follows::router())
        .merge(routes::discovery::router())
        .merge(routes::recipes::router())
        .merge(routes::social::router())
        .merge(routes::presence::router())
        .merge(routes::notifications::router())
        .merge(routes::collections::router())
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state))
}
