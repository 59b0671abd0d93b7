use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
};
use serde::Deserialize;

use crate::AppState;
use crate::auth::AuthUser;
use crate::collections::{self, CollectionSummary};
use crate::error::Result;
use crate::models::RecipeCard;

#[derive(Deserialize)]
pub struct CollectionRequest {
    name: String,
}

/// `collection_id` absent means "uncategorized"
#[derive(Deserialize)]
pub struct CollectionFilter {
    collection_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collections", get(list_collections).post(create_collection))
        .route("/collections/{id}", delete(delete_collection))
        .route("/collections/bookmarks", get(collection_bookmarks))
        .route("/bookmarks/{id}/collection", put(move_bookmark))
}

async fn list_collections(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CollectionSummary>>> {
    Ok(Json(collections::list(&state.db, &user.id).await?))
}

async fn create_collection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CollectionRequest>,
) -> Result<impl IntoResponse> {
    let collection = collections::create(&state.db, &user.id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

async fn delete_collection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    collections::remove(&state.db, &user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn collection_bookmarks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(filter): Query<CollectionFilter>,
) -> Result<Json<Vec<RecipeCard>>> {
    let cards = collections::bookmarks(
        &state.db,
        &state.blobs,
        &user.id,
        filter.collection_id.as_deref(),
    )
    .await?;
    Ok(Json(cards))
}

async fn move_bookmark(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(bookmark_id): Path<String>,
    Json(req): Json<CollectionFilter>,
) -> Result<impl IntoResponse> {
    collections::move_bookmark(&state.db, &user.id, &bookmark_id, req.collection_id.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
