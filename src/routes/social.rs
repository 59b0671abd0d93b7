use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::error::{AppError, Result};
use crate::social::{self, BookmarkToggle, CommentView, LikeToggle, RatingStats};

#[derive(Debug, Default, Deserialize)]
pub struct BookmarkRequest {
    collection_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    value: f64,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    content: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes/{id}/like", post(toggle_like))
        .route("/recipes/{id}/bookmark", post(toggle_bookmark))
        .route("/recipes/{id}/rating", get(rating_stats).post(rate))
        .route("/recipes/{id}/comments", get(list_comments).post(add_comment))
}

async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LikeToggle>> {
    Ok(Json(social::toggle_like(&state.db, &user.id, &id).await?))
}

async fn toggle_bookmark(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<BookmarkToggle>> {
    // The body is optional; an empty one files the bookmark uncategorized.
    let req: BookmarkRequest = if body.is_empty() {
        BookmarkRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::validation(e.to_string()))?
    };
    let toggled =
        social::toggle_bookmark(&state.db, &user.id, &id, req.collection_id.as_deref()).await?;
    Ok(Json(toggled))
}

async fn rate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RatingRequest>,
) -> Result<impl IntoResponse> {
    social::rate(&state.db, &user.id, &id, req.value).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn rating_stats(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<RatingStats>> {
    Ok(Json(social::stats(&state.db, &id, viewer.id()).await?))
}

async fn list_comments(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<CommentView>>> {
    crate::recipes::require_visible(&state.db, &id, viewer.id()).await?;
    Ok(Json(social::comments(&state.db, &id).await?))
}

async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<impl IntoResponse> {
    let comment_id = social::add_comment(&state.db, &user.id, &id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": comment_id }))))
}
