use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde_json::{Value, json};

use crate::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::error::Result;
use crate::follows::{self, FollowCounts, FollowToggle};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/follow", get(is_following).post(toggle_follow))
        .route("/users/{id}/follow-counts", get(follow_counts))
}

async fn toggle_follow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(target_id): Path<String>,
) -> Result<Json<FollowToggle>> {
    Ok(Json(follows::toggle(&state.db, &user.id, &target_id).await?))
}

async fn is_following(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(target_id): Path<String>,
) -> Result<Json<Value>> {
    let following = follows::is_following(&state.db, viewer.id(), &target_id).await?;
    Ok(Json(json!({ "following": following })))
}

async fn follow_counts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<FollowCounts>> {
    Ok(Json(follows::counts(&state.follow_counts, &user_id).await?))
}
