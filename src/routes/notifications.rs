use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};

use super::LimitQuery;
use crate::AppState;
use crate::auth::AuthUser;
use crate::constants::{NOTIFICATION_LIMIT, clamp_limit};
use crate::error::Result;
use crate::notifications::{self, NotificationView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
}

async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<NotificationView>>> {
    let limit = clamp_limit(query.limit, NOTIFICATION_LIMIT);
    Ok(Json(notifications::list(&state.db, &user.id, limit).await?))
}

async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>> {
    let count = notifications::unread_count(&state.db, &user.id).await?;
    Ok(Json(json!({ "count": count })))
}

async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>> {
    let updated = notifications::mark_all_read(&state.db, &user.id).await?;
    Ok(Json(json!({ "updated": updated })))
}

async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    notifications::mark_read(&state.db, &user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
