use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::error::Result;
use crate::models::now_ms;
use crate::presence::{self, Cooking};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes/{id}/presence", post(heartbeat).delete(leave))
        .route("/recipes/{id}/cooking", get(cooking))
}

async fn heartbeat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    presence::heartbeat(&state.db, &user.id, &id, now_ms()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn leave(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    presence::leave(&state.db, &user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cooking(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<Cooking>> {
    Ok(Json(presence::cooking(&state.db, &id, viewer.id(), now_ms()).await?))
}
