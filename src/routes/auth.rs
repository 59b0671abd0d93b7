use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::AppState;
use crate::auth::{AuthUser, login_user, logout_user};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::users::{self, ProfileUpdate};

#[derive(Deserialize)]
pub struct LoginRequest {
    invite_code: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me).patch(update_me))
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = users::by_invite_code(&state.db, req.invite_code.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    // New session id on every login
    session.cycle_id().await?;
    login_user(&session, user.clone()).await?;
    tracing::info!(user_id = %user.id, "user signed in");
    Ok(Json(user))
}

async fn logout(session: Session) -> Result<impl IntoResponse> {
    logout_user(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Read fresh from the database; the session copy may predate a profile edit.
async fn me(State(state): State<AppState>, AuthUser(user): AuthUser) -> Result<Json<User>> {
    Ok(Json(users::current(&state.db, &user.id).await?))
}

async fn update_me(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let updated = users::update_profile(&state.db, &user.id, update).await?;
    login_user(&session, updated.clone()).await?;
    Ok(Json(updated))
}
