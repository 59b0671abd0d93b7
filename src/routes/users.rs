use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::AppState;
use crate::auth::MaybeUser;
use crate::error::Result;
use crate::models::RecipeCard;
use crate::recipes;
use crate::users::{self, Profile};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/by-username/{username}", get(by_username))
        .route("/users/{id}/recipes", get(user_recipes))
}

async fn by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Profile>> {
    let profile = users::by_username(&state.db, &username.to_lowercase()).await?;
    Ok(Json(profile))
}

async fn user_recipes(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<RecipeCard>>> {
    let cards = recipes::by_user(&state.db, &state.blobs, viewer.id(), &user_id).await?;
    Ok(Json(cards))
}
