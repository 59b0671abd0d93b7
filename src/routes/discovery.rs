use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use super::LimitQuery;
use crate::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::constants::{FEED_LIMIT, RECOMMENDATION_LIMIT, TRENDING_LIMIT, clamp_limit};
use crate::discovery::{self, SearchParams};
use crate::error::Result;
use crate::models::{RecipeCard, now_ms};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trending", get(trending))
        .route("/recommendations", get(recommendations))
        .route("/search", get(search))
        .route("/feed", get(feed))
}

async fn trending(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<RecipeCard>>> {
    let cards = discovery::trending(
        &state.db,
        &state.trending,
        &state.blobs,
        now_ms(),
        clamp_limit(query.limit, TRENDING_LIMIT),
    )
    .await?;
    Ok(Json(cards))
}

async fn recommendations(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<RecipeCard>>> {
    let limit = clamp_limit(query.limit, RECOMMENDATION_LIMIT);
    let cards = discovery::recommendations(&state.db, &state.blobs, viewer.id(), limit).await?;
    Ok(Json(cards))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<RecipeCard>>> {
    Ok(Json(discovery::search(&state.db, &state.blobs, &params).await?))
}

async fn feed(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<RecipeCard>>> {
    let limit = clamp_limit(query.limit, FEED_LIMIT);
    Ok(Json(discovery::feed(&state.db, &state.blobs, &user.id, limit).await?))
}
