use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::constants::{LIST_PAGE_SIZE, clamp_limit};
use crate::error::Result;
use crate::models::RecipeCard;
use crate::recipes::{self, CreatedRecipe, Page, RecipeDetail, RecipeInput};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    category: Option<String>,
    cursor: Option<String>,
    page_size: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/mine", get(my_recipes))
        .route("/recipes/by-slug/{slug}", get(show_recipe))
        .route("/recipes/{id}", put(update_recipe).delete(delete_recipe))
        .route("/recipes/{id}/fork", post(fork_recipe))
        .route("/recipes/{id}/view", post(record_view))
        .route("/bookmarks", get(my_bookmarks))
        .route("/uploads", post(upload_url))
}

async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<RecipeCard>>> {
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let page = recipes::list(
        &state.db,
        &state.blobs,
        category,
        query.cursor.as_deref(),
        clamp_limit(query.page_size, LIST_PAGE_SIZE),
    )
    .await?;
    Ok(Json(page))
}

async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<RecipeInput>,
) -> Result<impl IntoResponse> {
    let created = recipes::create(&state.db, &state.blobs, &user.id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn my_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<RecipeCard>>> {
    let cards = recipes::by_user(&state.db, &state.blobs, Some(&user.id), &user.id).await?;
    Ok(Json(cards))
}

async fn show_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<RecipeDetail>> {
    let detail = recipes::get_by_slug(&state.db, &state.blobs, viewer.id(), &slug).await?;
    Ok(Json(detail))
}

async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<RecipeInput>,
) -> Result<Json<CreatedRecipe>> {
    let updated = recipes::update(&state.db, &state.blobs, &user.id, &id, input).await?;
    Ok(Json(updated))
}

async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    recipes::remove(&state.db, &state.blobs, &user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fork_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let forked = recipes::fork(&state.db, &user.id, &id).await?;
    Ok((StatusCode::CREATED, Json(forked)))
}

async fn record_view(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    recipes::require_visible(&state.db, &id, viewer.id()).await?;
    recipes::record_view(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn my_bookmarks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<RecipeCard>>> {
    let cards = recipes::my_bookmarks(&state.db, &state.blobs, &user.id).await?;
    Ok(Json(cards))
}

async fn upload_url(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse> {
    let target = recipes::generate_upload_url(&state.blobs, &user.id).await?;
    Ok((StatusCode::CREATED, Json(target)))
}
