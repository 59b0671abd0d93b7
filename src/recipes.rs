//! Recipe lifecycle: authoring, forking, cascade deletion and the listings
//! that sit outside the discovery engine.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::blobs::{BlobStore, UploadTarget};
use crate::constants::TITLE_MAX_CHARS;
use crate::error::{AppError, Result};
use crate::models::{
    AuthorSummary, Difficulty, NotificationKind, Recipe, RecipeCard, RecipeStatus, RecipeView,
    User, new_id, now_ms,
};
use crate::notifications;

/// Children removed together with a recipe, in order.
const CASCADE: [&str; 5] = [
    "DELETE FROM comments WHERE recipe_id = ?",
    "DELETE FROM likes WHERE recipe_id = ?",
    "DELETE FROM bookmarks WHERE recipe_id = ?",
    "DELETE FROM ratings WHERE recipe_id = ?",
    "DELETE FROM presence WHERE recipe_id = ?",
];

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeInput {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    pub cover_image: Option<String>,
    pub video_url: Option<String>,
    pub status: RecipeStatus,
    pub publish_at: Option<i64>,
    pub servings: Option<i64>,
    pub prep_time: Option<i64>,
    pub cook_time: Option<i64>,
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Serialize)]
pub struct CreatedRecipe {
    pub id: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub card: RecipeCard,
    pub likes_count: i64,
    pub is_liked: bool,
    pub is_bookmarked: bool,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub page: Vec<T>,
    pub continue_cursor: Option<String>,
    pub is_done: bool,
}

#[derive(FromRow)]
struct SequencedRecipe {
    #[sqlx(flatten)]
    recipe: Recipe,
    seq: i64,
}

/// Lowercase, runs of non-alphanumerics collapsed to `-`, no leading or
/// trailing dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

pub(crate) fn generate_slug(title: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    let base = slugify(title);
    if base.is_empty() {
        suffix
    } else {
        format!("{base}-{suffix}")
    }
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn non_negative(value: Option<i64>, field: &str) -> Result<()> {
    match value {
        Some(v) if v < 0 => Err(AppError::validation(format!("{field} cannot be negative"))),
        _ => Ok(()),
    }
}

/// Normalises user input in place and rejects anything out of range.
/// `recipe_id` is the recipe being edited, if any.
async fn validate_input<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    user_id: &str,
    recipe_id: Option<&str>,
    input: &mut RecipeInput,
) -> Result<()> {
    input.title = input.title.trim().to_string();
    let title_len = input.title.chars().count();
    if title_len == 0 || title_len > TITLE_MAX_CHARS {
        return Err(AppError::validation(format!(
            "Title must be 1-{TITLE_MAX_CHARS} characters"
        )));
    }

    input.category = input.category.trim().to_string();
    if input.category.is_empty() {
        return Err(AppError::validation("Category is required"));
    }

    input.description = input
        .description
        .take()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    input.ingredients = clean_lines(std::mem::take(&mut input.ingredients));
    input.steps = clean_lines(std::mem::take(&mut input.steps));

    if let Some(video_url) = &input.video_url {
        let parsed = url::Url::parse(video_url)
            .map_err(|_| AppError::validation("Video URL is not a valid URL"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::validation(
                "Video URL must start with http:// or https://",
            ));
        }
    }

    non_negative(input.prep_time, "Prep time")?;
    non_negative(input.cook_time, "Cook time")?;
    if let Some(servings) = input.servings {
        if servings < 1 {
            return Err(AppError::validation("Servings must be at least 1"));
        }
    }

    if input.status == RecipeStatus::Published {
        input.publish_at = None;
    }

    if let Some(cover) = &input.cover_image {
        // Someone else's upload is reported exactly like a missing one
        if blobs.owner_of(cover).await?.as_deref() != Some(user_id) {
            return Err(AppError::validation("Unknown cover image"));
        }
        let (in_use,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM recipes WHERE cover_image = ? AND id IS NOT ?)",
        )
        .bind(cover)
        .bind(recipe_id)
        .fetch_one(db)
        .await?;
        if in_use {
            return Err(AppError::validation("Cover image is already in use"));
        }
    }

    Ok(())
}

pub async fn require_published(db: &SqlitePool, recipe_id: &str) -> Result<Recipe> {
    Recipe::find(db, recipe_id)
        .await?
        .filter(Recipe::is_published)
        .ok_or(AppError::NotFound)
}

pub async fn require_visible(
    db: &SqlitePool,
    recipe_id: &str,
    viewer: Option<&str>,
) -> Result<Recipe> {
    Recipe::find(db, recipe_id)
        .await?
        .filter(|r| r.is_visible_to(viewer))
        .ok_or(AppError::NotFound)
}

async fn require_owned(db: &SqlitePool, recipe_id: &str, user_id: &str) -> Result<Recipe> {
    Recipe::find(db, recipe_id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or(AppError::NotFound)
}

pub async fn card<B: BlobStore>(blobs: &B, recipe: Recipe) -> Result<RecipeCard> {
    let cover_image_url = match &recipe.cover_image {
        Some(id) => blobs.get_url(id).await?,
        None => None,
    };
    Ok(RecipeCard {
        recipe,
        cover_image_url,
        trending_score: None,
        author: None,
    })
}

pub async fn with_cover_urls<B: BlobStore>(
    blobs: &B,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeCard>> {
    let mut cards = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        cards.push(card(blobs, recipe).await?);
    }
    Ok(cards)
}

pub async fn create<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    user_id: &str,
    mut input: RecipeInput,
) -> Result<CreatedRecipe> {
    validate_input(db, blobs, user_id, None, &mut input).await?;

    let now = now_ms();
    let recipe = Recipe {
        id: new_id(),
        slug: generate_slug(&input.title),
        title: input.title,
        description: input.description,
        category: input.category,
        ingredients: Json(input.ingredients),
        steps: Json(input.steps),
        cover_image: input.cover_image,
        video_url: input.video_url,
        status: input.status,
        publish_at: input.publish_at,
        user_id: user_id.to_string(),
        forked_from: None,
        servings: input.servings,
        prep_time: input.prep_time,
        cook_time: input.cook_time,
        difficulty: input.difficulty,
        created_at: now,
        updated_at: now,
    };
    recipe.insert(db).await?;

    tracing::info!(recipe_id = %recipe.id, slug = %recipe.slug, "recipe created");
    Ok(CreatedRecipe {
        id: recipe.id,
        slug: recipe.slug,
    })
}

/// Owner-only. Replacing the cover image releases the previous blob.
pub async fn update<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    user_id: &str,
    recipe_id: &str,
    mut input: RecipeInput,
) -> Result<CreatedRecipe> {
    let existing = require_owned(db, recipe_id, user_id).await?;
    validate_input(db, blobs, user_id, Some(recipe_id), &mut input).await?;

    sqlx::query(
        r#"
        UPDATE recipes
        SET title = ?, description = ?, category = ?, ingredients = ?, steps = ?,
            cover_image = ?, video_url = ?, status = ?, publish_at = ?, servings = ?,
            prep_time = ?, cook_time = ?, difficulty = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.category)
    .bind(Json(&input.ingredients))
    .bind(Json(&input.steps))
    .bind(&input.cover_image)
    .bind(&input.video_url)
    .bind(input.status)
    .bind(input.publish_at)
    .bind(input.servings)
    .bind(input.prep_time)
    .bind(input.cook_time)
    .bind(input.difficulty)
    .bind(now_ms())
    .bind(recipe_id)
    .bind(user_id)
    .execute(db)
    .await?;

    if let Some(old) = existing.cover_image.as_deref() {
        if input.cover_image.as_deref() != Some(old) {
            release_blob(blobs, old).await;
        }
    }

    Ok(CreatedRecipe {
        id: existing.id,
        slug: existing.slug,
    })
}

async fn release_blob<B: BlobStore>(blobs: &B, blob_id: &str) {
    if let Err(e) = blobs.delete(blob_id).await {
        tracing::warn!(blob_id, "failed to release blob: {e}");
    }
}

/// Owner-only. Comments, likes, bookmarks, ratings and presence rows go in the
/// same transaction as the recipe; the cover blob is released afterwards and a
/// failure there is only logged.
pub async fn remove<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    user_id: &str,
    recipe_id: &str,
) -> Result<()> {
    let recipe = require_owned(db, recipe_id, user_id).await?;

    let mut tx = db.begin().await?;
    for statement in CASCADE {
        sqlx::query(statement)
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if let Some(blob_id) = recipe.cover_image.as_deref() {
        release_blob(blobs, blob_id).await;
    }

    tracing::info!(recipe_id, "recipe deleted");
    Ok(())
}

/// Copy a published recipe into a new draft owned by `user_id`. The cover
/// image is not shared: blobs belong to exactly one recipe.
pub async fn fork(db: &SqlitePool, user_id: &str, recipe_id: &str) -> Result<CreatedRecipe> {
    let source = require_published(db, recipe_id).await?;

    let now = now_ms();
    let recipe = Recipe {
        id: new_id(),
        slug: generate_slug(&source.title),
        title: source.title.clone(),
        description: source.description.clone(),
        category: source.category.clone(),
        ingredients: source.ingredients.clone(),
        steps: source.steps.clone(),
        cover_image: None,
        video_url: source.video_url.clone(),
        status: RecipeStatus::Draft,
        publish_at: None,
        user_id: user_id.to_string(),
        forked_from: Some(source.id.clone()),
        servings: source.servings,
        prep_time: source.prep_time,
        cook_time: source.cook_time,
        difficulty: source.difficulty,
        created_at: now,
        updated_at: now,
    };
    recipe.insert(db).await?;

    notifications::notify(
        db,
        &source.user_id,
        NotificationKind::Fork,
        user_id,
        Some(&source.id),
        now,
    )
    .await?;

    Ok(CreatedRecipe {
        id: recipe.id,
        slug: recipe.slug,
    })
}

pub async fn get_by_slug<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    viewer: Option<&str>,
    slug: &str,
) -> Result<RecipeDetail> {
    let recipe: Recipe = sqlx::query_as("SELECT * FROM recipes WHERE slug = ?")
        .bind(slug)
        .fetch_optional(db)
        .await?
        .filter(|r: &Recipe| r.is_visible_to(viewer))
        .ok_or(AppError::NotFound)?;

    let (likes_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes WHERE recipe_id = ?")
        .bind(&recipe.id)
        .fetch_one(db)
        .await?;

    let (is_liked, is_bookmarked) = match viewer {
        Some(user_id) => {
            let (liked, bookmarked): (bool, bool) = sqlx::query_as(
                r#"
                SELECT
                    EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND recipe_id = ?2),
                    EXISTS(SELECT 1 FROM bookmarks WHERE user_id = ?1 AND recipe_id = ?2)
                "#,
            )
            .bind(user_id)
            .bind(&recipe.id)
            .fetch_one(db)
            .await?;
            (liked, bookmarked)
        }
        None => (false, false),
    };

    let author = User::find(db, &recipe.user_id)
        .await?
        .map(|u| AuthorSummary::from(&u));
    let mut card = card(blobs, recipe).await?;
    card.author = author;

    Ok(RecipeDetail {
        card,
        likes_count,
        is_liked,
        is_bookmarked,
    })
}

fn parse_cursor(cursor: &str) -> Result<(i64, i64)> {
    let invalid = || AppError::validation("Invalid cursor");
    let (created_at, seq) = cursor.split_once(':').ok_or_else(invalid)?;
    Ok((
        created_at.parse().map_err(|_| invalid())?,
        seq.parse().map_err(|_| invalid())?,
    ))
}

/// Published recipes, newest first, one page at a time.
pub async fn list<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    category: Option<&str>,
    cursor: Option<&str>,
    page_size: i64,
) -> Result<Page<RecipeCard>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT recipes.*, recipes.rowid AS seq FROM recipes WHERE status = 'published'",
    );
    if let Some(category) = category {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
    if let Some(cursor) = cursor {
        let (created_at, seq) = parse_cursor(cursor)?;
        qb.push(" AND (created_at, rowid) < (")
            .push_bind(created_at)
            .push(", ")
            .push_bind(seq)
            .push(")");
    }
    qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
        .push_bind(page_size + 1);

    let mut rows: Vec<SequencedRecipe> = qb.build_query_as().fetch_all(db).await?;
    let is_done = rows.len() as i64 <= page_size;
    rows.truncate(page_size as usize);

    let continue_cursor = if is_done {
        None
    } else {
        rows.last()
            .map(|r| format!("{}:{}", r.recipe.created_at, r.seq))
    };

    let page = with_cover_urls(blobs, rows.into_iter().map(|r| r.recipe).collect()).await?;
    Ok(Page {
        page,
        continue_cursor,
        is_done,
    })
}

/// All of a user's recipes. Drafts are included only when the viewer is that
/// user.
pub async fn by_user<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    viewer: Option<&str>,
    user_id: &str,
) -> Result<Vec<RecipeCard>> {
    let include_drafts = viewer == Some(user_id);
    let recipes: Vec<Recipe> = sqlx::query_as(
        r#"
        SELECT * FROM recipes
        WHERE user_id = ? AND (? OR status = 'published')
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .bind(include_drafts)
    .fetch_all(db)
    .await?;

    with_cover_urls(blobs, recipes).await
}

/// Bookmarked recipes newest bookmark first, skipping ones no longer visible.
pub async fn my_bookmarks<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    user_id: &str,
) -> Result<Vec<RecipeCard>> {
    let recipes: Vec<Recipe> = sqlx::query_as(
        r#"
        SELECT r.* FROM bookmarks b
        JOIN recipes r ON r.id = b.recipe_id
        WHERE b.user_id = ?1 AND (r.status = 'published' OR r.user_id = ?1)
        ORDER BY b.created_at DESC, b.rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    with_cover_urls(blobs, recipes).await
}

pub async fn record_view(db: &SqlitePool, recipe_id: &str) -> Result<()> {
    let view = RecipeView::new(recipe_id.to_string());
    sqlx::query("INSERT INTO recipe_views (id, recipe_id, timestamp) VALUES (?, ?, ?)")
        .bind(&view.id)
        .bind(&view.recipe_id)
        .bind(view.timestamp)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn generate_upload_url<B: BlobStore>(blobs: &B, user_id: &str) -> Result<UploadTarget> {
    Ok(blobs.generate_upload_url(user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Grandma's Best  Pie!"), "grandma-s-best-pie");
        assert_eq!(slugify("  --Hello--World--  "), "hello-world");
        assert_eq!(slugify("Crème brûlée"), "cr-me-br-l-e");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn generated_slug_has_random_suffix() {
        let a = generate_slug("Tomato Soup");
        let b = generate_slug("Tomato Soup");
        assert!(a.starts_with("tomato-soup-"));
        assert_eq!(a.len(), "tomato-soup-".len() + 6);
        assert_ne!(a, b);
        assert_eq!(generate_slug("???").len(), 6);
    }

    #[test]
    fn cursor_round_trip_and_rejection() {
        assert_eq!(parse_cursor("1700:42").unwrap(), (1700, 42));
        assert!(matches!(parse_cursor("nope"), Err(AppError::Validation(_))));
        assert!(matches!(parse_cursor("1:x"), Err(AppError::Validation(_))));
    }
}
