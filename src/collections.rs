//! Named groupings of a user's bookmarks.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::blobs::BlobStore;
use crate::constants::COLLECTION_NAME_MAX_CHARS;
use crate::error::{AppError, Result};
use crate::models::{Bookmark, Collection, Recipe, RecipeCard};
use crate::recipes::with_cover_urls;

/// Collection with its bookmark count
#[derive(Debug, Serialize, FromRow)]
pub struct CollectionSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub collection: Collection,
    pub count: i64,
}

async fn require_owned(db: &SqlitePool, user_id: &str, collection_id: &str) -> Result<Collection> {
    let collection: Option<Collection> =
        sqlx::query_as("SELECT * FROM collections WHERE id = ? AND user_id = ?")
            .bind(collection_id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    collection.ok_or(AppError::CollectionNotFound)
}

pub async fn list(db: &SqlitePool, user_id: &str) -> Result<Vec<CollectionSummary>> {
    let collections = sqlx::query_as(
        r#"
        SELECT c.*, COUNT(b.id) AS count
        FROM collections c
        LEFT JOIN bookmarks b ON b.collection_id = c.id
        WHERE c.user_id = ?
        GROUP BY c.id
        ORDER BY c.created_at ASC, c.rowid ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(collections)
}

pub async fn create(db: &SqlitePool, user_id: &str, name: &str) -> Result<Collection> {
    let name = name.trim();
    let len = name.chars().count();
    if len < 1 || len > COLLECTION_NAME_MAX_CHARS {
        return Err(AppError::validation(format!(
            "Name must be 1-{COLLECTION_NAME_MAX_CHARS} characters"
        )));
    }

    let collection = Collection::new(user_id.to_string(), name.to_string());
    sqlx::query(
        "INSERT INTO collections (id, user_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&collection.id)
    .bind(&collection.user_id)
    .bind(&collection.name)
    .bind(collection.created_at)
    .bind(collection.updated_at)
    .execute(db)
    .await?;

    Ok(collection)
}

/// Delete a collection. Its bookmarks become uncategorized in the same
/// transaction; none are deleted.
pub async fn remove(db: &SqlitePool, user_id: &str, collection_id: &str) -> Result<()> {
    require_owned(db, user_id, collection_id).await?;

    let mut tx = db.begin().await?;
    let released = sqlx::query("UPDATE bookmarks SET collection_id = NULL WHERE collection_id = ?")
        .bind(collection_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM collections WHERE id = ? AND user_id = ?")
        .bind(collection_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(collection_id, released, "collection deleted");
    Ok(())
}

/// Move one of the caller's bookmarks into one of their collections, or out of
/// any collection when `collection_id` is `None`.
pub async fn move_bookmark(
    db: &SqlitePool,
    user_id: &str,
    bookmark_id: &str,
    collection_id: Option<&str>,
) -> Result<()> {
    let bookmark: Option<Bookmark> =
        sqlx::query_as("SELECT * FROM bookmarks WHERE id = ? AND user_id = ?")
            .bind(bookmark_id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    if bookmark.is_none() {
        return Err(AppError::NotFound);
    }

    if let Some(collection_id) = collection_id {
        require_owned(db, user_id, collection_id).await?;
    }

    sqlx::query("UPDATE bookmarks SET collection_id = ? WHERE id = ? AND user_id = ?")
        .bind(collection_id)
        .bind(bookmark_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Recipes bookmarked into `collection_id`, or the caller's uncategorized
/// bookmarks when it is `None`.
pub async fn bookmarks<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    user_id: &str,
    collection_id: Option<&str>,
) -> Result<Vec<RecipeCard>> {
    if let Some(collection_id) = collection_id {
        require_owned(db, user_id, collection_id).await?;
    }

    let recipes: Vec<Recipe> = sqlx::query_as(
        r#"
        SELECT r.* FROM bookmarks b
        JOIN recipes r ON r.id = b.recipe_id
        WHERE b.user_id = ?1
          AND b.collection_id IS ?2
          AND (r.status = 'published' OR r.user_id = ?1)
        ORDER BY b.created_at DESC, b.rowid DESC
        "#,
    )
    .bind(user_id)
    .bind(collection_id)
    .fetch_all(db)
    .await?;

    with_cover_urls(blobs, recipes).await
}
