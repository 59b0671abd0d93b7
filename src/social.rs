//! Likes, bookmarks, ratings and comments.
//!
//! Toggles delete first and only insert when nothing was deleted. Each step is
//! a single statement, and the unique (user_id, recipe_id) index turns a
//! racing second insert into a no-op instead of a duplicate row.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::constants::COMMENT_MAX_CHARS;
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, Bookmark, Comment, Like, NotificationKind, User};
use crate::notifications;
use crate::recipes::require_published;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    /// Like count after the toggle, for client reconciliation
    pub likes_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookmarkToggle {
    pub bookmarked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingStats {
    pub average: f64,
    pub count: i64,
    pub user_rating: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<AuthorSummary>,
}

/// Escape `& < > " '` so stored text is inert when rendered as HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

async fn likes_count(db: &SqlitePool, recipe_id: &str) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes WHERE recipe_id = ?")
        .bind(recipe_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn toggle_like(db: &SqlitePool, user_id: &str, recipe_id: &str) -> Result<LikeToggle> {
    let recipe = require_published(db, recipe_id).await?;

    let removed = sqlx::query("DELETE FROM likes WHERE user_id = ? AND recipe_id = ?")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?
        .rows_affected();

    if removed > 0 {
        tracing::debug!(user_id, recipe_id, "unliked");
        return Ok(LikeToggle {
            liked: false,
            likes_count: likes_count(db, recipe_id).await?,
        });
    }

    let like = Like::new(recipe_id.to_string(), user_id.to_string());
    let inserted = sqlx::query(
        r#"
        INSERT INTO likes (id, recipe_id, user_id, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (user_id, recipe_id) DO NOTHING
        "#,
    )
    .bind(&like.id)
    .bind(&like.recipe_id)
    .bind(&like.user_id)
    .bind(like.created_at)
    .execute(db)
    .await?
    .rows_affected();

    // A concurrent request already created the like; it owns the notification.
    if inserted > 0 {
        notifications::notify(
            db,
            &recipe.user_id,
            NotificationKind::Like,
            user_id,
            Some(recipe_id),
            like.created_at,
        )
        .await?;
    }

    tracing::debug!(user_id, recipe_id, "liked");
    Ok(LikeToggle {
        liked: true,
        likes_count: likes_count(db, recipe_id).await?,
    })
}

/// Toggle a bookmark, optionally filing a new one into one of the caller's
/// collections. No notification is produced.
pub async fn toggle_bookmark(
    db: &SqlitePool,
    user_id: &str,
    recipe_id: &str,
    collection_id: Option<&str>,
) -> Result<BookmarkToggle> {
    require_published(db, recipe_id).await?;

    if let Some(collection_id) = collection_id {
        let owned: Option<(String,)> =
            sqlx::query_as("SELECT id FROM collections WHERE id = ? AND user_id = ?")
                .bind(collection_id)
                .bind(user_id)
                .fetch_optional(db)
                .await?;
        if owned.is_none() {
            return Err(AppError::CollectionNotFound);
        }
    }

    let removed = sqlx::query("DELETE FROM bookmarks WHERE user_id = ? AND recipe_id = ?")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?
        .rows_affected();

    if removed > 0 {
        return Ok(BookmarkToggle { bookmarked: false });
    }

    let bookmark = Bookmark::new(
        recipe_id.to_string(),
        user_id.to_string(),
        collection_id.map(str::to_string),
    );
    sqlx::query(
        r#"
        INSERT INTO bookmarks (id, recipe_id, user_id, collection_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id, recipe_id) DO NOTHING
        "#,
    )
    .bind(&bookmark.id)
    .bind(&bookmark.recipe_id)
    .bind(&bookmark.user_id)
    .bind(&bookmark.collection_id)
    .bind(bookmark.created_at)
    .execute(db)
    .await?;

    Ok(BookmarkToggle { bookmarked: true })
}

/// Upsert the caller's rating. `value` must be a whole number from 1 to 5.
pub async fn rate(db: &SqlitePool, user_id: &str, recipe_id: &str, value: f64) -> Result<()> {
    if value.fract() != 0.0 || !(1.0..=5.0).contains(&value) {
        return Err(AppError::validation("Rating must be a whole number from 1 to 5"));
    }
    require_published(db, recipe_id).await?;

    let now = crate::models::now_ms();
    sqlx::query(
        r#"
        INSERT INTO ratings (id, recipe_id, user_id, value, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, recipe_id) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(crate::models::new_id())
    .bind(recipe_id)
    .bind(user_id)
    .bind(value as i64)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn stats(db: &SqlitePool, recipe_id: &str, viewer: Option<&str>) -> Result<RatingStats> {
    let ratings: Vec<(String, i64)> =
        sqlx::query_as("SELECT user_id, value FROM ratings WHERE recipe_id = ?")
            .bind(recipe_id)
            .fetch_all(db)
            .await?;

    if ratings.is_empty() {
        return Ok(RatingStats {
            average: 0.0,
            count: 0,
            user_rating: None,
        });
    }

    let count = ratings.len() as i64;
    let sum: i64 = ratings.iter().map(|(_, v)| v).sum();
    let average = (sum as f64 / count as f64 * 10.0).round() / 10.0;
    let user_rating = viewer.and_then(|viewer| {
        ratings
            .iter()
            .find(|(user_id, _)| user_id == viewer)
            .map(|(_, v)| *v)
    });

    Ok(RatingStats {
        average,
        count,
        user_rating,
    })
}

/// Trim, validate length (before escaping), escape, store. Returns the new
/// comment id.
pub async fn add_comment(
    db: &SqlitePool,
    user_id: &str,
    recipe_id: &str,
    content: &str,
) -> Result<String> {
    let trimmed = content.trim();
    let len = trimmed.chars().count();
    if len < 1 || len > COMMENT_MAX_CHARS {
        return Err(AppError::validation(format!(
            "Comment must be 1-{COMMENT_MAX_CHARS} characters"
        )));
    }

    let recipe = require_published(db, recipe_id).await?;

    let comment = Comment::new(
        recipe_id.to_string(),
        user_id.to_string(),
        escape_html(trimmed),
    );
    sqlx::query(
        "INSERT INTO comments (id, recipe_id, user_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&comment.id)
    .bind(&comment.recipe_id)
    .bind(&comment.user_id)
    .bind(&comment.content)
    .bind(comment.created_at)
    .execute(db)
    .await?;

    notifications::notify(
        db,
        &recipe.user_id,
        NotificationKind::Comment,
        user_id,
        Some(recipe_id),
        comment.created_at,
    )
    .await?;

    Ok(comment.id)
}

/// Newest first, authors resolved in one batch.
pub async fn comments(db: &SqlitePool, recipe_id: &str) -> Result<Vec<CommentView>> {
    let comments: Vec<Comment> = sqlx::query_as(
        "SELECT * FROM comments WHERE recipe_id = ? ORDER BY created_at DESC, rowid DESC",
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;

    let mut author_ids: Vec<String> = comments.iter().map(|c| c.user_id.clone()).collect();
    author_ids.sort();
    author_ids.dedup();
    let authors = User::fetch_many(db, &author_ids).await?;

    Ok(comments
        .into_iter()
        .map(|comment| CommentView {
            user: authors.get(&comment.user_id).map(AuthorSummary::from),
            comment,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_characters() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn ampersand_is_escaped_once() {
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }
}
