//! Append-only per-user event log.

use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::Result;
use crate::models::{AuthorSummary, Notification, NotificationKind, Recipe, User, new_id};

#[derive(Debug, Serialize)]
pub struct RecipeRef {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub actor: Option<AuthorSummary>,
    pub recipe: Option<RecipeRef>,
}

/// Append a notification for `recipient_id`. Returns `false` without writing
/// anything when the actor is the recipient.
pub async fn notify<'e, E>(
    executor: E,
    recipient_id: &str,
    kind: NotificationKind,
    actor_id: &str,
    recipe_id: Option<&str>,
    now: i64,
) -> std::result::Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    if recipient_id == actor_id {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, kind, actor_id, recipe_id, read, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(new_id())
    .bind(recipient_id)
    .bind(kind)
    .bind(actor_id)
    .bind(recipe_id)
    .bind(now)
    .execute(executor)
    .await?;

    tracing::debug!(%kind, recipient_id, actor_id, "notification appended");
    Ok(true)
}

/// Newest first. Actors and recipes are resolved with one batched lookup each.
pub async fn list(db: &SqlitePool, user_id: &str, limit: i64) -> Result<Vec<NotificationView>> {
    let notifications: Vec<Notification> = sqlx::query_as(
        "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;

    let mut actor_ids: Vec<String> = notifications.iter().map(|n| n.actor_id.clone()).collect();
    actor_ids.sort();
    actor_ids.dedup();

    let mut recipe_ids: Vec<String> = notifications
        .iter()
        .filter_map(|n| n.recipe_id.clone())
        .collect();
    recipe_ids.sort();
    recipe_ids.dedup();

    let actors = User::fetch_many(db, &actor_ids).await?;
    let recipes = Recipe::fetch_many(db, &recipe_ids).await?;

    Ok(notifications
        .into_iter()
        .map(|notification| {
            let actor = actors.get(&notification.actor_id).map(AuthorSummary::from);
            let recipe = notification
                .recipe_id
                .as_ref()
                .and_then(|id| recipes.get(id))
                .map(|r| RecipeRef {
                    title: r.title.clone(),
                    slug: r.slug.clone(),
                });
            NotificationView {
                notification,
                actor,
                recipe,
            }
        })
        .collect())
}

pub async fn unread_count(db: &SqlitePool, user_id: &str) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read = 0")
            .bind(user_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}

/// Marks every currently-unread notification as read and returns how many
/// changed. Rows appended while this runs are left unread.
pub async fn mark_all_read(db: &SqlitePool, user_id: &str) -> Result<u64> {
    let result = sqlx::query("UPDATE notifications SET read = 1 WHERE user_id = ? AND read = 0")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// No-op unless the notification belongs to the caller.
pub async fn mark_read(db: &SqlitePool, user_id: &str, notification_id: &str) -> Result<()> {
    sqlx::query("UPDATE notifications SET read = 1 WHERE id = ? AND user_id = ?")
        .bind(notification_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}
