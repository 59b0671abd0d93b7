//! Scheduled maintenance. Each job deletes or updates a bounded batch and is
//! safe to run again over the same rows.

use std::time::Duration;

use sqlx::SqlitePool;

use crate::constants::{
    DAY_MS, PRESENCE_SWEEP_BATCH, PRESENCE_TTL_MS, PUBLISH_BATCH, VIEW_CLEANUP_BATCH,
    VIEW_RETENTION_MS,
};
use crate::error::Result;

/// Delete up to one batch of recipe views older than the retention window.
pub async fn cleanup_old_views(db: &SqlitePool, now: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM recipe_views WHERE id IN (
            SELECT id FROM recipe_views WHERE timestamp < ? LIMIT ?
        )
        "#,
    )
    .bind(now - VIEW_RETENTION_MS)
    .bind(VIEW_CLEANUP_BATCH)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Publish drafts whose `publish_at` has passed, clearing `publish_at`.
pub async fn publish_scheduled(db: &SqlitePool, now: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE recipes
        SET status = 'published', publish_at = NULL, updated_at = ?1
        WHERE id IN (
            SELECT id FROM recipes
            WHERE status = 'draft' AND publish_at IS NOT NULL AND publish_at <= ?1
            ORDER BY publish_at ASC
            LIMIT ?2
        )
        "#,
    )
    .bind(now)
    .bind(PUBLISH_BATCH)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Storage hygiene only; stale rows are already ignored by readers.
pub async fn sweep_stale_presence(db: &SqlitePool, now: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM presence WHERE id IN (
            SELECT id FROM presence WHERE last_seen <= ? LIMIT ?
        )
        "#,
    )
    .bind(now - PRESENCE_TTL_MS)
    .bind(PRESENCE_SWEEP_BATCH)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

fn spawn_every<F, Fut>(name: &'static str, period: Duration, db: SqlitePool, job: F)
where
    F: Fn(SqlitePool, i64) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<u64>> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match job(db.clone(), crate::models::now_ms()).await {
                Ok(0) => tracing::debug!(job = name, "nothing to do"),
                Ok(n) => tracing::info!(job = name, rows = n, "job finished"),
                Err(e) => tracing::error!(job = name, "job failed: {e}"),
            }
        }
    });
}

/// Start every scheduled job on the current runtime.
pub fn spawn_all(db: SqlitePool) {
    spawn_every(
        "cleanup_old_views",
        Duration::from_millis(DAY_MS as u64),
        db.clone(),
        |db, now| async move { cleanup_old_views(&db, now).await },
    );
    spawn_every(
        "publish_scheduled",
        Duration::from_secs(5 * 60),
        db.clone(),
        |db, now| async move { publish_scheduled(&db, now).await },
    );
    spawn_every(
        "sweep_stale_presence",
        Duration::from_secs(60),
        db,
        |db, now| async move { sweep_stale_presence(&db, now).await },
    );
}
