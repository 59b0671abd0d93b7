//! "Who's cooking this right now". Liveness is decided by heartbeat age, so
//! rows left behind by a missed `leave` simply stop counting after the TTL.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::constants::{PRESENCE_MAX_USERS, PRESENCE_TTL_MS};
use crate::error::Result;
use crate::models::{Presence, User, new_id};
use crate::recipes::require_visible;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookSummary {
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cooking {
    pub count: i64,
    pub users: Vec<CookSummary>,
}

pub async fn heartbeat(db: &SqlitePool, user_id: &str, recipe_id: &str, now: i64) -> Result<()> {
    require_visible(db, recipe_id, Some(user_id)).await?;

    sqlx::query(
        r#"
        INSERT INTO presence (id, recipe_id, user_id, last_seen)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (user_id, recipe_id) DO UPDATE SET last_seen = excluded.last_seen
        "#,
    )
    .bind(new_id())
    .bind(recipe_id)
    .bind(user_id)
    .bind(now)
    .execute(db)
    .await?;
    Ok(())
}

/// Best-effort; leaving a page you never joined is fine.
pub async fn leave(db: &SqlitePool, user_id: &str, recipe_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM presence WHERE user_id = ? AND recipe_id = ?")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Active cooks other than the caller, with at most five of them named.
pub async fn cooking(
    db: &SqlitePool,
    recipe_id: &str,
    viewer: Option<&str>,
    now: i64,
) -> Result<Cooking> {
    let rows: Vec<Presence> = sqlx::query_as(
        "SELECT * FROM presence WHERE recipe_id = ? ORDER BY last_seen DESC, rowid DESC",
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;

    let others: Vec<Presence> = rows
        .into_iter()
        .filter(|p| p.is_active(now, PRESENCE_TTL_MS))
        .filter(|p| Some(p.user_id.as_str()) != viewer)
        .collect();

    let named: Vec<String> = others
        .iter()
        .take(PRESENCE_MAX_USERS)
        .map(|p| p.user_id.clone())
        .collect();
    let users = User::fetch_many(db, &named).await?;

    Ok(Cooking {
        count: others.len() as i64,
        users: named
            .iter()
            .filter_map(|id| users.get(id))
            .map(|u| CookSummary {
                name: u.name.clone(),
                image: u.image.clone(),
            })
            .collect(),
    })
}
