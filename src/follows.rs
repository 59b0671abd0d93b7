//! Directed follow edges between users.

use std::collections::HashSet;
use std::future::Future;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::{Follow, NotificationKind, User};
use crate::notifications;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowToggle {
    pub following: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowCounts {
    pub followers: i64,
    pub following: i64,
}

/// Where follower/following counts come from. The default scans the edge
/// table; a maintained counter can replace it without touching callers.
pub trait FollowCountSource: Send + Sync {
    fn followers(&self, user_id: &str) -> impl Future<Output = Result<i64>> + Send;
    fn following(&self, user_id: &str) -> impl Future<Output = Result<i64>> + Send;
}

#[derive(Clone)]
pub struct FollowEdgeScan {
    db: SqlitePool,
}

impl FollowEdgeScan {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

impl FollowCountSource for FollowEdgeScan {
    async fn followers(&self, user_id: &str) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM follows WHERE following_id = ?")
                .bind(user_id)
                .fetch_one(&self.db)
                .await?;
        Ok(count)
    }

    async fn following(&self, user_id: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}

pub async fn toggle(db: &SqlitePool, follower_id: &str, target_id: &str) -> Result<FollowToggle> {
    if follower_id == target_id {
        return Err(AppError::validation("You cannot follow yourself"));
    }
    if User::find(db, target_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let removed = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
        .bind(follower_id)
        .bind(target_id)
        .execute(db)
        .await?
        .rows_affected();

    if removed > 0 {
        return Ok(FollowToggle { following: false });
    }

    let follow = Follow::new(follower_id.to_string(), target_id.to_string());
    let inserted = sqlx::query(
        r#"
        INSERT INTO follows (id, follower_id, following_id, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (follower_id, following_id) DO NOTHING
        "#,
    )
    .bind(&follow.id)
    .bind(&follow.follower_id)
    .bind(&follow.following_id)
    .bind(follow.created_at)
    .execute(db)
    .await?
    .rows_affected();

    if inserted > 0 {
        notifications::notify(
            db,
            target_id,
            NotificationKind::Follow,
            follower_id,
            None,
            follow.created_at,
        )
        .await?;
    }

    Ok(FollowToggle { following: true })
}

pub async fn is_following(db: &SqlitePool, viewer: Option<&str>, target_id: &str) -> Result<bool> {
    let Some(viewer) = viewer else {
        return Ok(false);
    };

    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ? AND following_id = ?)",
    )
    .bind(viewer)
    .bind(target_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

pub async fn counts<S: FollowCountSource>(source: &S, user_id: &str) -> Result<FollowCounts> {
    Ok(FollowCounts {
        followers: source.followers(user_id).await?,
        following: source.following(user_id).await?,
    })
}

/// Ids of everyone `user_id` follows.
pub async fn following_ids(db: &SqlitePool, user_id: &str) -> Result<HashSet<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT following_id FROM follows WHERE follower_id = ?")
        .bind(user_id)
        .fetch_all(db)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
