//! Trending, recommendations, search and the follow feed.
//!
//! Every listing here returns published recipes only, whatever the like or
//! follow data points at.

use std::collections::HashSet;
use std::future::Future;

use serde::Deserialize;
use sqlx::SqlitePool;

use crate::blobs::BlobStore;
use crate::constants::{
    FEED_WINDOW_FACTOR, RECOMMENDATION_PER_CATEGORY, RECOMMENDATION_SEED_LIKES,
    SEARCH_CANDIDATES, SEARCH_LIMIT, TRENDING_WINDOW_MS, clamp_limit,
};
use crate::error::Result;
use crate::follows;
use crate::models::{AuthorSummary, Difficulty, Recipe, RecipeCard, User};
use crate::recipes::{card, with_cover_urls};

/// Per-recipe like counts inside a time window.
///
/// The default implementation recounts the likes table on every call, which is
/// fine at small scale. A rolling counter can implement this instead.
pub trait TrendingSource: Send + Sync {
    /// `(recipe_id, likes)` for likes created strictly after `since` (epoch ms).
    fn like_counts_since(
        &self,
        since: i64,
    ) -> impl Future<Output = Result<Vec<(String, i64)>>> + Send;
}

#[derive(Clone)]
pub struct LikeWindowScan {
    db: SqlitePool,
}

impl LikeWindowScan {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

impl TrendingSource for LikeWindowScan {
    async fn like_counts_since(&self, since: i64) -> Result<Vec<(String, i64)>> {
        let counts: Vec<(String, i64)> = sqlx::query_as(
            "SELECT recipe_id, COUNT(*) FROM likes WHERE created_at > ? GROUP BY recipe_id",
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;
        Ok(counts)
    }
}

/// Most likes first; equal counts fall back to recipe id ascending so the
/// order never depends on how the counts were gathered.
pub fn rank_trending(mut counts: Vec<(String, i64)>, limit: usize) -> Vec<(String, i64)> {
    counts.sort_by(|(a_id, a), (b_id, b)| b.cmp(a).then_with(|| a_id.cmp(b_id)));
    counts.truncate(limit);
    counts
}

/// Top `limit` recipes by likes in the trailing seven days. Ranking happens
/// before resolution, so ids that no longer resolve to a published recipe
/// leave a gap rather than pulling in the next candidate.
pub async fn trending<S: TrendingSource, B: BlobStore>(
    db: &SqlitePool,
    source: &S,
    blobs: &B,
    now: i64,
    limit: i64,
) -> Result<Vec<RecipeCard>> {
    let counts = source.like_counts_since(now - TRENDING_WINDOW_MS).await?;
    let ranked = rank_trending(counts, limit.max(0) as usize);

    let ids: Vec<String> = ranked.iter().map(|(id, _)| id.clone()).collect();
    let mut recipes = Recipe::fetch_many(db, &ids).await?;

    let mut cards = Vec::with_capacity(ranked.len());
    for (id, score) in ranked {
        let Some(recipe) = recipes.remove(&id) else {
            continue;
        };
        if !recipe.is_published() {
            continue;
        }
        let mut card = card(blobs, recipe).await?;
        card.trending_score = Some(score);
        cards.push(card);
    }
    Ok(cards)
}

async fn recent_published(db: &SqlitePool, limit: i64) -> Result<Vec<Recipe>> {
    let recipes = sqlx::query_as(
        "SELECT * FROM recipes WHERE status = 'published' ORDER BY created_at DESC, rowid DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(recipes)
}

async fn recent_in_category(db: &SqlitePool, category: &str, limit: i64) -> Result<Vec<Recipe>> {
    let recipes = sqlx::query_as(
        r#"
        SELECT * FROM recipes
        WHERE category = ? AND status = 'published'
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(category)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(recipes)
}

/// Content-based: recommend recent recipes from the categories of what the
/// user liked, excluding recipes they already liked or wrote. Users with no
/// identity or no likes get the newest recipes instead.
pub async fn recommendations<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    viewer: Option<&str>,
    limit: i64,
) -> Result<Vec<RecipeCard>> {
    let Some(user_id) = viewer else {
        return with_cover_urls(blobs, recent_published(db, limit).await?).await;
    };

    let liked: Vec<(String,)> = sqlx::query_as(
        "SELECT recipe_id FROM likes WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    if liked.is_empty() {
        return with_cover_urls(blobs, recent_published(db, limit).await?).await;
    }

    let liked_ids: HashSet<String> = liked.iter().map(|(id,)| id.clone()).collect();
    let seed: Vec<String> = liked
        .into_iter()
        .take(RECOMMENDATION_SEED_LIKES as usize)
        .map(|(id,)| id)
        .collect();
    let seed_recipes = Recipe::fetch_many(db, &seed).await?;

    let mut categories: Vec<String> = Vec::new();
    for id in &seed {
        if let Some(recipe) = seed_recipes.get(id) {
            if !categories.contains(&recipe.category) {
                categories.push(recipe.category.clone());
            }
        }
    }

    let mut seen = HashSet::new();
    let mut picks = Vec::new();
    for category in &categories {
        for recipe in recent_in_category(db, category, RECOMMENDATION_PER_CATEGORY).await? {
            if liked_ids.contains(&recipe.id) || recipe.user_id == user_id {
                continue;
            }
            if seen.insert(recipe.id.clone()) {
                picks.push(recipe);
            }
        }
    }
    picks.truncate(limit.max(0) as usize);

    with_cover_urls(blobs, picks).await
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    /// Minutes of prep plus cook time
    pub max_time: Option<i64>,
    pub ingredient: Option<String>,
    pub limit: Option<i64>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Turn free text into an FTS5 expression: quoted terms OR-ed together, the
/// last one as a prefix so partially typed words still match. Terms without
/// any alphanumeric character are dropped.
pub fn fts_expression(text: &str) -> Option<String> {
    let terms: Vec<&str> = text
        .split_whitespace()
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .collect();
    let last = terms.len().checked_sub(1)?;

    let parts: Vec<String> = terms
        .iter()
        .enumerate()
        .map(|(i, term)| {
            let quoted = format!("\"{}\"", term.replace('"', "\"\""));
            if i == last { format!("{quoted}*") } else { quoted }
        })
        .collect();
    Some(parts.join(" OR "))
}

async fn full_text(db: &SqlitePool, text: &str, category: Option<&str>) -> Result<Vec<Recipe>> {
    let Some(expression) = fts_expression(text) else {
        return Ok(Vec::new());
    };

    let recipes = sqlx::query_as(
        r#"
        SELECT r.* FROM recipes_fts
        JOIN recipes r ON r.id = recipes_fts.recipe_id
        WHERE recipes_fts MATCH ?1
          AND r.status = 'published'
          AND (?2 IS NULL OR r.category = ?2)
        ORDER BY rank
        LIMIT ?3
        "#,
    )
    .bind(expression)
    .bind(category)
    .bind(SEARCH_CANDIDATES)
    .fetch_all(db)
    .await?;
    Ok(recipes)
}

/// One retrieval strategy (full text, else category, else recency), then the
/// remaining filters applied in memory, then the limit.
pub async fn search<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    params: &SearchParams,
) -> Result<Vec<RecipeCard>> {
    let category = present(&params.category);
    let ingredient = present(&params.ingredient);

    let candidates = match (present(&params.query), category) {
        (Some(text), _) => full_text(db, text, category).await?,
        (None, Some(category)) => recent_in_category(db, category, SEARCH_CANDIDATES).await?,
        (None, None) => recent_published(db, SEARCH_CANDIDATES).await?,
    };

    let limit = clamp_limit(params.limit, SEARCH_LIMIT) as usize;
    let matches: Vec<Recipe> = candidates
        .into_iter()
        .filter(|r| params.difficulty.is_none_or(|d| r.difficulty == Some(d)))
        .filter(|r| match params.max_time {
            Some(max) if max > 0 => {
                let total = r.total_time();
                total > 0 && total <= max
            }
            _ => true,
        })
        .filter(|r| ingredient.is_none_or(|needle| r.has_ingredient(needle)))
        .take(limit)
        .collect();

    with_cover_urls(blobs, matches).await
}

/// Fan-out-on-read: the newest `limit * 5` published recipes filtered down to
/// authors the user follows. Followed users who post rarely can fall outside
/// that window; pre-computed per-follower feeds would avoid this at scale.
pub async fn feed<B: BlobStore>(
    db: &SqlitePool,
    blobs: &B,
    user_id: &str,
    limit: i64,
) -> Result<Vec<RecipeCard>> {
    let following = follows::following_ids(db, user_id).await?;
    if following.is_empty() {
        return Ok(Vec::new());
    }

    let window = recent_published(db, limit * FEED_WINDOW_FACTOR).await?;
    let recipes: Vec<Recipe> = window
        .into_iter()
        .filter(|r| following.contains(&r.user_id))
        .take(limit.max(0) as usize)
        .collect();

    let mut author_ids: Vec<String> = recipes.iter().map(|r| r.user_id.clone()).collect();
    author_ids.sort();
    author_ids.dedup();
    let authors = User::fetch_many(db, &author_ids).await?;

    let mut cards = with_cover_urls(blobs, recipes).await?;
    for card in &mut cards {
        card.author = authors.get(&card.recipe.user_id).map(AuthorSummary::from);
    }
    Ok(cards)
}
