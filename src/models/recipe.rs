use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

use super::AuthorSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecipeStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub ingredients: Json<Vec<String>>,
    pub steps: Json<Vec<String>>,
    pub cover_image: Option<String>,
    pub video_url: Option<String>,
    pub status: RecipeStatus,
    /// Epoch ms at which a scheduled draft goes live
    pub publish_at: Option<i64>,
    pub user_id: String,
    pub forked_from: Option<String>,
    pub servings: Option<i64>,
    /// Minutes
    pub prep_time: Option<i64>,
    /// Minutes
    pub cook_time: Option<i64>,
    pub difficulty: Option<Difficulty>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Recipe {
    pub fn is_published(&self) -> bool {
        self.status == RecipeStatus::Published
    }

    /// Drafts are visible to their owner only.
    pub fn is_visible_to(&self, viewer: Option<&str>) -> bool {
        self.is_published() || viewer == Some(self.user_id.as_str())
    }

    /// Prep plus cook time in minutes; zero when neither is known.
    pub fn total_time(&self) -> i64 {
        self.prep_time.unwrap_or(0) + self.cook_time.unwrap_or(0)
    }

    pub fn has_ingredient(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.ingredients
            .iter()
            .any(|i| i.to_lowercase().contains(&needle))
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn fetch_many(
        db: &SqlitePool,
        ids: &[String],
    ) -> Result<HashMap<String, Recipe>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM recipes WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let recipes: Vec<Recipe> = qb.build_query_as().fetch_all(db).await?;
        Ok(recipes.into_iter().map(|r| (r.id.clone(), r)).collect())
    }

    pub async fn insert<'e, E>(&self, executor: E) -> Result<(), sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO recipes (
                id, slug, title, description, category, ingredients, steps, cover_image,
                video_url, status, publish_at, user_id, forked_from, servings, prep_time,
                cook_time, difficulty, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.slug)
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.category)
        .bind(&self.ingredients)
        .bind(&self.steps)
        .bind(&self.cover_image)
        .bind(&self.video_url)
        .bind(self.status)
        .bind(self.publish_at)
        .bind(&self.user_id)
        .bind(&self.forked_from)
        .bind(self.servings)
        .bind(self.prep_time)
        .bind(self.cook_time)
        .bind(self.difficulty)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(executor)
        .await?;
        Ok(())
    }
}

/// A recipe as returned to clients: the document plus its resolved cover URL
/// and, depending on the listing, a trending score or author summary.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeCard {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trending_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorSummary>,
}
