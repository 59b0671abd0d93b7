use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
    #[serde(default, skip_serializing)]
    pub invite_code: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Public projection of a user attached to recipes, comments and notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub image: Option<String>,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            image: user.image.clone(),
        }
    }
}

impl User {
    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Resolve a set of ids in one round trip. Missing ids are simply absent
    /// from the map.
    pub async fn fetch_many(
        db: &SqlitePool,
        ids: &[String],
    ) -> Result<HashMap<String, User>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM users WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let users: Vec<User> = qb.build_query_as().fetch_all(db).await?;
        Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
    }
}
