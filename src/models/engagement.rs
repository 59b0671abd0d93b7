use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{new_id, now_ms};

/// At most one per (user_id, recipe_id), enforced by a unique index.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Like {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    pub created_at: i64,
}

impl Like {
    pub fn new(recipe_id: String, user_id: String) -> Self {
        Self {
            id: new_id(),
            recipe_id,
            user_id,
            created_at: now_ms(),
        }
    }
}

/// At most one per (user_id, recipe_id). `collection_id` of `None` means
/// "uncategorized".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bookmark {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    pub collection_id: Option<String>,
    pub created_at: i64,
}

impl Bookmark {
    pub fn new(recipe_id: String, user_id: String, collection_id: Option<String>) -> Self {
        Self {
            id: new_id(),
            recipe_id,
            user_id,
            collection_id,
            created_at: now_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    pub value: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Content is stored HTML-escaped.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: i64,
}

impl Comment {
    pub fn new(recipe_id: String, user_id: String, content: String) -> Self {
        Self {
            id: new_id(),
            recipe_id,
            user_id,
            content,
            created_at: now_ms(),
        }
    }
}
