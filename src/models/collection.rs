use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{new_id, now_ms};

/// A named grouping of the owner's bookmarks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Collection {
    pub fn new(user_id: String, name: String) -> Self {
        let now = now_ms();
        Self {
            id: new_id(),
            user_id,
            name,
            created_at: now,
            updated_at: now,
        }
    }
}
