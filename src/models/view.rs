use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{new_id, now_ms};

/// Fire-and-forget analytics event, purged after the retention window.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeView {
    pub id: String,
    pub recipe_id: String,
    pub timestamp: i64,
}

impl RecipeView {
    pub fn new(recipe_id: String) -> Self {
        Self {
            id: new_id(),
            recipe_id,
            timestamp: now_ms(),
        }
    }
}
