use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{new_id, now_ms};

/// Directed edge: `follower_id` follows `following_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Follow {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub created_at: i64,
}

impl Follow {
    pub fn new(follower_id: String, following_id: String) -> Self {
        Self {
            id: new_id(),
            follower_id,
            following_id,
            created_at: now_ms(),
        }
    }
}
