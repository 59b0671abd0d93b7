use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row per (user, recipe); refreshed by heartbeats.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Presence {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    pub last_seen: i64,
}

impl Presence {
    pub fn is_active(&self, now: i64, ttl_ms: i64) -> bool {
        self.last_seen > now - ttl_ms
    }
}
