pub mod auth;
pub mod collections;
pub mod discovery;
pub mod follows;
pub mod notifications;
pub mod presence;
pub mod recipes;
pub mod social;
pub mod users;

use serde::Deserialize;

/// `?limit=` shared by the capped listings
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}
