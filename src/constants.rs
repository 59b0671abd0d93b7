/// One day in milliseconds
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Likes older than this do not count towards trending
pub const TRENDING_WINDOW_MS: i64 = 7 * DAY_MS;

/// A heartbeat older than this no longer counts as "cooking now"
pub const PRESENCE_TTL_MS: i64 = 30_000;

/// Most users listed by the cooking-now widget
pub const PRESENCE_MAX_USERS: usize = 5;

/// Recipe views older than this are purged by the daily sweep
pub const VIEW_RETENTION_MS: i64 = 30 * DAY_MS;

// =============================================================================
// Scan bounds
// =============================================================================

/// Candidate pool for search before in-memory filters apply
pub const SEARCH_CANDIDATES: i64 = 100;

/// Liked recipes sampled to derive a user's favourite categories
pub const RECOMMENDATION_SEED_LIKES: i64 = 10;

/// Recent recipes pulled per category when recommending
pub const RECOMMENDATION_PER_CATEGORY: i64 = 20;

/// Feed scans `limit * FEED_WINDOW_FACTOR` recent recipes
pub const FEED_WINDOW_FACTOR: i64 = 5;

pub const VIEW_CLEANUP_BATCH: i64 = 500;
pub const PUBLISH_BATCH: i64 = 100;
pub const PRESENCE_SWEEP_BATCH: i64 = 500;

// =============================================================================
// Request limits (default, ceiling)
// =============================================================================

pub const SEARCH_LIMIT: (i64, i64) = (20, 100);
pub const TRENDING_LIMIT: (i64, i64) = (10, 50);
pub const RECOMMENDATION_LIMIT: (i64, i64) = (10, 50);
pub const FEED_LIMIT: (i64, i64) = (20, 50);
pub const NOTIFICATION_LIMIT: (i64, i64) = (20, 100);
pub const LIST_PAGE_SIZE: (i64, i64) = (50, 100);

/// Clamp a caller-supplied limit into `1..=ceiling`, falling back to the default.
pub fn clamp_limit(requested: Option<i64>, (default, ceiling): (i64, i64)) -> i64 {
    requested.unwrap_or(default).clamp(1, ceiling)
}

// =============================================================================
// Validation bounds
// =============================================================================

pub const COMMENT_MAX_CHARS: usize = 500;
pub const COLLECTION_NAME_MAX_CHARS: usize = 50;
pub const TITLE_MAX_CHARS: usize = 200;
