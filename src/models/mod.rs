pub mod user;
pub mod recipe;
pub mod engagement;
pub mod follow;
pub mod notification;
pub mod collection;
pub mod presence;
pub mod view;

pub use user::{AuthorSummary, User};
pub use recipe::{Difficulty, Recipe, RecipeCard, RecipeStatus};
pub use engagement::{Bookmark, Comment, Like, Rating};
pub use follow::Follow;
pub use notification::{Notification, NotificationKind};
pub use collection::Collection;
pub use presence::Presence;
pub use view::RecipeView;

use chrono::Utc;
use uuid::Uuid;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
