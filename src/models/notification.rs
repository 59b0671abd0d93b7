use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum NotificationKind {
    #[serde(rename = "like")]
    #[sqlx(rename = "like")]
    Like,
    #[serde(rename = "comment")]
    #[sqlx(rename = "comment")]
    Comment,
    #[serde(rename = "follow")]
    #[sqlx(rename = "follow")]
    Follow,
    #[serde(rename = "fork")]
    #[sqlx(rename = "fork")]
    Fork,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Like => write!(f, "like"),
            NotificationKind::Comment => write!(f, "comment"),
            NotificationKind::Follow => write!(f, "follow"),
            NotificationKind::Fork => write!(f, "fork"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: String,
    /// Recipient
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub actor_id: String,
    pub recipe_id: Option<String>,
    pub read: bool,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_as_type_field() {
        let n = Notification {
            id: "n1".to_string(),
            user_id: "u1".to_string(),
            kind: NotificationKind::Fork,
            actor_id: "u2".to_string(),
            recipe_id: None,
            read: false,
            created_at: 1,
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "fork");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn kind_display() {
        assert_eq!(NotificationKind::Like.to_string(), "like");
        assert_eq!(NotificationKind::Comment.to_string(), "comment");
        assert_eq!(NotificationKind::Follow.to_string(), "follow");
    }
}
