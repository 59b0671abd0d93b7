use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::{User, new_id, now_ms};

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
}

/// Public profile; no email, no invite code.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            image: user.image,
            bio: user.bio,
        }
    }
}

fn valid_username(username: &str) -> bool {
    (3..=30).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub async fn create(db: &SqlitePool, name: &str, email: Option<&str>) -> Result<User> {
    let now = now_ms();
    let user = User {
        id: new_id(),
        name: name.to_string(),
        username: None,
        email: email.map(str::to_string),
        image: None,
        bio: None,
        invite_code: new_id(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO users (id, name, email, invite_code, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.invite_code)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(db)
    .await?;

    Ok(user)
}

/// The signed-in user as currently stored. A session whose user has since
/// been removed is treated as signed out.
pub async fn current(db: &SqlitePool, user_id: &str) -> Result<User> {
    User::find(db, user_id).await?.ok_or(AppError::Unauthorized)
}

pub async fn by_invite_code(db: &SqlitePool, invite_code: &str) -> Result<Option<User>> {
    let user = sqlx::query_as("SELECT * FROM users WHERE invite_code = ?")
        .bind(invite_code)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn by_username(db: &SqlitePool, username: &str) -> Result<Profile> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(db)
        .await?;
    user.map(Profile::from).ok_or(AppError::NotFound)
}

/// Patch the caller's profile. Absent fields are left alone; a username
/// already held by someone else is a conflict.
pub async fn update_profile(db: &SqlitePool, user_id: &str, update: ProfileUpdate) -> Result<User> {
    let mut user = current(db, user_id).await?;

    if let Some(name) = update.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }
        user.name = name.to_string();
    }

    if let Some(username) = update.username {
        let username = username.trim().to_lowercase();
        if !valid_username(&username) {
            return Err(AppError::validation(
                "Username must be 3-30 letters, digits, '-' or '_'",
            ));
        }
        let taken: Option<(String,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = ? AND id <> ?")
                .bind(&username)
                .bind(user_id)
                .fetch_optional(db)
                .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        user.username = Some(username);
    }

    if let Some(bio) = update.bio {
        let bio = bio.trim();
        user.bio = (!bio.is_empty()).then(|| bio.to_string());
    }

    user.updated_at = now_ms();
    let result = sqlx::query(
        "UPDATE users SET name = ?, username = ?, bio = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&user.name)
    .bind(&user.username)
    .bind(&user.bio)
    .bind(user.updated_at)
    .bind(user_id)
    .execute(db)
    .await;

    match result {
        Ok(_) => Ok(user),
        // Lost a race for the username against another update.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AppError::Conflict("Username already taken".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
