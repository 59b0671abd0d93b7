use serde::{Deserialize, Deserializer};
use sqlx::SqlitePool;
use sqlx::types::Json;
use std::fs;

use crate::models::{Recipe, RecipeStatus, User, new_id, now_ms};
use crate::recipes::generate_slug;
use crate::users;

const DEFAULT_CATEGORY: &str = "Uncategorized";

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrInt {
    String(String),
    Int(i64),
}

/// Minutes from either a bare number or an ISO-8601 `PT#H#M` duration
pub fn parse_minutes(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(minutes) = value.parse::<i64>() {
        return Some(minutes);
    }

    let rest = value.strip_prefix("PT")?;
    let (hours, rest) = match rest.split_once('H') {
        Some((h, rest)) => (h.parse::<i64>().ok()?, rest),
        None => (0, rest),
    };
    let minutes = match rest.strip_suffix('M') {
        Some(m) => m.parse::<i64>().ok()?,
        None if rest.is_empty() => 0,
        None => return None,
    };
    Some(hours * 60 + minutes)
}

// Times arrive as minutes, numeric strings or ISO durations
fn deserialize_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrInt>::deserialize(deserializer)? {
        Some(StringOrInt::Int(i)) => Some(i),
        Some(StringOrInt::String(s)) => parse_minutes(&s),
        None => None,
    })
}

// "4 servings" and 4 both mean four
fn deserialize_yield<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrInt>::deserialize(deserializer)? {
        Some(StringOrInt::Int(i)) => Some(i),
        Some(StringOrInt::String(s)) => s
            .split_whitespace()
            .next()
            .and_then(|n| n.parse().ok()),
        None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Instruction {
    Text(String),
    Step { text: Option<String> },
}

impl Instruction {
    fn into_text(self) -> Option<String> {
        let text = match self {
            Instruction::Text(t) => t,
            Instruction::Step { text } => text?,
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// One schema.org-style recipe from an export file
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedRecipe {
    name: String,
    description: Option<String>,
    recipe_category: Option<String>,
    #[serde(default)]
    recipe_ingredient: Vec<String>,
    #[serde(default)]
    recipe_instructions: Vec<Instruction>,
    #[serde(default, deserialize_with = "deserialize_minutes")]
    prep_time: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_minutes")]
    cook_time: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_yield")]
    recipe_yield: Option<i64>,
}

impl ImportedRecipe {
    fn into_draft(self, user_id: &str, now: i64) -> Option<Recipe> {
        let title = self.name.trim().to_string();
        if title.is_empty() {
            return None;
        }

        Some(Recipe {
            id: new_id(),
            slug: generate_slug(&title),
            title,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            category: self
                .recipe_category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            ingredients: Json(
                self.recipe_ingredient
                    .into_iter()
                    .map(|i| i.trim().to_string())
                    .filter(|i| !i.is_empty())
                    .collect(),
            ),
            steps: Json(
                self.recipe_instructions
                    .into_iter()
                    .filter_map(Instruction::into_text)
                    .collect(),
            ),
            cover_image: None,
            video_url: None,
            status: RecipeStatus::Draft,
            publish_at: None,
            user_id: user_id.to_string(),
            forked_from: None,
            servings: self.recipe_yield.filter(|s| *s > 0),
            prep_time: self.prep_time.filter(|t| *t >= 0),
            cook_time: self.cook_time.filter(|t| *t >= 0),
            difficulty: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Import a JSON array of recipes as drafts owned by `user_id`. All or nothing.
pub async fn import_recipes(
    pool: &SqlitePool,
    file_path: &str,
    user_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    // Verify user exists before importing
    if User::find(pool, user_id).await?.is_none() {
        return Err(format!("User with ID '{}' not found", user_id).into());
    }

    let content = fs::read_to_string(file_path)?;
    let items: Vec<ImportedRecipe> = serde_json::from_str(&content)?;

    let now = now_ms();
    let mut imported = 0;
    let mut skipped = 0;
    let mut tx = pool.begin().await?;

    for item in items {
        match item.into_draft(user_id, now) {
            Some(recipe) => {
                recipe.insert(&mut *tx).await?;
                imported += 1;
            }
            None => skipped += 1,
        }
    }

    tx.commit().await?;
    tracing::info!(imported, skipped, user_id, "recipe import finished");
    println!("Imported {} recipes ({} skipped without a title)", imported, skipped);
    Ok(())
}

pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    email: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = users::create(pool, name, email).await?;

    println!("Created user:");
    println!("  ID: {}", user.id);
    println!("  Name: {}", user.name);
    println!("  Invite Code: {}", user.invite_code);

    Ok(())
}
