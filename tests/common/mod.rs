use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use mise::blobs::SqliteBlobStore;
use mise::models::{Recipe, RecipeStatus, now_ms};
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;
use std::str::FromStr;

pub const BLOB_BASE_URL: &str = "http://blobs.test";

pub const SECOND_MS: i64 = 1000;
pub const DAY_MS: i64 = 24 * 60 * 60 * SECOND_MS;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let router = mise::build_app(pool.clone(), false, BLOB_BASE_URL)
            .await
            .expect("Failed to build app");

        Self { router, db: pool }
    }

    pub fn blobs(&self) -> SqliteBlobStore {
        SqliteBlobStore::new(self.db.clone(), BLOB_BASE_URL)
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a user in the database and return (user_id, invite_code).
    pub async fn create_user(&self, name: &str) -> (String, String) {
        let id = uuid::Uuid::new_v4().to_string();
        let invite_code = uuid::Uuid::new_v4().to_string();
        let now = now_ms();

        sqlx::query(
            "INSERT INTO users (id, name, invite_code, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(&invite_code)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .expect("Failed to create test user");

        (id, invite_code)
    }

    /// Log in as the given user and return the session cookie string.
    pub async fn login(&self, invite_code: &str) -> String {
        let resp = self
            .post_json("/login", serde_json::json!({ "invite_code": invite_code }), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        resp.headers()
            .get("set-cookie")
            .expect("Login should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    /// Create a user and log them in; returns (user_id, cookie).
    pub async fn signed_in(&self, name: &str) -> (String, String) {
        let (id, invite_code) = self.create_user(name).await;
        let cookie = self.login(&invite_code).await;
        (id, cookie)
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.request(req).await
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("GET", uri, None, cookie).await
    }

    /// POST without a body.
    pub async fn post(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("POST", uri, None, cookie).await
    }

    pub async fn post_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response {
        self.send("POST", uri, Some(body), cookie).await
    }

    pub async fn put_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response {
        self.send("PUT", uri, Some(body), cookie).await
    }

    pub async fn patch_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response {
        self.send("PATCH", uri, Some(body), cookie).await
    }

    /// Send a DELETE request with an optional session cookie.
    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("DELETE", uri, None, cookie).await
    }

    /// Insert a recipe row as-is, bypassing validation and slug generation.
    pub async fn insert_recipe(&self, recipe: &Recipe) {
        recipe.insert(&self.db).await.expect("Failed to insert recipe");
    }

    /// Published recipe with defaults; returns its id.
    pub async fn publish(&self, user_id: &str, title: &str, category: &str) -> String {
        let mut r = recipe(user_id, title);
        r.category = category.to_string();
        self.insert_recipe(&r).await;
        r.id
    }

    /// Insert a like with an explicit creation time.
    pub async fn like_at(&self, user_id: &str, recipe_id: &str, created_at: i64) {
        sqlx::query("INSERT INTO likes (id, recipe_id, user_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(recipe_id)
            .bind(user_id)
            .bind(created_at)
            .execute(&self.db)
            .await
            .expect("Failed to insert like");
    }

    pub async fn count(&self, sql: &str, id: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(sql)
            .bind(id)
            .fetch_one(&self.db)
            .await
            .unwrap();
        n
    }
}

/// A published recipe owned by `user_id` with a unique slug and no optional
/// fields; tweak fields before inserting.
pub fn recipe(user_id: &str, title: &str) -> Recipe {
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_ms();
    Recipe {
        slug: format!("{}-{}", title.to_lowercase().replace(' ', "-"), &id[..8]),
        id,
        title: title.to_string(),
        description: None,
        category: "Dinner".to_string(),
        ingredients: Json(Vec::new()),
        steps: Json(Vec::new()),
        cover_image: None,
        video_url: None,
        status: RecipeStatus::Published,
        publish_at: None,
        user_id: user_id.to_string(),
        forked_from: None,
        servings: None,
        prep_time: None,
        cook_time: None,
        difficulty: None,
        created_at: now,
        updated_at: now,
    }
}

/// Read the full response body as JSON.
pub async fn body_json(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Titles of a JSON array of recipe cards, in order.
pub fn titles(cards: &Value) -> Vec<String> {
    cards
        .as_array()
        .expect("Expected a JSON array")
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect()
}

pub async fn assert_error(resp: Response, status: StatusCode, message: &str) {
    assert_eq!(resp.status(), status);
    let body = body_json(resp).await;
    assert_eq!(body["error"], message);
}
