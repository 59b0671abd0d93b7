mod common;

use axum::http::StatusCode;
use common::{TestApp, assert_error, body_json};
use serde_json::json;

#[tokio::test]
async fn follow_toggle_counts_and_check() {
    let app = TestApp::new().await;
    let (a, cookie_a) = app.signed_in("A").await;
    let (b, cookie_b) = app.signed_in("B").await;

    let resp = app.get(&format!("/users/{b}/follow"), Some(&cookie_a)).await;
    assert_eq!(body_json(resp).await, json!({ "following": false }));

    let resp = app.post(&format!("/users/{b}/follow"), Some(&cookie_a)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "following": true }));

    let resp = app.get(&format!("/users/{b}/follow"), Some(&cookie_a)).await;
    assert_eq!(body_json(resp).await, json!({ "following": true }));
    // Anonymous callers follow nobody
    let resp = app.get(&format!("/users/{b}/follow"), None).await;
    assert_eq!(body_json(resp).await, json!({ "following": false }));

    app.post(&format!("/users/{a}/follow"), Some(&cookie_b)).await;

    let counts = body_json(app.get(&format!("/users/{b}/follow-counts"), None).await).await;
    assert_eq!(counts, json!({ "followers": 1, "following": 1 }));

    app.post(&format!("/users/{b}/follow"), Some(&cookie_a)).await;
    let counts = body_json(app.get(&format!("/users/{b}/follow-counts"), None).await).await;
    assert_eq!(counts, json!({ "followers": 0, "following": 1 }));
}

#[tokio::test]
async fn cannot_follow_yourself() {
    let app = TestApp::new().await;
    let (a, cookie) = app.signed_in("A").await;

    let resp = app.post(&format!("/users/{a}/follow"), Some(&cookie)).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "You cannot follow yourself").await;
    assert_eq!(
        app.count("SELECT COUNT(*) FROM follows WHERE follower_id = ?", &a).await,
        0
    );
}

#[tokio::test]
async fn following_unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let (_a, cookie) = app.signed_in("A").await;

    let resp = app.post("/users/ghost/follow", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn follow_notifies_once_per_edge_creation() {
    let app = TestApp::new().await;
    let (a, cookie_a) = app.signed_in("A").await;
    let (b, cookie_b) = app.signed_in("B").await;

    let uri = format!("/users/{b}/follow");
    app.post(&uri, Some(&cookie_a)).await; // follow
    app.post(&uri, Some(&cookie_a)).await; // unfollow

    let notes = body_json(app.get("/notifications", Some(&cookie_b)).await).await;
    let notes = notes.as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["type"], "follow");
    assert_eq!(notes[0]["actor"]["id"], a.as_str());
    assert!(notes[0]["recipe"].is_null());
}
