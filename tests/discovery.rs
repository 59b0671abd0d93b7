mod common;

use axum::http::StatusCode;
use common::{DAY_MS, TestApp, body_json, recipe, titles};
use mise::discovery::{self, LikeWindowScan};
use mise::models::{Difficulty, RecipeStatus, now_ms};

async fn trending_at(app: &TestApp, now: i64, limit: i64) -> Vec<(String, Option<i64>)> {
    let source = LikeWindowScan::new(app.db.clone());
    discovery::trending(&app.db, &source, &app.blobs(), now, limit)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.recipe.title, c.trending_score))
        .collect()
}

#[tokio::test]
async fn three_recent_likes_score_three() {
    let app = TestApp::new().await;
    let (owner, _) = app.signed_in("Owner").await;
    let id = app.publish(&owner, "Crowd Pleaser", "Dinner").await;

    for name in ["A", "B", "C"] {
        let (_u, cookie) = app.signed_in(name).await;
        app.post(&format!("/recipes/{id}/like"), Some(&cookie)).await;
    }

    let resp = app.get("/trending?limit=10", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cards = body_json(resp).await;
    assert_eq!(cards[0]["title"], "Crowd Pleaser");
    assert_eq!(cards[0]["trending_score"], 3);
}

#[tokio::test]
async fn trending_window_is_seven_days() {
    let app = TestApp::new().await;
    let (owner, _) = app.signed_in("Owner").await;
    let (fan, _) = app.create_user("Fan").await;
    let (fan2, _) = app.create_user("Fan 2").await;
    let now = now_ms();

    let old = app.publish(&owner, "Old News", "Dinner").await;
    let fresh = app.publish(&owner, "Fresh", "Dinner").await;
    app.like_at(&fan, &old, now - 8 * DAY_MS).await;
    app.like_at(&fan2, &old, now - 8 * DAY_MS).await;
    app.like_at(&fan, &fresh, now - 6 * DAY_MS).await;

    assert_eq!(
        trending_at(&app, now, 10).await,
        vec![("Fresh".to_string(), Some(1))]
    );
}

#[tokio::test]
async fn trending_orders_by_score_and_skips_drafts() {
    let app = TestApp::new().await;
    let (owner, _) = app.signed_in("Owner").await;
    let mut fans = Vec::new();
    for name in ["A", "B", "C"] {
        fans.push(app.create_user(name).await.0);
    }
    let now = now_ms();

    let one = app.publish(&owner, "One Like", "Dinner").await;
    let two = app.publish(&owner, "Two Likes", "Dinner").await;
    let darling = app.publish(&owner, "Former Darling", "Dinner").await;

    app.like_at(&fans[0], &one, now - 1000).await;
    for fan in &fans[..2] {
        app.like_at(fan, &two, now - 1000).await;
    }
    for fan in &fans {
        app.like_at(fan, &darling, now - 1000).await;
    }
    // Unpublished after collecting likes
    sqlx::query("UPDATE recipes SET status = 'draft' WHERE id = ?")
        .bind(&darling)
        .execute(&app.db)
        .await
        .unwrap();

    assert_eq!(
        trending_at(&app, now, 10).await,
        vec![
            ("Two Likes".to_string(), Some(2)),
            ("One Like".to_string(), Some(1)),
        ]
    );
}

#[tokio::test]
async fn trending_limit_is_capped() {
    let app = TestApp::new().await;
    let resp = app.get("/trending?limit=500", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await.as_array().unwrap().is_empty());
}

async fn seed_desserts(app: &TestApp, owner: &str) {
    let rows: [(&str, &str, Option<i64>, Option<i64>, Option<Difficulty>, RecipeStatus); 6] = [
        ("Quick Mousse", "Dessert", Some(10), Some(10), Some(Difficulty::Easy), RecipeStatus::Published),
        ("Slow Cake", "Dessert", Some(20), Some(40), Some(Difficulty::Easy), RecipeStatus::Published),
        ("Tricky Souffle", "Dessert", Some(10), Some(15), Some(Difficulty::Hard), RecipeStatus::Published),
        ("Untimed Tart", "Dessert", None, None, Some(Difficulty::Easy), RecipeStatus::Published),
        ("Secret Sorbet", "Dessert", Some(5), Some(0), Some(Difficulty::Easy), RecipeStatus::Draft),
        ("Quick Salad", "Lunch", Some(5), Some(0), Some(Difficulty::Easy), RecipeStatus::Published),
    ];
    for (title, category, prep, cook, difficulty, status) in rows {
        let mut r = recipe(owner, title);
        r.category = category.to_string();
        r.prep_time = prep;
        r.cook_time = cook;
        r.difficulty = difficulty;
        r.status = status;
        r.ingredients.0 = vec![format!("{} base", title.to_lowercase())];
        app.insert_recipe(&r).await;
    }
}

#[tokio::test]
async fn search_filters_compose() {
    let app = TestApp::new().await;
    let (owner, _) = app.signed_in("Owner").await;
    seed_desserts(&app, &owner).await;

    let resp = app
        .get("/search?category=Dessert&max_time=30&difficulty=easy", None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(titles(&body_json(resp).await), vec!["Quick Mousse"]);
}

#[tokio::test]
async fn empty_filters_are_no_ops() {
    let app = TestApp::new().await;
    let (owner, _) = app.signed_in("Owner").await;
    seed_desserts(&app, &owner).await;

    let resp = app.get("/search?category=Dessert&query=&ingredient=", None).await;
    let mut found = titles(&body_json(resp).await);
    found.sort();
    assert_eq!(
        found,
        vec!["Quick Mousse", "Slow Cake", "Tricky Souffle", "Untimed Tart"]
    );
}

#[tokio::test]
async fn search_by_text_and_ingredient() {
    let app = TestApp::new().await;
    let (owner, _) = app.signed_in("Owner").await;
    seed_desserts(&app, &owner).await;

    // Last term matches as a prefix
    let resp = app.get("/search?query=qui", None).await;
    let mut found = titles(&body_json(resp).await);
    found.sort();
    assert_eq!(found, vec!["Quick Mousse", "Quick Salad"]);

    let resp = app.get("/search?query=quick&category=Lunch", None).await;
    assert_eq!(titles(&body_json(resp).await), vec!["Quick Salad"]);

    let resp = app.get("/search?ingredient=SLOW%20CAKE", None).await;
    assert_eq!(titles(&body_json(resp).await), vec!["Slow Cake"]);

    // Drafts never surface
    let resp = app.get("/search?query=sorbet", None).await;
    assert!(titles(&body_json(resp).await).is_empty());
}

#[tokio::test]
async fn search_respects_limit() {
    let app = TestApp::new().await;
    let (owner, _) = app.signed_in("Owner").await;
    seed_desserts(&app, &owner).await;

    let resp = app.get("/search?limit=2", None).await;
    assert_eq!(titles(&body_json(resp).await).len(), 2);
}

#[tokio::test]
async fn recommendations_follow_liked_categories() {
    let app = TestApp::new().await;
    let (chef, _) = app.signed_in("Chef").await;
    let (fan, cookie) = app.signed_in("Fan").await;

    let liked = app.publish(&chef, "Liked Pie", "Dessert").await;
    app.publish(&chef, "Other Pie", "Dessert").await;
    app.publish(&chef, "Steak", "Dinner").await;
    app.publish(&fan, "My Own Tart", "Dessert").await;
    let mut draft = recipe(&chef, "Draft Pudding");
    draft.category = "Dessert".to_string();
    draft.status = RecipeStatus::Draft;
    app.insert_recipe(&draft).await;

    app.post(&format!("/recipes/{liked}/like"), Some(&cookie)).await;

    let resp = app.get("/recommendations", Some(&cookie)).await;
    assert_eq!(titles(&body_json(resp).await), vec!["Other Pie"]);
}

#[tokio::test]
async fn recommendations_fall_back_to_newest() {
    let app = TestApp::new().await;
    let (chef, _) = app.signed_in("Chef").await;
    let (_fan, cookie) = app.signed_in("Fan").await;

    for (i, title) in ["Oldest", "Middle", "Newest"].iter().enumerate() {
        let mut r = recipe(&chef, title);
        r.created_at = 1_000 + i as i64;
        app.insert_recipe(&r).await;
    }

    let anon = body_json(app.get("/recommendations?limit=2", None).await).await;
    assert_eq!(titles(&anon), vec!["Newest", "Middle"]);

    // Signed in without likes behaves the same
    let fresh = body_json(app.get("/recommendations?limit=2", Some(&cookie)).await).await;
    assert_eq!(titles(&fresh), vec!["Newest", "Middle"]);
}

#[tokio::test]
async fn feed_follows_then_unfollows() {
    let app = TestApp::new().await;
    let (_a, cookie_a) = app.signed_in("A").await;
    let (b, _) = app.signed_in("B").await;
    let (c, _) = app.signed_in("C").await;

    let resp = app.post(&format!("/users/{b}/follow"), Some(&cookie_a)).await;
    assert_eq!(body_json(resp).await["following"], true);

    app.publish(&b, "B's Dinner", "Dinner").await;
    app.publish(&c, "C's Dinner", "Dinner").await;
    let mut draft = recipe(&b, "B's Draft");
    draft.status = RecipeStatus::Draft;
    app.insert_recipe(&draft).await;

    let feed = body_json(app.get("/feed?limit=20", Some(&cookie_a)).await).await;
    assert_eq!(titles(&feed), vec!["B's Dinner"]);
    assert_eq!(feed[0]["author"]["name"], "B");
    assert_eq!(feed[0]["author"]["id"], b.as_str());

    let resp = app.post(&format!("/users/{b}/follow"), Some(&cookie_a)).await;
    assert_eq!(body_json(resp).await["following"], false);

    let feed = body_json(app.get("/feed", Some(&cookie_a)).await).await;
    assert!(feed.as_array().unwrap().is_empty());
}

/// Published recipe with an explicit creation time; returns its id.
async fn seed_recipe(app: &TestApp, owner: &str, title: &str, category: &str, created_at: i64) -> String {
    let mut r = recipe(owner, title);
    r.category = category.to_string();
    r.created_at = created_at;
    r.updated_at = created_at;
    app.insert_recipe(&r).await;
    r.id
}

#[tokio::test]
async fn recommendations_seed_from_ten_newest_likes() {
    let app = TestApp::new().await;
    let (chef, _) = app.signed_in("Chef").await;
    let (fan, cookie) = app.signed_in("Fan").await;

    // The oldest like is the only Dinner one and falls outside the seed
    let roast = seed_recipe(&app, &chef, "Liked Roast", "Dinner", 100).await;
    app.like_at(&fan, &roast, 1_000).await;
    for i in 1..=10 {
        let pie = seed_recipe(&app, &chef, &format!("Liked Pie {i}"), "Dessert", 100 + i).await;
        app.like_at(&fan, &pie, 1_000 + i).await;
    }
    seed_recipe(&app, &chef, "Unliked Stew", "Dinner", 500).await;
    seed_recipe(&app, &chef, "Unliked Cake", "Dessert", 400).await;

    let resp = app.get("/recommendations?limit=50", Some(&cookie)).await;
    assert_eq!(titles(&body_json(resp).await), vec!["Unliked Cake"]);
}

#[tokio::test]
async fn recommendations_concatenate_categories_then_truncate() {
    let app = TestApp::new().await;
    let (chef, _) = app.signed_in("Chef").await;
    let (fan, cookie) = app.signed_in("Fan").await;

    // Newest like first: Dessert, Soup, then Dessert again
    let pie = seed_recipe(&app, &chef, "Liked Pie", "Dessert", 1).await;
    let broth = seed_recipe(&app, &chef, "Liked Broth", "Soup", 2).await;
    let tart = seed_recipe(&app, &chef, "Liked Tart", "Dessert", 3).await;
    app.like_at(&fan, &pie, 3_000).await;
    app.like_at(&fan, &broth, 2_000).await;
    app.like_at(&fan, &tart, 1_000).await;

    seed_recipe(&app, &chef, "Soup A", "Soup", 10).await;
    seed_recipe(&app, &chef, "Cake A", "Dessert", 15).await;
    seed_recipe(&app, &chef, "Soup B", "Soup", 20).await;

    let all = body_json(app.get("/recommendations?limit=50", Some(&cookie)).await).await;
    assert_eq!(titles(&all), vec!["Cake A", "Soup B", "Soup A"]);

    let capped = body_json(app.get("/recommendations?limit=2", Some(&cookie)).await).await;
    assert_eq!(titles(&capped), vec!["Cake A", "Soup B"]);
}

#[tokio::test]
async fn feed_only_scans_a_recent_window() {
    let app = TestApp::new().await;
    let (_reader, cookie) = app.signed_in("Reader").await;
    let (quiet, _) = app.signed_in("Quiet").await;
    let (busy, _) = app.signed_in("Busy").await;

    app.post(&format!("/users/{quiet}/follow"), Some(&cookie)).await;
    seed_recipe(&app, &quiet, "Quiet Post", "Dinner", 1_000).await;
    for i in 0..5 {
        seed_recipe(&app, &busy, &format!("Busy Post {i}"), "Dinner", 2_000 + i).await;
    }

    // limit 1 scans the newest five, all by someone not followed
    let feed = body_json(app.get("/feed?limit=1", Some(&cookie)).await).await;
    assert!(feed.as_array().unwrap().is_empty());

    let feed = body_json(app.get("/feed?limit=2", Some(&cookie)).await).await;
    assert_eq!(titles(&feed), vec!["Quiet Post"]);
}
