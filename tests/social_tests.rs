//! End-to-end tests for the follow graph, feed, and admin surface.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use cinelog::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@cinelog.local";
const ADMIN_PASSWORD: &str = "password";

async fn spawn_app() -> Router {
    let db_path = std::env::temp_dir().join(format!("cinelog-social-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.auth.token_secret = "integration-test-secret".to_string();

    let state = cinelog::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    cinelog::api::router(state)
}

async fn body_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: &Value) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    app.clone()
        .oneshot(
            builder
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn delete(app: &Router, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn register(app: &Router, username: &str) -> (String, i64) {
    let response = post_json(
        app,
        "/api/auth/register",
        None,
        &json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret123",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();
    let id = body["user"]["id"].as_i64().unwrap();
    (token, id)
}

async fn login_admin(app: &Router) -> String {
    let response = post_json(
        app,
        "/api/auth/login",
        None,
        &json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn counts_of(app: &Router, user_id: i64) -> (i64, i64) {
    let response = get(app, &format!("/api/users/{user_id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    (
        body["user"]["followersCount"].as_i64().unwrap(),
        body["user"]["followingCount"].as_i64().unwrap(),
    )
}

#[tokio::test]
async fn test_follow_unfollow_restores_counts() {
    let app = spawn_app().await;
    let (alice, alice_id) = register(&app, "alice").await;
    let (_bob, bob_id) = register(&app, "bob").await;

    assert_eq!(counts_of(&app, alice_id).await, (0, 0));
    assert_eq!(counts_of(&app, bob_id).await, (0, 0));

    let response = post_json(&app, &format!("/api/social/follow/{bob_id}"), Some(&alice), &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(counts_of(&app, alice_id).await, (0, 1));
    assert_eq!(counts_of(&app, bob_id).await, (1, 0));

    // Edge shows up in both listings
    let response = get(&app, &format!("/api/social/followers/{bob_id}"), None).await;
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["username"], "alice");

    let response = get(&app, &format!("/api/social/following/{alice_id}"), None).await;
    let body = body_json(response).await;
    assert_eq!(body[0]["username"], "bob");

    // Unfollow restores the prior state
    let response = post_json(&app, &format!("/api/social/unfollow/{bob_id}"), Some(&alice), &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(counts_of(&app, alice_id).await, (0, 0));
    assert_eq!(counts_of(&app, bob_id).await, (0, 0));

    let response = get(&app, &format!("/api/social/followers/{bob_id}"), None).await;
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_follow_validation() {
    let app = spawn_app().await;
    let (alice, alice_id) = register(&app, "alice").await;
    let (_bob, bob_id) = register(&app, "bob").await;

    // Self-follow
    let response = post_json(&app, &format!("/api/social/follow/{alice_id}"), Some(&alice), &json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown target
    let response = post_json(&app, "/api/social/follow/999999", Some(&alice), &json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Double follow
    let response = post_json(&app, &format!("/api/social/follow/{bob_id}"), Some(&alice), &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = post_json(&app, &format!("/api/social/follow/{bob_id}"), Some(&alice), &json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unfollow without a prior follow
    let response = post_json(&app, &format!("/api/social/unfollow/{alice_id}"), Some(&alice), &json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Anonymous follow
    let response = post_json(&app, &format!("/api/social/follow/{bob_id}"), None, &json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_feed_shows_followed_reviews() {
    let app = spawn_app().await;
    let admin_token = login_admin(&app).await;
    let (alice, _) = register(&app, "alice").await;
    let (bob, bob_id) = register(&app, "bob").await;
    let (charlie, _) = register(&app, "charlie").await;

    let response = post_json(
        &app,
        "/api/movies",
        Some(&admin_token),
        &json!({
            "title": "Feed Fodder",
            "genres": ["Drama"],
            "releaseYear": 2018,
            "director": "Jane Doe",
            "synopsis": "x",
            "posterUrl": "https://posters.example.com/f.jpg",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let movie_id = body_json(response).await["id"].as_i64().unwrap();

    let response = post_json(&app, &format!("/api/social/follow/{bob_id}"), Some(&alice), &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        &app,
        &format!("/api/movies/{movie_id}/reviews"),
        Some(&bob),
        &json!({ "rating": 5, "reviewText": "Loved it" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Alice follows bob, so the review appears with full context
    let response = get(&app, "/api/social/feed", Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["rating"], 5);
    assert_eq!(items[0]["user"]["username"], "bob");
    assert_eq!(items[0]["movie"]["title"], "Feed Fodder");

    // Charlie follows no one
    let response = get(&app, "/api/social/feed", Some(&charlie)).await;
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_stats_and_access() {
    let app = spawn_app().await;
    let admin_token = login_admin(&app).await;
    let (alice, _) = register(&app, "alice").await;

    let response = get(&app, "/api/admin/stats", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&app, "/api/admin/stats", Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(&app, "/api/admin/stats", Some(&admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // Bootstrap admin plus alice
    assert_eq!(body["totals"]["users"].as_u64().unwrap(), 2);
    assert!(body["recentUsers"].as_array().unwrap().len() >= 2);

    // Paginated user listing
    let response = get(&app, "/api/admin/users?page=1&limit=1", Some(&admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalCount"], 2);
}

#[tokio::test]
async fn test_admin_promote_and_delete_user() {
    let app = spawn_app().await;
    let admin_token = login_admin(&app).await;
    let (alice, alice_id) = register(&app, "alice").await;
    let (bob, bob_id) = register(&app, "bob").await;

    let response = post_json(
        &app,
        "/api/movies",
        Some(&admin_token),
        &json!({
            "title": "Shared Tastes",
            "genres": ["Drama"],
            "releaseYear": 2015,
            "director": "Jane Doe",
            "synopsis": "x",
            "posterUrl": "https://posters.example.com/s.jpg",
        }),
    )
    .await;
    let movie_id = body_json(response).await["id"].as_i64().unwrap();

    for (token, rating, text) in [(&alice, 4, "Good"), (&bob, 2, "Meh")] {
        let response = post_json(
            &app,
            &format!("/api/movies/{movie_id}/reviews"),
            Some(token),
            &json!({ "rating": rating, "reviewText": text }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // bob also follows alice, so deleting bob must fix alice's follower count
    let response = post_json(&app, &format!("/api/social/follow/{alice_id}"), Some(&bob), &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Promotion is admin-gated
    let promote = json!({ "isAdmin": true });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/admin/users/{alice_id}"))
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {alice}"))
                .body(Body::from(promote.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/admin/users/{alice_id}"))
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {admin_token}"))
                .body(Body::from(promote.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["isAdmin"], true);

    // Delete bob: his review disappears and the average is recomputed
    let response = delete(&app, &format!("/api/admin/users/{bob_id}"), Some(&admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, &format!("/api/users/{bob_id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, &format!("/api/movies/{movie_id}"), None).await;
    let body = body_json(response).await;
    assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
    assert!((body["movie"]["averageRating"].as_f64().unwrap() - 4.0).abs() < 1e-9);

    // Alice's follower count is back to zero
    let response = get(&app, &format!("/api/users/{alice_id}"), None).await;
    let body = body_json(response).await;
    assert_eq!(body["user"]["followersCount"].as_i64().unwrap(), 0);

    // Bob's token no longer authenticates
    let response = get(&app, "/api/auth/me", Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_delete_movie_cascades() {
    let app = spawn_app().await;
    let admin_token = login_admin(&app).await;
    let (alice, alice_id) = register(&app, "alice").await;

    let response = post_json(
        &app,
        "/api/movies",
        Some(&admin_token),
        &json!({
            "title": "Short Lived",
            "genres": ["Horror"],
            "releaseYear": 2023,
            "director": "Jane Doe",
            "synopsis": "x",
            "posterUrl": "https://posters.example.com/h.jpg",
        }),
    )
    .await;
    let movie_id = body_json(response).await["id"].as_i64().unwrap();

    let response = post_json(
        &app,
        &format!("/api/movies/{movie_id}/reviews"),
        Some(&alice),
        &json!({ "rating": 3, "reviewText": "Spooky" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        &app,
        &format!("/api/users/{alice_id}/watchlist"),
        Some(&alice),
        &json!({ "movieId": movie_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = delete(&app, &format!("/api/admin/movies/{movie_id}"), Some(&admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, &format!("/api/movies/{movie_id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Dependent rows are gone too
    let response = get(&app, &format!("/api/users/{alice_id}"), None).await;
    let body = body_json(response).await;
    assert!(body["reviews"].as_array().unwrap().is_empty());

    let response = get(&app, &format!("/api/users/{alice_id}/watchlist"), None).await;
    let body = body_json(response).await;
    assert_eq!(body["totalCount"], 0);

    // Deleting twice is a 404
    let response = delete(&app, &format!("/api/admin/movies/{movie_id}"), Some(&admin_token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
