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

/// Bootstrap admin credentials seeded by the initial migration.
const ADMIN_EMAIL: &str = "admin@cinelog.local";
const ADMIN_PASSWORD: &str = "password";

async fn spawn_app() -> Router {
    let db_path = std::env::temp_dir().join(format!("cinelog-test-{}.db", uuid::Uuid::new_v4()));

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

/// Registers a user and returns (token, user id).
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

async fn create_movie(app: &Router, admin_token: &str, title: &str, year: i32, genre: &str) -> i64 {
    let response = post_json(
        app,
        "/api/movies",
        Some(admin_token),
        &json!({
            "title": title,
            "genres": [genre],
            "releaseYear": year,
            "director": "Jane Doe",
            "cast": ["Alex Example"],
            "synopsis": "A test movie.",
            "posterUrl": "https://posters.example.com/test.jpg",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    body_json(response).await["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_register_login_me() {
    let app = spawn_app().await;

    let (token, id) = register(&app, "alice").await;

    // me with the fresh token
    let response = get(&app, "/api/auth/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["id"].as_i64().unwrap(), id);
    assert_eq!(body["isAdmin"], false);

    // me without a token
    let response = get(&app, "/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // me with a garbage token
    let response = get(&app, "/api/auth/me", Some("not-a-token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // login with the right and wrong password
    let response = post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "alice@example.com", "password": "secret123" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "alice@example.com", "password": "wrong" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["status"].as_u64().unwrap(), 401);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_register_duplicates_rejected() {
    let app = spawn_app().await;

    register(&app, "alice").await;

    // Same username
    let response = post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "secret123",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Same email, different case
    let response = post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({
            "username": "alice2",
            "email": "Alice@Example.com",
            "password": "secret123",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Short password
    let response = post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": "short",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movie_creation_requires_admin() {
    let app = spawn_app().await;

    let (user_token, _) = register(&app, "alice").await;
    let admin_token = login_admin(&app).await;

    let payload = json!({
        "title": "Gated",
        "genres": ["Drama"],
        "releaseYear": 2020,
        "director": "Jane Doe",
        "synopsis": "x",
        "posterUrl": "https://posters.example.com/g.jpg",
    });

    let response = post_json(&app, "/api/movies", None, &payload).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(&app, "/api/movies", Some(&user_token), &payload).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(&app, "/api/movies", Some(&admin_token), &payload).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_review_aggregation() {
    let app = spawn_app().await;

    let admin_token = login_admin(&app).await;
    let (alice, _) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;

    let movie_id = create_movie(&app, &admin_token, "Averaged", 2021, "Drama").await;

    // Unauthenticated review is rejected
    let response = post_json(
        &app,
        &format!("/api/movies/{movie_id}/reviews"),
        None,
        &json!({ "rating": 4, "reviewText": "Nice" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // First review: the average equals that single rating
    let response = post_json(
        &app,
        &format!("/api/movies/{movie_id}/reviews"),
        Some(&alice),
        &json!({ "rating": 4, "reviewText": "Nice" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(&app, &format!("/api/movies/{movie_id}"), None).await;
    let body = body_json(response).await;
    assert!((body["movie"]["averageRating"].as_f64().unwrap() - 4.0).abs() < 1e-9);

    // Second review from another user: 4 and 2 average to 3.0
    let response = post_json(
        &app,
        &format!("/api/movies/{movie_id}/reviews"),
        Some(&bob),
        &json!({ "rating": 2, "reviewText": "Not for me" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(&app, &format!("/api/movies/{movie_id}"), None).await;
    let body = body_json(response).await;
    assert!((body["movie"]["averageRating"].as_f64().unwrap() - 3.0).abs() < 1e-9);
    assert_eq!(body["reviews"].as_array().unwrap().len(), 2);

    // One review per user per movie
    let response = post_json(
        &app,
        &format!("/api/movies/{movie_id}/reviews"),
        Some(&alice),
        &json!({ "rating": 5, "reviewText": "Changed my mind" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Out-of-range ratings and overlong text
    let response = post_json(
        &app,
        &format!("/api/movies/{movie_id}/reviews"),
        Some(&bob),
        &json!({ "rating": 6, "reviewText": "Too good" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (carol, _) = register(&app, "carol").await;
    let response = post_json(
        &app,
        &format!("/api/movies/{movie_id}/reviews"),
        Some(&carol),
        &json!({ "rating": 3, "reviewText": "y".repeat(1001) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Reviewing a movie that does not exist
    let response = post_json(
        &app,
        "/api/movies/999999/reviews",
        Some(&carol),
        &json!({ "rating": 3, "reviewText": "ghost" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_movie_listing_filters_and_sort() {
    let app = spawn_app().await;
    let admin_token = login_admin(&app).await;

    create_movie(&app, &admin_token, "Old Drama", 1994, "Drama").await;
    create_movie(&app, &admin_token, "New Drama", 2022, "Drama").await;
    create_movie(&app, &admin_token, "Space Opera", 2010, "Sci-Fi").await;

    // Pagination envelope
    let response = get(&app, "/api/movies?page=1&limit=2", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["totalCount"], 3);

    // Genre filter
    let response = get(&app, "/api/movies?genre=Sci-Fi", None).await;
    let body = body_json(response).await;
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["items"][0]["title"], "Space Opera");

    // Year range
    let response = get(&app, "/api/movies?yearFrom=2000&yearTo=2015", None).await;
    let body = body_json(response).await;
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["items"][0]["title"], "Space Opera");

    // Title search
    let response = get(&app, "/api/movies?search=Drama", None).await;
    let body = body_json(response).await;
    assert_eq!(body["totalCount"], 2);

    // Explicit sort is honored
    let response = get(&app, "/api/movies?sortBy=releaseYear&sortOrder=desc", None).await;
    let body = body_json(response).await;
    let years: Vec<i64> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["releaseYear"].as_i64().unwrap())
        .collect();
    assert_eq!(years, vec![2022, 2010, 1994]);

    // Unknown sort key is a validation error
    let response = get(&app, "/api/movies?sortBy=evil", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Excessive limit is rejected
    let response = get(&app, "/api/movies?limit=1000", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_watchlist_flow() {
    let app = spawn_app().await;
    let admin_token = login_admin(&app).await;
    let (alice, alice_id) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;

    let movie_id = create_movie(&app, &admin_token, "Queued", 2019, "Thriller").await;

    // Adding to someone else's watchlist is forbidden
    let response = post_json(
        &app,
        &format!("/api/users/{alice_id}/watchlist"),
        Some(&bob),
        &json!({ "movieId": movie_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Add + duplicate
    let response = post_json(
        &app,
        &format!("/api/users/{alice_id}/watchlist"),
        Some(&alice),
        &json!({ "movieId": movie_id }),
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
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown movie
    let response = post_json(
        &app,
        &format!("/api/users/{alice_id}/watchlist"),
        Some(&alice),
        &json!({ "movieId": 424242 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Listing returns the movie itself
    let response = get(&app, &format!("/api/users/{alice_id}/watchlist"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["items"][0]["title"], "Queued");

    // Remove, then removing again is a 404
    let response = delete(
        &app,
        &format!("/api/users/{alice_id}/watchlist/{movie_id}"),
        Some(&alice),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete(
        &app,
        &format!("/api/users/{alice_id}/watchlist/{movie_id}"),
        Some(&alice),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_profile_and_update() {
    let app = spawn_app().await;
    let admin_token = login_admin(&app).await;
    let (alice, alice_id) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;

    let movie_id = create_movie(&app, &admin_token, "Profiled", 2001, "Drama").await;
    let response = post_json(
        &app,
        &format!("/api/movies/{movie_id}/reviews"),
        Some(&alice),
        &json!({ "rating": 5, "reviewText": "A favourite" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Profile includes review history with movie context
    let response = get(&app, &format!("/api/users/{alice_id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(body["reviews"][0]["movie"]["title"], "Profiled");

    // Unknown profile
    let response = get(&app, "/api/users/999999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Only the owner can update
    let update = json!({ "profilePicture": "https://cdn.example.com/alice.png" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/users/{alice_id}"))
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {bob}"))
                .body(Body::from(update.to_string()))
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
                .uri(format!("/api/users/{alice_id}"))
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {alice}"))
                .body(Body::from(update.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["profilePicture"], "https://cdn.example.com/alice.png");

    // Taking bob's username is rejected
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/users/{alice_id}"))
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {alice}"))
                .body(Body::from(json!({ "username": "bob" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
