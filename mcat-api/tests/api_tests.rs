//! Integration tests for mcat-api endpoints
//!
//! Each test drives the full router (layers included) with `oneshot`
//! against its own in-memory database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use mcat_api::{build_router, db, AppState, BODY_LIMIT};
use mcat_common::time::FixedClock;
use mcat_common::{CatalogSchema, SongValidator};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

const YEAR: i32 = 2024;

/// Test helper: app over a fresh in-memory database with a fixed clock
async fn setup_app() -> Router {
    let pool = db::init_memory_database()
        .await
        .expect("Should create in-memory database");
    let validator =
        SongValidator::with_clock(CatalogSchema::default(), Arc::new(FixedClock::in_year(YEAR)));
    build_router(AppState::new(pool, validator))
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: send a request, return status and JSON body (Null if empty)
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

async fn create_song(app: &Router, body: Value) -> Value {
    let (status, song) = send(app, json_request("POST", "/api/songs", body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", song);
    song
}

fn song_body(title: &str, artist: &str, genre: &str) -> Value {
    json!({ "title": title, "artist": artist, "genre": genre })
}

// =============================================================================
// Service info
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app().await;
    let (status, body) = send(&app, request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mcat-api");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_welcome_lists_endpoints() {
    let app = setup_app().await;
    let (status, body) = send(&app, request("GET", "/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert!(body["endpoints"].as_array().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = setup_app().await;
    let (status, body) = send(&app, request("GET", "/api/nowhere")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Route not found" }));
}

// =============================================================================
// Songs
// =============================================================================

#[tokio::test]
async fn test_create_then_fetch_round_trip() {
    let app = setup_app().await;
    let created = create_song(
        &app,
        json!({
            "title": "  Blue in Green ",
            "artist": "Miles Davis",
            "album": "Kind of Blue",
            "year": 1959,
            "genre": "Jazz",
            "duration": "5:37",
            "rating": 4.5,
            "tags": ["modal", "ballad", "modal"]
        }),
    )
    .await;

    assert_eq!(created["title"], "Blue in Green");
    assert_eq!(created["duration"], 337);
    assert_eq!(created["tags"], json!(["ballad", "modal"]));
    assert_eq!(created["isFavorite"], false);

    let id = created["_id"].as_str().unwrap();
    let (status, fetched) = send(&app, request("GET", &format!("/api/songs/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_invalid_create_reports_every_field() {
    let app = setup_app().await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/songs",
            json!({ "title": "", "artist": "", "genre": "Unknown", "year": YEAR + 1, "rating": 7 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&String> = body["errors"].as_object().unwrap().keys().collect();
    assert_eq!(fields, vec!["artist", "genre", "rating", "title", "year"]);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = setup_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/songs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let app = setup_app().await;
    let big = "x".repeat(BODY_LIMIT + 1);
    let (status, _) = send(
        &app,
        json_request("POST", "/api/songs", json!({ "title": big, "artist": "a", "genre": "Pop" })),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_404() {
    let app = setup_app().await;
    let unknown = uuid::Uuid::new_v4();

    for uri in [format!("/api/songs/{}", unknown), "/api/songs/not-an-id".to_string()] {
        let (status, body) = send(&app, request("GET", &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert!(body["error"].is_string());
    }

    let (status, _) = send(&app, request("DELETE", &format!("/api/songs/{}", unknown))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        json_request("PUT", &format!("/api/songs/{}", unknown), song_body("a", "b", "Pop")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_replace_song() {
    let app = setup_app().await;
    let created = create_song(&app, song_body("Kashmir", "Led Zeppelin", "Rock")).await;
    let uri = format!("/api/songs/{}", created["_id"].as_str().unwrap());

    let (status, updated) = send(
        &app,
        json_request("PUT", &uri, json!({ "title": "Kashmir", "artist": "Led Zeppelin", "genre": "Rock", "year": 1975 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["year"], 1975);
    assert_eq!(updated["createdAt"], created["createdAt"]);

    let (status, body) = send(&app, json_request("PUT", &uri, json!({ "title": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["title"].is_string());
}

#[tokio::test]
async fn test_listing_filters_sorts_and_pages() {
    let app = setup_app().await;
    create_song(&app, song_body("Kashmir", "Led Zeppelin", "Rock")).await;
    create_song(&app, song_body("Zephyr Song", "Red Hot Chili Peppers", "Rock")).await;
    create_song(&app, song_body("So What", "Miles Davis", "Jazz")).await;
    create_song(&app, song_body("Zeppelin Jazz", "Someone", "Jazz")).await;

    let (status, body) = send(&app, request("GET", "/api/songs?search=zep&genre=Rock&sortBy=title&order=desc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let titles: Vec<&str> = body["songs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Zephyr Song", "Kashmir"]);

    let (_, body) = send(&app, request("GET", "/api/songs?page=0&limit=-5&sortBy=__proto__")).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["total"], 4);
    assert_eq!(body["songs"][0]["title"], "Kashmir");

    let (_, body) = send(&app, request("GET", "/api/songs?limit=1&page=3")).await;
    assert_eq!(body["songs"].as_array().unwrap().len(), 1);
    assert_eq!(body["songs"][0]["title"], "Zephyr Song");
    assert_eq!(body["totalPages"], 4);
}

#[tokio::test]
async fn test_favorite_toggle_and_listing() {
    let app = setup_app().await;
    let song = create_song(&app, song_body("So What", "Miles Davis", "Jazz")).await;
    create_song(&app, song_body("Kashmir", "Led Zeppelin", "Rock")).await;
    let uri = format!("/api/songs/{}/favorite", song["_id"].as_str().unwrap());

    let (status, toggled) = send(&app, request("PUT", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["isFavorite"], true);

    let (_, favorites) = send(&app, request("GET", "/api/favorites")).await;
    assert_eq!(favorites.as_array().unwrap().len(), 1);
    assert_eq!(favorites[0]["_id"], song["_id"]);

    let (_, toggled) = send(&app, request("PUT", &uri)).await;
    assert_eq!(toggled["isFavorite"], false);
}

#[tokio::test]
async fn test_genres_artists_and_stats() {
    let app = setup_app().await;
    create_song(&app, song_body("Kashmir", "Led Zeppelin", "Rock")).await;
    create_song(&app, song_body("Black Dog", "Led Zeppelin", "Rock")).await;
    let jazz = create_song(&app, song_body("So What", "Miles Davis", "Jazz")).await;
    send(&app, request("PUT", &format!("/api/songs/{}/favorite", jazz["_id"].as_str().unwrap()))).await;

    for uri in ["/api/genres", "/api/songs/genres"] {
        let (status, genres) = send(&app, request("GET", uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(genres, json!(["Pop", "Rock", "Jazz", "Classical", "Electronic", "Other"]));
    }

    let (_, artists) = send(&app, request("GET", "/api/artists")).await;
    assert_eq!(artists, json!(["Led Zeppelin", "Miles Davis"]));

    let (status, stats) = send(&app, request("GET", "/api/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({
            "totalSongs": 3,
            "genres": [{ "_id": "Rock", "count": 2 }, { "_id": "Jazz", "count": 1 }],
            "favoriteCount": 1
        })
    );
}

// =============================================================================
// Playlists
// =============================================================================

#[tokio::test]
async fn test_delete_song_retracts_from_playlists() {
    let app = setup_app().await;
    let a = create_song(&app, song_body("A", "x", "Pop")).await["_id"].clone();
    let b = create_song(&app, song_body("B", "x", "Pop")).await["_id"].clone();
    let c = create_song(&app, song_body("C", "x", "Pop")).await["_id"].clone();

    let (status, first) = send(&app, json_request("POST", "/api/playlists", json!({ "name": "One", "songs": [a, b, c] }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, second) = send(&app, json_request("POST", "/api/playlists", json!({ "name": "Two", "songs": [b, a] }))).await;

    let (status, body) = send(&app, request("DELETE", &format!("/api/songs/{}", b.as_str().unwrap()))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, first) = send(&app, request("GET", &format!("/api/playlists/{}", first["_id"].as_str().unwrap()))).await;
    let (_, second) = send(&app, request("GET", &format!("/api/playlists/{}", second["_id"].as_str().unwrap()))).await;
    assert_eq!(first["songs"], json!([a, c]));
    assert_eq!(second["songs"], json!([a]));
}

#[tokio::test]
async fn test_playlist_lifecycle() {
    let app = setup_app().await;
    let a = create_song(&app, song_body("A", "x", "Pop")).await["_id"].clone();

    let (status, body) = send(&app, json_request("POST", "/api/playlists", json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["name"].is_string());

    let (_, list) = send(&app, json_request("POST", "/api/playlists", json!({ "name": "Mix" }))).await;
    let uri = format!("/api/playlists/{}", list["_id"].as_str().unwrap());

    let songs_uri = format!("{}/songs", uri);
    let (status, updated) = send(&app, json_request("POST", &songs_uri, json!({ "songId": a }))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, updated_again) = send(&app, json_request("POST", &songs_uri, json!({ "songId": a }))).await;
    assert_eq!(updated["songs"], json!([a]));
    assert_eq!(updated_again["songs"], json!([a]));

    let (status, _) = send(&app, json_request("POST", &songs_uri, json!({ "songId": uuid::Uuid::new_v4() }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = send(&app, json_request("POST", &songs_uri, json!({ "songId": "nope" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["songId"].is_string());

    let (status, renamed) = send(&app, json_request("PUT", &uri, json!({ "name": "Renamed", "coverImage": "cover.png" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Renamed");
    assert_eq!(renamed["songs"], json!([]));

    let (_, all) = send(&app, request("GET", "/api/playlists")).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request("GET", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_playlist_with_unknown_song_rejected() {
    let app = setup_app().await;
    let (status, body) = send(
        &app,
        json_request("POST", "/api/playlists", json!({ "name": "Mix", "songs": [uuid::Uuid::new_v4()] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Unknown song id"));
}

// =============================================================================
// Cross-cutting
// =============================================================================

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = setup_app().await;
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/songs")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn test_internal_errors_hidden_unless_exposed() {
    let pool = db::init_memory_database().await.unwrap();
    sqlx::query("DROP TABLE playlist_songs").execute(&pool).await.unwrap();
    sqlx::query("DROP TABLE songs").execute(&pool).await.unwrap();

    let hidden = build_router(AppState::new(pool.clone(), SongValidator::default()));
    let (status, body) = send(&hidden, request("GET", "/api/stats")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");

    let exposed = build_router(
        AppState::new(pool, SongValidator::default()).with_exposed_internal_errors(true),
    );
    let (status, body) = send(&exposed, request("GET", "/api/stats")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("songs"));
}
