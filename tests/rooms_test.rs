//! Integration tests for the REST surface: room creation and member listing.

use std::net::SocketAddr;

use pinboard_server::config::Config;
use pinboard_server::routes::build_router;
use pinboard_server::state::AppState;
use tokio::net::TcpListener;

/// Helper: start the server on a random port and return its base URL.
async fn start_test_server() -> (String, SocketAddr) {
    let config = Config::default();
    let state = AppState::new(config.max_message_bytes, config.outbound_queue);
    let app = build_router(state, &config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (format!("http://{}", addr), addr)
}

#[tokio::test]
async fn test_create_room_echoes_username() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/rooms", base_url))
        .json(&serde_json::json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert!(!body["room_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_room_generates_placeholder_username() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/rooms", base_url))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    let username = body["username"].as_str().unwrap();
    assert!(
        username.starts_with("User-"),
        "expected generated placeholder, got {username}"
    );
}

#[tokio::test]
async fn test_fresh_room_lists_no_users() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .post(format!("{}/api/rooms", base_url))
        .json(&serde_json::json!({ "username": "alice" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let room_id = body["room_id"].as_str().unwrap();

    let resp = client
        .get(format!("{}/api/rooms/{}/users", base_url, room_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["room_id"], room_id);
    assert_eq!(body["users"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_room_users_is_404() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/rooms/no-such-room/users", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_health_check() {
    let (base_url, _addr) = start_test_server().await;

    let resp = reqwest::get(format!("{}/health", base_url)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_index_returns_welcome_status() {
    let (base_url, _addr) = start_test_server().await;

    let resp = reqwest::get(format!("{}/", base_url)).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["status"].as_str().unwrap().contains("Welcome"));
}
