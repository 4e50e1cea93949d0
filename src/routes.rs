use axum::{
    http::{header, Method},
    Json, Router,
};
use std::sync::Arc;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::room::api as room_api;
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState, config: &Config) -> Router {
    // Room creation allocates process-lifetime memory with no auth, so it
    // is rate-limited per client IP: 5 per minute with a burst of 5.
    // Uses PeerIpKeyExtractor which reads from ConnectInfo<SocketAddr>.
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(12) // 1 token every 12 seconds = 5 per minute
            .burst_size(5)
            .finish()
            .expect("Failed to build governor config"),
    );
    let governor_limiter = governor_config.limiter().clone();

    // Spawn background task to clean up rate limiter state
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    let create_routes = Router::new()
        .route("/api/rooms", axum::routing::post(room_api::create_room))
        .layer(GovernorLayer {
            config: governor_config,
        });

    let room_routes = Router::new().route(
        "/api/rooms/{room_id}/users",
        axum::routing::get(room_api::get_room_users),
    );

    // Realtime channel: room id in the path, username as a query param
    let ws_routes = Router::new().route(
        "/ws/{room_id}",
        axum::routing::get(ws_handler::ws_upgrade),
    );

    // Index and health check
    let system = Router::new()
        .route("/", axum::routing::get(index))
        .route("/health", axum::routing::get(health_check));

    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::list(origins));

    Router::new()
        .merge(create_routes)
        .merge(room_routes)
        .merge(ws_routes)
        .merge(system)
        .layer(cors)
        .with_state(state)
}

/// GET / — welcome payload for anyone poking the server root
async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "Hi! Welcome to the pinboard server" }))
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
