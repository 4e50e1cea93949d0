//! REST endpoints for room creation and member listing. Thin wrappers
//! around the registry; all live collaboration happens over the
//! WebSocket channel.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::room::presence::MemberView;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub username: String,
}

/// POST /api/rooms — Create an empty room.
/// Body: { "username": "..." } (optional; a placeholder is generated).
pub async fn create_room(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomRequest>,
) -> Json<CreateRoomResponse> {
    let username = body
        .username
        .unwrap_or_else(|| format!("User-{}", rand::rng().random_range(1000..10000)));
    let room_id = state.rooms.create();
    Json(CreateRoomResponse { room_id, username })
}

#[derive(Debug, Serialize)]
pub struct RoomUsersResponse {
    pub room_id: String,
    pub users: Vec<MemberView>,
}

/// GET /api/rooms/{room_id}/users — List the room's connected members.
/// 404 if the room id is unknown.
pub async fn get_room_users(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomUsersResponse>, StatusCode> {
    let room = state.rooms.get(&room_id).ok_or(StatusCode::NOT_FOUND)?;
    let users = room
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .member_views();
    Ok(Json(RoomUsersResponse { room_id, users }))
}
