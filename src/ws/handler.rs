use axum::{
    extract::{ws::WebSocketUpgrade, Path, Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::state::AppState;
use crate::ws::actor;

/// Query parameters for a WebSocket connection. A missing username is
/// rejected with 400 before the upgrade.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub username: String,
}

/// GET /ws/{room_id}?username=NAME
/// WebSocket upgrade endpoint. Room existence is checked after the
/// upgrade so the client receives an `error` event rather than a bare
/// HTTP failure.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(params): Query<ConnectQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| actor::run_connection(socket, state, room_id, params.username))
}
