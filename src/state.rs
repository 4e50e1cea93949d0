use std::sync::Arc;

use crate::room::registry::RoomRegistry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// All live rooms, for the process lifetime
    pub rooms: Arc<RoomRegistry>,
    /// Maximum inbound WebSocket message size in bytes
    pub max_message_bytes: usize,
    /// Capacity of each connection's bounded outbound queue
    pub outbound_queue: usize,
}

impl AppState {
    pub fn new(max_message_bytes: usize, outbound_queue: usize) -> Self {
        Self {
            rooms: Arc::new(RoomRegistry::new()),
            max_message_bytes,
            outbound_queue,
        }
    }
}
