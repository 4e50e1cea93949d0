use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::room::session::RoomSession;

/// Handle to one room; every operation on the room goes through its mutex.
pub type RoomHandle = Arc<Mutex<RoomSession>>;

/// Process-lifetime map of rooms. Rooms are created on demand and never
/// torn down; there is deliberately no reaping policy.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh empty room and return its id.
    pub fn create(&self) -> String {
        let room_id = Uuid::new_v4().to_string();
        self.rooms.insert(
            room_id.clone(),
            Arc::new(Mutex::new(RoomSession::new(room_id.clone()))),
        );
        tracing::info!(room_id = %room_id, "Room created");
        room_id
    }

    pub fn get(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }
}
