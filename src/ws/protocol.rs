//! Wire protocol: JSON text frames, tagged enums on both directions.
//!
//! Inbound frames carry an `action` discriminator; outbound frames a
//! `type` discriminator. A frame that fails to parse — unknown action or
//! missing required field alike — is ignored with a warn log and the
//! connection stays open.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};

use crate::room::pins::{Pin, PinPatch};
use crate::room::presence::{Cursor, MemberIdentity, MemberView};
use crate::room::session::RoomSession;

/// One client request, as received over the wire.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    PinCreate {
        x: f64,
        y: f64,
        #[serde(default)]
        text: Option<String>,
    },
    PinUpdate {
        id: String,
        #[serde(default)]
        x: Option<f64>,
        #[serde(default)]
        y: Option<f64>,
        #[serde(default)]
        text: Option<String>,
    },
    PinDelete {
        id: String,
    },
    CursorMove {
        x: f64,
        y: f64,
    },
    StartEdit {
        pin_id: String,
    },
}

/// One server-to-client event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Init {
        user: MemberIdentity,
        pins: Vec<Pin>,
        users: Vec<MemberView>,
    },
    UserJoined {
        user: MemberView,
    },
    UserLeft {
        member_id: String,
    },
    PinCreated {
        pin: Pin,
    },
    PinUpdated {
        pin: Pin,
    },
    PinDeleted {
        pin_id: String,
    },
    CursorMoved {
        member_id: String,
        cursor: Cursor,
    },
    EditStarted {
        pin_id: String,
        member_id: String,
    },
    Error {
        message: String,
    },
}

/// Encode an event as a WebSocket text frame.
pub fn encode_event(event: &ServerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode server event");
            None
        }
    }
}

/// Handle one inbound text frame from `member_id`: parse, apply to the
/// room, broadcast the resulting event. Runs entirely under the room's
/// mutex so the mutation and its fan-out form one critical section.
pub fn handle_text_message(text: &str, room: &mut RoomSession, member_id: &str) {
    let action = match serde_json::from_str::<ClientAction>(text) {
        Ok(action) => action,
        Err(e) => {
            tracing::warn!(
                member_id = %member_id,
                error = %e,
                "Ignoring unparseable action message"
            );
            return;
        }
    };

    match action {
        ClientAction::PinCreate { x, y, text } => {
            if let Some(pin) = room.create_pin(x, y, text, member_id) {
                room.broadcast(&ServerEvent::PinCreated { pin }, None);
            }
        }
        ClientAction::PinUpdate { id, x, y, text } => {
            // An update naming an unknown pin id produces no event: the
            // sender lost a race against a delete and the authoritative
            // state has already reached everyone.
            if let Some(pin) = room.update_pin(&id, PinPatch { x, y, text }) {
                room.broadcast(&ServerEvent::PinUpdated { pin }, None);
            } else {
                tracing::debug!(member_id = %member_id, pin_id = %id, "Update for unknown pin dropped");
            }
        }
        ClientAction::PinDelete { id } => {
            if room.delete_pin(&id) {
                room.broadcast(&ServerEvent::PinDeleted { pin_id: id }, None);
            }
        }
        ClientAction::CursorMove { x, y } => {
            let cursor = Cursor { x, y };
            if room.move_cursor(member_id, cursor) {
                room.broadcast(
                    &ServerEvent::CursorMoved {
                        member_id: member_id.to_string(),
                        cursor,
                    },
                    Some(member_id),
                );
            }
        }
        ClientAction::StartEdit { pin_id } => {
            // A held lock yields no feedback to the requester; the client
            // simply never sees a second edit_started for that pin.
            if room.start_edit(&pin_id, member_id) {
                room.broadcast(
                    &ServerEvent::EditStarted {
                        pin_id,
                        member_id: member_id.to_string(),
                    },
                    None,
                );
            }
        }
    }
}
