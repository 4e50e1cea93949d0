//! One room's live state: pins, edit locks, connected members, and the
//! broadcast fan-out that keeps every client's view consistent.
//!
//! A `RoomSession` is always driven under its `Arc<Mutex<_>>`, so every
//! method here runs inside the room's single critical section. Outbound
//! delivery uses `try_send` on bounded queues and never blocks, which is
//! what makes holding the mutex across a broadcast safe.

use tokio_util::sync::CancellationToken;

use crate::room::locks::EditLockTable;
use crate::room::pins::{Pin, PinPatch, PinStore};
use crate::room::presence::{Cursor, Member, MemberView, PresenceTracker};
use crate::ws::protocol::{encode_event, ServerEvent};
use crate::ws::ConnectionSender;

/// Everything a newly joined member needs to render the room.
#[derive(Debug)]
pub struct JoinSnapshot {
    pub member: Member,
    pub pins: Vec<Pin>,
    pub others: Vec<MemberView>,
}

pub struct RoomSession {
    id: String,
    pins: PinStore,
    locks: EditLockTable,
    presence: PresenceTracker,
    /// Deliveries dropped because a recipient was gone or overloaded.
    /// Failures are isolated per recipient but not silent.
    send_failures: u64,
}

impl RoomSession {
    pub fn new(id: String) -> Self {
        Self {
            id,
            pins: PinStore::new(),
            locks: EditLockTable::new(),
            presence: PresenceTracker::new(),
            send_failures: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a member and return its descriptor together with the current
    /// room state. The caller broadcasts `user_joined` separately, while
    /// still holding the room lock.
    pub fn join(
        &mut self,
        username: &str,
        sender: ConnectionSender,
        kill: CancellationToken,
    ) -> JoinSnapshot {
        let member = self.presence.add(username, sender, kill);
        tracing::info!(
            room_id = %self.id,
            member_id = %member.id,
            username = %username,
            "Member joined"
        );
        JoinSnapshot {
            others: self.presence.views(Some(&member.id)),
            pins: self.pins.list(),
            member,
        }
    }

    /// Remove a member and release every edit lock it holds. Returns
    /// false if the member was not in the room (already removed).
    pub fn leave(&mut self, member_id: &str) -> bool {
        let removed = self.presence.remove(member_id).is_some();
        if removed {
            self.locks.release_all_for(member_id);
            tracing::info!(room_id = %self.id, member_id = %member_id, "Member left");
        }
        removed
    }

    /// Create a pin owned by `creator_id`, stamped with the creator's
    /// current color. Returns None if the creator is not a member.
    pub fn create_pin(
        &mut self,
        x: f64,
        y: f64,
        text: Option<String>,
        creator_id: &str,
    ) -> Option<Pin> {
        let color = self.presence.get(creator_id)?.color.clone();
        Some(self.pins.create(x, y, text, creator_id, &color))
    }

    /// Partial update. A text-carrying update finishes the edit, so the
    /// pin's lock (if any) is released before the merge.
    pub fn update_pin(&mut self, pin_id: &str, patch: PinPatch) -> Option<Pin> {
        if patch.text.is_some() {
            self.locks.release(pin_id);
        }
        self.pins.update(pin_id, patch)
    }

    pub fn delete_pin(&mut self, pin_id: &str) -> bool {
        self.locks.release(pin_id);
        self.pins.delete(pin_id)
    }

    pub fn move_cursor(&mut self, member_id: &str, cursor: Cursor) -> bool {
        self.presence.set_cursor(member_id, cursor)
    }

    pub fn start_edit(&mut self, pin_id: &str, member_id: &str) -> bool {
        self.locks.acquire(pin_id, member_id)
    }

    /// Member views in join order, for the REST listing and `init`.
    pub fn member_views(&self) -> Vec<MemberView> {
        self.presence.views(None)
    }

    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }

    /// Best-effort, at-most-once fan-out of `event` to every current
    /// member except `exclude`. A failure for one recipient never blocks
    /// delivery to the others and is never surfaced to the sender: a
    /// closed queue is counted, and a full queue additionally fires the
    /// recipient's kill token so a stalled client is disconnected instead
    /// of stalling the room.
    pub fn broadcast(&mut self, event: &ServerEvent, exclude: Option<&str>) {
        let Some(frame) = encode_event(event) else {
            return;
        };

        let mut failures = 0u64;
        for member in self.presence.iter() {
            if exclude == Some(member.id.as_str()) {
                continue;
            }
            match member.sender.try_send(frame.clone()) {
                Ok(()) => {}
                Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                    failures += 1;
                    tracing::warn!(
                        room_id = %self.id,
                        member_id = %member.id,
                        "Outbound queue full, force-disconnecting slow member"
                    );
                    member.kill.cancel();
                }
                Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => {
                    failures += 1;
                    tracing::debug!(
                        room_id = %self.id,
                        member_id = %member.id,
                        "Dropped event for disconnected member"
                    );
                }
            }
        }

        if failures > 0 {
            self.send_failures += failures;
            tracing::warn!(
                room_id = %self.id,
                dropped = failures,
                total_dropped = self.send_failures,
                "Broadcast deliveries dropped"
            );
        }
    }
}
