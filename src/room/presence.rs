//! In-memory presence for one room: who is connected, under what name and
//! color, and where their cursor last was.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::ws::ConnectionSender;

/// A cursor position on the canvas. New members start at the origin.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
}

/// A connected participant of a room.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: String,
    pub username: String,
    pub color: String,
    pub cursor: Cursor,
    /// Bounded outbound queue feeding this member's writer task.
    pub sender: ConnectionSender,
    /// Fired to force-disconnect this member (overload policy).
    pub kill: CancellationToken,
}

/// What other clients see of a member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberView {
    pub id: String,
    pub username: String,
    pub color: String,
    pub cursor: Cursor,
}

/// The fields a client learns about itself on join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberIdentity {
    pub id: String,
    pub username: String,
    pub color: String,
}

impl Member {
    pub fn view(&self) -> MemberView {
        MemberView {
            id: self.id.clone(),
            username: self.username.clone(),
            color: self.color.clone(),
            cursor: self.cursor,
        }
    }

    pub fn identity(&self) -> MemberIdentity {
        MemberIdentity {
            id: self.id.clone(),
            username: self.username.clone(),
            color: self.color.clone(),
        }
    }
}

/// Ordered set of a room's connected members (join order).
#[derive(Debug, Default)]
pub struct PresenceTracker {
    members: Vec<Member>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member with a fresh id and a random display color.
    pub fn add(&mut self, username: &str, sender: ConnectionSender, kill: CancellationToken) -> Member {
        let member = Member {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            color: random_color(),
            cursor: Cursor::default(),
            sender,
            kill,
        };
        self.members.push(member.clone());
        member
    }

    /// Remove and return the member, if connected.
    pub fn remove(&mut self, member_id: &str) -> Option<Member> {
        let idx = self.members.iter().position(|m| m.id == member_id)?;
        Some(self.members.remove(idx))
    }

    /// Update a member's cursor. Returns false for unknown members.
    pub fn set_cursor(&mut self, member_id: &str, cursor: Cursor) -> bool {
        match self.members.iter_mut().find(|m| m.id == member_id) {
            Some(member) => {
                member.cursor = cursor;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    /// Views of every member except `exclude` (if given), in join order.
    pub fn views(&self, exclude: Option<&str>) -> Vec<MemberView> {
        self.members
            .iter()
            .filter(|m| exclude != Some(m.id.as_str()))
            .map(Member::view)
            .collect()
    }
}

/// Random `#rrggbb` display color assigned at join.
fn random_color() -> String {
    format!("#{:06x}", rand::rng().random_range(0..=0xFFFFFFu32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn tracker_with(names: &[&str]) -> (PresenceTracker, Vec<Member>) {
        let mut tracker = PresenceTracker::new();
        let members = names
            .iter()
            .map(|name| {
                let (tx, _rx) = mpsc::channel(8);
                tracker.add(name, tx, CancellationToken::new())
            })
            .collect();
        (tracker, members)
    }

    #[test]
    fn members_keep_join_order_and_unique_ids() {
        let (tracker, members) = tracker_with(&["alice", "bob", "carol"]);
        let views = tracker.views(None);
        assert_eq!(
            views.iter().map(|v| v.username.clone()).collect::<Vec<_>>(),
            vec!["alice", "bob", "carol"]
        );
        assert_ne!(members[0].id, members[1].id);
        assert_ne!(members[1].id, members[2].id);
    }

    #[test]
    fn views_can_exclude_one_member() {
        let (tracker, members) = tracker_with(&["alice", "bob"]);
        let views = tracker.views(Some(&members[0].id));
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].username, "bob");
    }

    #[test]
    fn cursor_defaults_to_origin_and_updates() {
        let (mut tracker, members) = tracker_with(&["alice"]);
        assert_eq!(tracker.get(&members[0].id).unwrap().cursor, Cursor::default());

        assert!(tracker.set_cursor(&members[0].id, Cursor { x: 3.5, y: -1.0 }));
        assert_eq!(
            tracker.get(&members[0].id).unwrap().cursor,
            Cursor { x: 3.5, y: -1.0 }
        );
        assert!(!tracker.set_cursor("missing", Cursor::default()));
    }

    #[test]
    fn remove_returns_the_member_once() {
        let (mut tracker, members) = tracker_with(&["alice", "bob"]);
        let removed = tracker.remove(&members[0].id).unwrap();
        assert_eq!(removed.username, "alice");
        assert!(tracker.remove(&members[0].id).is_none());
        assert_eq!(tracker.views(None).len(), 1);
    }

    #[test]
    fn assigned_colors_are_css_hex() {
        let (tracker, _members) = tracker_with(&["alice"]);
        let color = &tracker.views(None)[0].color;
        assert_eq!(color.len(), 7);
        assert!(color.starts_with('#'));
        assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
