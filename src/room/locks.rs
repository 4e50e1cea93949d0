use std::collections::HashMap;

/// Advisory single-holder edit locks, keyed by pin id.
///
/// A lock has no expiry: it is held until a text update or delete of the
/// pin releases it, or the holder disconnects.
#[derive(Debug, Default)]
pub struct EditLockTable {
    locks: HashMap<String, String>,
}

impl EditLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// First-come-wins acquire. Succeeds only when no holder exists for
    /// the pin id; the current holder is never displaced.
    pub fn acquire(&mut self, pin_id: &str, member_id: &str) -> bool {
        if self.locks.contains_key(pin_id) {
            return false;
        }
        self.locks
            .insert(pin_id.to_string(), member_id.to_string());
        true
    }

    /// Idempotent release; unheld pin ids are a no-op.
    pub fn release(&mut self, pin_id: &str) {
        self.locks.remove(pin_id);
    }

    /// Release every lock held by `member_id`. Called on disconnect.
    pub fn release_all_for(&mut self, member_id: &str) {
        self.locks.retain(|_, holder| holder != member_id);
    }

    pub fn holder(&self, pin_id: &str) -> Option<&str> {
        self.locks.get(pin_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_is_first_come_wins() {
        let mut table = EditLockTable::new();
        assert!(table.acquire("pin1", "alice"));
        assert!(!table.acquire("pin1", "bob"));
        assert_eq!(table.holder("pin1"), Some("alice"));
        // Even the holder cannot acquire twice; the lock is already held.
        assert!(!table.acquire("pin1", "alice"));
    }

    #[test]
    fn release_is_idempotent() {
        let mut table = EditLockTable::new();
        assert!(table.acquire("pin1", "alice"));
        table.release("pin1");
        table.release("pin1");
        assert!(table.acquire("pin1", "bob"));
    }

    #[test]
    fn release_all_for_releases_exactly_that_members_locks() {
        let mut table = EditLockTable::new();
        assert!(table.acquire("pin1", "alice"));
        assert!(table.acquire("pin2", "alice"));
        assert!(table.acquire("pin3", "bob"));

        table.release_all_for("alice");

        assert!(table.acquire("pin1", "bob"));
        assert!(table.acquire("pin2", "carol"));
        assert_eq!(table.holder("pin3"), Some("bob"));
    }
}
