use std::collections::HashMap;
use std::sync::Mutex;

/// Identifies one history load for an owner. Later loads get larger tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    owner: String,
    token: u64,
}

impl LoadTicket {
    pub fn token(&self) -> u64 {
        self.token
    }
}

#[derive(Default)]
struct Slot {
    issued: u64,
    published: u64,
    markup: Option<String>,
}

/// The displayed history list of each owner.
///
/// A load takes a ticket before it queries the store and publishes its
/// markup afterwards. Publishing is refused when a newer load has already
/// published, so a slow, earlier load can never overwrite newer content.
#[derive(Default)]
pub struct HistoryBoard {
    slots: Mutex<HashMap<String, Slot>>,
}

impl HistoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a load for `owner`.
    pub fn begin(&self, owner: &str) -> LoadTicket {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = slots.entry(owner.to_string()).or_default();
        slot.issued += 1;
        LoadTicket {
            owner: owner.to_string(),
            token: slot.issued,
        }
    }

    /// Publishes the markup produced by `ticket`'s load. Returns `false`
    /// when the result was stale and has been discarded.
    pub fn publish(&self, ticket: &LoadTicket, markup: String) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = slots.entry(ticket.owner.clone()).or_default();
        if ticket.token <= slot.published {
            tracing::debug!(
                "⏭️ Discarding stale history load {} for {} (shown: {})",
                ticket.token,
                ticket.owner,
                slot.published
            );
            return false;
        }
        slot.published = ticket.token;
        slot.markup = Some(markup);
        true
    }

    /// The markup currently displayed for `owner`.
    pub fn current(&self, owner: &str) -> Option<String> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(owner).and_then(|slot| slot.markup.clone())
    }

    /// Forgets `owner`'s displayed list, e.g. on sign-out.
    pub fn clear(&self, owner: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.get_mut(owner) {
            slot.markup = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_increase_per_owner() {
        let board = HistoryBoard::new();
        let a1 = board.begin("a");
        let a2 = board.begin("a");
        let b1 = board.begin("b");
        assert!(a2.token() > a1.token());
        assert_eq!(b1.token(), 1);
    }

    #[test]
    fn stale_load_cannot_overwrite_newer_one() {
        let board = HistoryBoard::new();
        let earlier = board.begin("a");
        let later = board.begin("a");

        assert!(board.publish(&later, "new".into()));
        assert!(!board.publish(&earlier, "old".into()));
        assert_eq!(board.current("a").as_deref(), Some("new"));
    }

    #[test]
    fn in_order_loads_both_publish() {
        let board = HistoryBoard::new();
        let first = board.begin("a");
        assert!(board.publish(&first, "one".into()));
        let second = board.begin("a");
        assert!(board.publish(&second, "two".into()));
        assert_eq!(board.current("a").as_deref(), Some("two"));
    }

    #[test]
    fn clear_keeps_ordering_but_drops_markup() {
        let board = HistoryBoard::new();
        let first = board.begin("a");
        board.publish(&first, "one".into());
        board.clear("a");
        assert_eq!(board.current("a"), None);
        assert!(!board.publish(&first, "again".into()));
    }
}
