use crate::config::UNDO_CAPACITY;
use crate::models::UndoHistoryItem;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;

/// Bounded history of pre-expansion states for one text block.
///
/// Only the newest item is ever considered, and only while it is a shortcut
/// expansion younger than the undo window.
#[derive(Debug, Clone)]
pub struct UndoLedger {
    items: VecDeque<UndoHistoryItem>,
    capacity: usize,
}

impl Default for UndoLedger {
    fn default() -> Self {
        Self::new(UNDO_CAPACITY)
    }
}

impl UndoLedger {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, dropping the oldest once over capacity
    pub fn push(&mut self, item: UndoHistoryItem) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    /// Pop the newest item if it is a shortcut expansion younger than `max_age` at `now`
    pub fn pop_if_recent_at(
        &mut self,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Option<UndoHistoryItem> {
        let newest = self.items.back()?;
        if !newest.is_shortcut_expansion {
            return None;
        }

        let age = now.signed_duration_since(newest.timestamp);
        let max_age = chrono::Duration::from_std(max_age).ok()?;
        if age >= max_age {
            return None;
        }

        self.items.pop_back()
    }

    pub fn pop_if_recent(&mut self, max_age: Duration) -> Option<UndoHistoryItem> {
        self.pop_if_recent_at(Utc::now(), max_age)
    }

    pub fn peek(&self) -> Option<&UndoHistoryItem> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(text: &str, at: DateTime<Utc>, expansion: bool) -> UndoHistoryItem {
        UndoHistoryItem {
            text: text.to_string(),
            cursor_position: text.chars().count(),
            is_shortcut_expansion: expansion,
            timestamp: at,
            expanded_shortcut: expansion.then(|| "בס".to_string()),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn pops_within_window_only() {
        let window = Duration::from_millis(30_000);
        let mut ledger = UndoLedger::default();
        ledger.push(item("בס", t0(), true));

        let late = t0() + chrono::Duration::milliseconds(30_001);
        assert!(ledger.pop_if_recent_at(late, window).is_none());
        assert_eq!(ledger.len(), 1);

        let in_time = t0() + chrono::Duration::milliseconds(29_999);
        let popped = ledger.pop_if_recent_at(in_time, window).unwrap();
        assert_eq!(popped.text, "בס");
        assert!(ledger.is_empty());
    }

    #[test]
    fn non_expansion_item_blocks_pop() {
        let mut ledger = UndoLedger::default();
        ledger.push(item("ישן", t0(), true));
        ledger.push(item("חדש", t0(), false));

        assert!(ledger
            .pop_if_recent_at(t0(), Duration::from_secs(30))
            .is_none());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut ledger = UndoLedger::new(3);
        for i in 0..5 {
            ledger.push(item(&i.to_string(), t0(), true));
        }
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.peek().unwrap().text, "4");

        ledger.clear();
        assert!(ledger.peek().is_none());
    }
}
