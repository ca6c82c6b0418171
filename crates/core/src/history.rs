//! History Bound Policy
//!
//! Both domains keep short most-recent-first lists. The truncation rule lives
//! here once, parameterized by the per-domain bound.

/// Keep at most `N` most-recently-inserted elements, front = newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryBound(usize);

impl HistoryBound {
    /// Bound for the fun-activity `recent_topics` list.
    pub const RECENT_TOPICS: HistoryBound = HistoryBound(5);
    /// Bound for the planning `recent_plans` list.
    pub const RECENT_PLANS: HistoryBound = HistoryBound(10);

    pub const fn new(limit: usize) -> Self {
        Self(limit)
    }

    pub const fn limit(&self) -> usize {
        self.0
    }

    /// Inserts `item` at the front and drops anything past the bound.
    pub fn record<T: Clone>(&self, list: &[T], item: T) -> Vec<T> {
        let mut next = Vec::with_capacity(list.len().min(self.0) + 1);
        next.push(item);
        next.extend(list.iter().take(self.0.saturating_sub(1)).cloned());
        next.truncate(self.0);
        next
    }

    /// Like [`record`](Self::record), but does not insert when an equal element
    /// is already present. The existing entry keeps its position. The result is
    /// always within the bound, even when `list` was not.
    pub fn record_unique<T: Clone + PartialEq>(&self, list: &[T], item: T) -> Vec<T> {
        if list.contains(&item) {
            return list.iter().take(self.0).cloned().collect();
        }
        self.record(list, item)
    }
}

/// Appends `item` unless it is already present (set semantics, insertion order).
pub fn append_unique<T: Clone + PartialEq>(list: &[T], item: T) -> Vec<T> {
    let mut next = list.to_vec();
    if !next.contains(&item) {
        next.push(item);
    }
    next
}
