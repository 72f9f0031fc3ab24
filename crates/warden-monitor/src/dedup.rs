//! Record ids already processed during this process lifetime.

use std::collections::BTreeSet;

/// Set of processed record ids.
///
/// Unbounded by default: ids are never removed. A bounded window keeps the highest committed id
/// (the watermark) plus `trailing` ids below it; anything at or below `watermark - trailing` is
/// treated as already processed.
///
/// The watermark only moves on [`DedupWindow::commit`], so a batch read newest-first is checked
/// against the floor from before the batch.
#[derive(Debug, Clone, Default)]
pub struct DedupWindow {
    seen: BTreeSet<u64>,
    watermark: Option<u64>,
    pending: Option<u64>,
    trailing: Option<u64>,
}

impl DedupWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(trailing: u64) -> Self {
        Self {
            trailing: Some(trailing),
            ..Self::default()
        }
    }

    fn floor(&self) -> Option<u64> {
        self.watermark?.checked_sub(self.trailing?)
    }

    pub fn contains(&self, record_id: u64) -> bool {
        match self.floor() {
            Some(floor) if record_id <= floor => true,
            _ => self.seen.contains(&record_id),
        }
    }

    /// Mark `record_id` processed. Returns false if it already was.
    pub fn insert(&mut self, record_id: u64) -> bool {
        if self.contains(record_id) {
            return false;
        }
        self.seen.insert(record_id);
        if self.pending.map_or(true, |p| record_id > p) {
            self.pending = Some(record_id);
        }
        true
    }

    /// Advance the watermark to the highest id inserted since the last commit and drop ids at or
    /// below the new floor. Call once a batch is done.
    pub fn commit(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if self.watermark.map_or(true, |w| pending > w) {
            self.watermark = Some(pending);
        }
        if let Some(floor) = self.floor() {
            self.seen.retain(|id| *id > floor);
        }
    }

    /// Highest committed record id.
    pub fn watermark(&self) -> Option<u64> {
        self.watermark
    }

    /// Number of ids held in memory.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_remembers_everything() {
        let mut w = DedupWindow::unbounded();
        assert!(w.insert(5));
        assert!(w.insert(1));
        assert!(w.insert(1000));
        w.commit();
        assert!(!w.insert(5));
        assert!(!w.insert(1));
        assert!(w.insert(2));
        w.commit();
        assert_eq!(w.len(), 4);
        assert_eq!(w.watermark(), Some(1000));
    }

    #[test]
    fn bounded_keeps_trailing_ids_only() {
        let mut w = DedupWindow::bounded(3);
        for id in 1..=10 {
            assert!(w.insert(id));
            w.commit();
        }
        // floor is 7: 8, 9, 10 are retained, everything below counts as seen
        assert_eq!(w.len(), 3);
        assert!(w.contains(2));
        assert!(!w.insert(7));
        assert!(!w.insert(9));
        assert!(w.insert(11));
        w.commit();
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn newest_first_batch_larger_than_window_is_accepted() {
        let mut w = DedupWindow::bounded(2);
        for id in (1..=10).rev() {
            assert!(w.insert(id), "id {id} rejected");
        }
        assert_eq!(w.watermark(), None);
        w.commit();
        assert_eq!(w.watermark(), Some(10));
        assert_eq!(w.len(), 2);
        for id in 1..=10 {
            assert!(w.contains(id));
        }
    }

    #[test]
    fn bounded_accepts_late_ids_inside_window() {
        let mut w = DedupWindow::bounded(10);
        assert!(w.insert(20));
        w.commit();
        assert!(w.insert(15));
        assert!(!w.insert(15));
        assert!(!w.insert(10));
        assert!(w.insert(11));
    }

    #[test]
    fn bounded_before_watermark_reaches_window() {
        let mut w = DedupWindow::bounded(100);
        assert!(w.insert(3));
        assert!(w.insert(0));
        w.commit();
        assert!(!w.insert(0));
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn zero_window_at_max_id() {
        let mut w = DedupWindow::bounded(0);
        assert!(w.insert(u64::MAX));
        w.commit();
        assert!(w.is_empty());
        assert!(w.contains(u64::MAX));
        assert!(!w.insert(u64::MAX));
    }
}
