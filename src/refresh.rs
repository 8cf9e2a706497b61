//! Batches dirty-aggregate refresh requests within one call stack.
//!
//! The engine marks aggregates dirty as it mutates its indices and drains the
//! batch before returning to the caller, so every dirty aggregate has its
//! display rebuilt before the next externally observable read. Repeated marks
//! of the same aggregate within a batch collapse into one.

use crate::aggregate::AggregateId;
use ahash::AHashSet;

#[derive(Default)]
pub struct ClusterRefresher {
    pending: Vec<AggregateId>,
    queued: AHashSet<AggregateId>,
}

impl ClusterRefresher {
    pub fn new() -> ClusterRefresher {
        ClusterRefresher::default()
    }

    /// Marks an aggregate dirty. Duplicate marks within one batch are dropped.
    pub fn refresh(&mut self, id: AggregateId) {
        if self.queued.insert(id) {
            self.pending.push(id);
        }
    }

    /// Takes the whole batch, in first-marked order.
    pub fn refresh_all(&mut self) -> Vec<AggregateId> {
        self.queued.clear();
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Discards any pending work.
    pub fn cleanup(&mut self) {
        self.pending.clear();
        self.queued.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_within_a_batch() {
        let mut refresher = ClusterRefresher::new();
        refresher.refresh(3);
        refresher.refresh(5);
        refresher.refresh(3);
        assert_eq!(refresher.refresh_all(), vec![3, 5]);
    }

    #[test]
    fn draining_resets_the_batch() {
        let mut refresher = ClusterRefresher::new();
        refresher.refresh(1);
        refresher.refresh_all();
        assert!(!refresher.has_pending());
        refresher.refresh(1);
        assert_eq!(refresher.refresh_all(), vec![1]);
    }

    #[test]
    fn cleanup_discards_pending_work() {
        let mut refresher = ClusterRefresher::new();
        refresher.refresh(1);
        refresher.refresh(2);
        refresher.cleanup();
        assert!(refresher.refresh_all().is_empty());
    }
}
