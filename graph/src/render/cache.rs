use crate::core::LayoutSnapshot;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Holds the snapshot the renderer currently draws.
///
/// Layout runs may overlap; each run takes a generation from `begin` and only
/// the most recently begun run may publish or clear.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Option<(u64, Arc<LayoutSnapshot>)>>,
    next_generation: AtomicU64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a generation number for a new layout run
    pub fn begin(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish the result of run `generation`; results superseded by a newer
    /// request are dropped even if that request has not finished yet
    pub fn publish(&self, generation: u64, snapshot: LayoutSnapshot) -> bool {
        let mut current = self.current.write();
        let latest = self.next_generation.load(Ordering::SeqCst);
        if generation < latest {
            debug!(generation, latest, "discarding stale layout");
            return false;
        }
        *current = Some((generation, Arc::new(snapshot)));
        true
    }

    /// A failed run leaves nothing to draw, unless a newer run was requested
    pub fn fail(&self, generation: u64) -> bool {
        let mut current = self.current.write();
        if generation < self.next_generation.load(Ordering::SeqCst) {
            return false;
        }
        *current = None;
        true
    }

    pub fn snapshot(&self) -> Option<Arc<LayoutSnapshot>> {
        self.current.read().as_ref().map(|(_, snapshot)| Arc::clone(snapshot))
    }

    pub fn generation(&self) -> Option<u64> {
        self.current.read().as_ref().map(|(generation, _)| *generation)
    }

    pub fn invalidate(&self) {
        *self.current.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Commit;
    use crate::layout::layout;
    use pretty_assertions::assert_eq;

    fn snapshot(len: usize) -> LayoutSnapshot {
        let commits: Vec<_> = (0..len)
            .map(|i| Commit::root(format!("r{}", i)))
            .collect();
        layout(&commits)
    }

    #[test]
    fn test_last_writer_wins() {
        let store = SnapshotStore::new();
        let first = store.begin();
        let second = store.begin();
        assert!(second > first);

        assert!(store.publish(second, snapshot(2)));
        assert!(!store.publish(first, snapshot(1)));
        assert_eq!(store.snapshot().map(|s| s.row_count()), Some(2));
        assert_eq!(store.generation(), Some(second));
    }

    #[test]
    fn test_older_result_dropped_while_newer_pending() {
        let store = SnapshotStore::new();
        let first = store.begin();
        let second = store.begin();

        assert!(!store.publish(first, snapshot(1)));
        assert!(store.snapshot().is_none());

        assert!(store.publish(second, snapshot(2)));
        assert_eq!(store.generation(), Some(second));
    }

    #[test]
    fn test_in_order_publish_replaces() {
        let store = SnapshotStore::new();
        let first = store.begin();
        assert!(store.publish(first, snapshot(1)));
        let held = store.snapshot().unwrap();

        let second = store.begin();
        assert!(store.publish(second, snapshot(3)));
        assert_eq!(store.snapshot().map(|s| s.row_count()), Some(3));
        // Readers keep the snapshot they already took
        assert_eq!(held.row_count(), 1);
    }

    #[test]
    fn test_failure_clears_snapshot() {
        let store = SnapshotStore::new();
        let first = store.begin();
        store.publish(first, snapshot(1));

        let second = store.begin();
        assert!(store.fail(second));
        assert!(store.snapshot().is_none());

        let third = store.begin();
        store.publish(third, snapshot(2));
        assert!(!store.fail(second));
        assert!(store.snapshot().is_some());

        store.invalidate();
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_superseded_failure_keeps_overlay() {
        let store = SnapshotStore::new();
        let first = store.begin();
        store.publish(first, snapshot(1));

        let failing = store.begin();
        let _pending = store.begin();
        assert!(!store.fail(failing));
        assert_eq!(store.snapshot().map(|s| s.row_count()), Some(1));
    }
}
