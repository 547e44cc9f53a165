use crate::core::{Commit, LayoutSnapshot};
use crate::error::{GraphError, Result};
use crate::layout::{layout_with, LayoutOptions};
use crate::render::SnapshotStore;
use std::sync::Arc;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error};

/// Runs layout passes off the caller's thread and publishes the results
#[derive(Debug, Clone)]
pub struct LayoutWorker {
    store: Arc<SnapshotStore>,
    options: LayoutOptions,
}

impl LayoutWorker {
    pub fn new(store: Arc<SnapshotStore>, options: LayoutOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Lay out `commits` in the background.
    ///
    /// The handle resolves to whether the result was published; a result
    /// superseded by a newer request is dropped.
    pub fn request(&self, commits: Vec<Commit>) -> JoinHandle<bool> {
        self.spawn(move |options| layout_with(&commits, options))
    }

    fn spawn<F>(&self, job: F) -> JoinHandle<bool>
    where
        F: FnOnce(&LayoutOptions) -> LayoutSnapshot + Send + 'static,
    {
        let generation = self.store.begin();
        let store = Arc::clone(&self.store);
        let options = self.options.clone();
        debug!(generation, "layout requested");

        tokio::spawn(async move {
            match run_blocking(job, options).await {
                Ok(snapshot) => store.publish(generation, snapshot),
                Err(err) => {
                    error!(generation, %err, "layout failed");
                    if store.fail(generation) {
                        debug!(generation, "graph cleared after failure");
                    }
                    false
                }
            }
        })
    }
}

async fn run_blocking<F>(job: F, options: LayoutOptions) -> Result<LayoutSnapshot>
where
    F: FnOnce(&LayoutOptions) -> LayoutSnapshot + Send + 'static,
{
    task::spawn_blocking(move || job(&options))
        .await
        .map_err(|err| GraphError::Worker(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn history(len: usize) -> Vec<Commit> {
        (0..len)
            .rev()
            .map(|i| match i {
                0 => Commit::root("c0"),
                _ => Commit::new(format!("c{}", i), [format!("c{}", i - 1)]),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_request_publishes() {
        let worker = LayoutWorker::new(Arc::new(SnapshotStore::new()), LayoutOptions::default());
        assert!(worker.request(history(20)).await.unwrap());

        let snapshot = worker.store().snapshot().unwrap();
        assert_eq!(snapshot.row_count(), 20);
        assert_eq!(snapshot.markers(), layout(&history(20)).markers());
    }

    #[tokio::test]
    async fn test_newer_request_wins() {
        let worker = LayoutWorker::new(Arc::new(SnapshotStore::new()), LayoutOptions::default());
        let slow = worker.spawn(|options| {
            std::thread::sleep(Duration::from_millis(100));
            layout_with(&history(3), options)
        });
        let fast = worker.request(history(5));

        assert!(fast.await.unwrap());
        assert!(!slow.await.unwrap());
        assert_eq!(worker.store().snapshot().map(|s| s.row_count()), Some(5));
    }

    #[tokio::test]
    async fn test_older_request_finishing_first_is_dropped() {
        let worker = LayoutWorker::new(Arc::new(SnapshotStore::new()), LayoutOptions::default());
        let fast = worker.request(history(3));
        let slow = worker.spawn(|options| {
            std::thread::sleep(Duration::from_millis(100));
            layout_with(&history(5), options)
        });

        assert!(!fast.await.unwrap());
        assert!(worker.store().snapshot().is_none());

        assert!(slow.await.unwrap());
        assert_eq!(worker.store().snapshot().map(|s| s.row_count()), Some(5));
    }

    #[tokio::test]
    async fn test_superseded_failure_keeps_graph() {
        let worker = LayoutWorker::new(Arc::new(SnapshotStore::new()), LayoutOptions::default());
        assert!(worker.request(history(4)).await.unwrap());

        let failed = worker.spawn(|_| panic!("layout exploded"));
        let newer = worker.spawn(|options| {
            std::thread::sleep(Duration::from_millis(100));
            layout_with(&history(6), options)
        });

        assert!(!failed.await.unwrap());
        assert_eq!(worker.store().snapshot().map(|s| s.row_count()), Some(4));
        assert!(newer.await.unwrap());
        assert_eq!(worker.store().snapshot().map(|s| s.row_count()), Some(6));
    }

    #[tokio::test]
    async fn test_panicked_layout_clears_graph() {
        let worker = LayoutWorker::new(Arc::new(SnapshotStore::new()), LayoutOptions::default());
        assert!(worker.request(history(4)).await.unwrap());

        let failed = worker.spawn(|_| panic!("layout exploded"));
        assert!(!failed.await.unwrap());
        assert!(worker.store().snapshot().is_none());
    }
}
