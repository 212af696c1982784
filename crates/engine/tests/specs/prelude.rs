//! Shared harness for engine specs

#![allow(dead_code, unused_imports)]

pub use tko_adapters::{FakeMetrics, FakeQueue, FakeStore, MetricsCall, StoreCall};
pub use tko_core::{Decision, FakeClock, ObjectKey, ProcessingState, WatchedRun, WorkItem};
pub use tko_engine::{CompletionController, ControllerDeps};

/// A cluster with one controller attached
pub struct Cluster<S = FakeStore> {
    pub store: FakeStore,
    pub queue: FakeQueue,
    pub metrics: FakeMetrics,
    pub controller: CompletionController<S, FakeQueue, FakeClock, FakeMetrics>,
}

impl Cluster {
    pub fn new() -> Self {
        let store = FakeStore::new();
        Self::with_store(store.clone(), store)
    }
}

impl<S: tko_adapters::ObjectStore> Cluster<S> {
    /// Attach the controller through `wrapped`, which must sit on `store`
    pub fn with_store(store: FakeStore, wrapped: S) -> Self {
        let queue = FakeQueue::new();
        let metrics = FakeMetrics::new();
        let controller = CompletionController::new(
            ControllerDeps {
                store: wrapped,
                queue: queue.clone(),
                clock: FakeClock::new(),
                metrics: metrics.clone(),
            },
            "tekton-observer",
            "test-cluster",
        );
        Self {
            store,
            queue,
            metrics,
            controller,
        }
    }

    pub fn state(&self, key: &ObjectKey) -> ProcessingState {
        self.store.run(key).unwrap().processing_state().unwrap()
    }

    pub fn dispatches(&self) -> usize {
        self.queue.items().len()
    }

    pub fn claims(&self) -> usize {
        self.metrics.count(&MetricsCall::Claim)
    }

    /// Pipeline controller reports the run finished
    pub fn finish(&self, key: &ObjectKey, succeeded: bool) {
        self.store
            .update_run(key, |run| *run = run.clone().finished(succeeded))
            .unwrap();
    }
}

pub fn run_key(name: &str) -> ObjectKey {
    ObjectKey::new("ci", name)
}
