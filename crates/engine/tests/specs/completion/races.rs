//! Concurrent and duplicated delivery
//!
//! The store's optimistic patch is the only thing serialising handlers of
//! the same run.

use crate::prelude::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tko_adapters::{ObjectStore, StoreError};
use tko_core::{AuditEvent, ObservationSingleton};
use tokio::sync::Barrier;

/// Holds the first `parties` reads until all of them have happened, so
/// every handler decides from the same snapshot
#[derive(Clone)]
struct LockstepStore {
    inner: FakeStore,
    reads: Arc<AtomicUsize>,
    parties: usize,
    barrier: Arc<Barrier>,
}

impl LockstepStore {
    fn new(inner: FakeStore, parties: usize) -> Self {
        Self {
            inner,
            reads: Arc::new(AtomicUsize::new(0)),
            parties,
            barrier: Arc::new(Barrier::new(parties)),
        }
    }
}

#[async_trait]
impl ObjectStore for LockstepStore {
    async fn get_run(&self, key: &ObjectKey) -> Result<Option<WatchedRun>, StoreError> {
        let result = self.inner.get_run(key).await;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        result
    }

    async fn patch_run(
        &self,
        base: &WatchedRun,
        mutated: &WatchedRun,
    ) -> Result<WatchedRun, StoreError> {
        self.inner.patch_run(base, mutated).await
    }

    async fn get_observation(
        &self,
        namespace: &str,
    ) -> Result<Option<ObservationSingleton>, StoreError> {
        self.inner.get_observation(namespace).await
    }

    async fn create_observation(
        &self,
        observation: &ObservationSingleton,
    ) -> Result<(), StoreError> {
        self.inner.create_observation(observation).await
    }

    async fn create_event(&self, event: &AuditEvent) -> Result<String, StoreError> {
        self.inner.create_event(event).await
    }
}

fn lockstep_cluster(parties: usize) -> Cluster<LockstepStore> {
    let store = FakeStore::new();
    Cluster::with_store(store.clone(), LockstepStore::new(store, parties))
}

#[tokio::test]
async fn two_concurrent_handlers_claim_once() {
    let cluster = lockstep_cluster(2);
    let key = run_key("build-1");
    cluster.store.insert_run(WatchedRun::new("ci", "build-1"));

    let (a, b) = tokio::join!(
        cluster.controller.handle(&key),
        cluster.controller.handle(&key)
    );
    let mut decisions = vec![a.unwrap(), b.unwrap()];
    decisions.sort_by_key(|d| d.as_str());

    assert_eq!(decisions, vec![Decision::Dispatch, Decision::NoOp]);
    assert_eq!(cluster.dispatches(), 1);
    assert_eq!(cluster.claims(), 1);
    assert_eq!(cluster.store.patch_count(), 2);
    assert_eq!(cluster.state(&key), ProcessingState::Started);
    assert!(cluster.store.events().is_empty());
}

#[tokio::test]
async fn many_concurrent_handlers_claim_once() {
    let cluster = lockstep_cluster(8);
    let key = run_key("build-1");
    cluster.store.insert_run(WatchedRun::new("ci", "build-1"));

    let mut handlers = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let controller = cluster.controller.clone();
        let key = key.clone();
        handlers.spawn(async move { controller.handle(&key).await });
    }
    let mut dispatched = 0;
    while let Some(joined) = handlers.join_next().await {
        if joined.unwrap().unwrap() == Decision::Dispatch {
            dispatched += 1;
        }
    }

    assert_eq!(dispatched, 1);
    assert_eq!(cluster.dispatches(), 1);
    assert_eq!(cluster.claims(), 1);
}

#[tokio::test]
async fn concurrent_handlers_for_different_runs_each_dispatch() {
    let cluster = Cluster::new();
    for name in ["build-1", "build-2", "build-3"] {
        cluster.store.insert_run(WatchedRun::new("ci", name));
    }

    let (k1, k2, k3) = (run_key("build-1"), run_key("build-2"), run_key("build-3"));
    let (a, b, c) = tokio::join!(
        cluster.controller.handle(&k1),
        cluster.controller.handle(&k2),
        cluster.controller.handle(&k3),
    );

    for decision in [a, b, c] {
        assert_eq!(decision.unwrap(), Decision::Dispatch);
    }
    assert_eq!(cluster.claims(), 3);
    // All three address the same singleton
    assert!(cluster
        .queue
        .items()
        .iter()
        .all(|item| *item == WorkItem::for_namespace("ci")));
}

#[tokio::test]
async fn repeated_delivery_does_not_reclaim() {
    let cluster = Cluster::new();
    let key = run_key("build-1");
    cluster.store.insert_run(WatchedRun::new("ci", "build-1"));

    for _ in 0..10 {
        cluster.controller.handle(&key).await.unwrap();
    }

    assert_eq!(cluster.claims(), 1);
    assert_eq!(cluster.dispatches(), 1);
}
