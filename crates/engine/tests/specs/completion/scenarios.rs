//! Single-notification scenarios
//!
//! One notification per case, checked against the store and queue.

use crate::prelude::*;

#[tokio::test]
async fn unannotated_running_run_is_claimed_and_dispatched() {
    let cluster = Cluster::new();
    let key = run_key("build-1");
    cluster.store.insert_run(WatchedRun::new("ci", "build-1"));

    let decision = cluster.controller.handle(&key).await.unwrap();

    assert_eq!(decision, Decision::Dispatch);
    assert_eq!(cluster.state(&key), ProcessingState::Started);
    assert_eq!(cluster.queue.items(), vec![WorkItem::for_namespace("ci")]);
}

#[tokio::test]
async fn started_running_run_enqueues_nothing() {
    let cluster = Cluster::new();
    let key = run_key("build-1");
    cluster
        .store
        .insert_run(WatchedRun::new("ci", "build-1").with_processing_state(ProcessingState::Started));

    let decision = cluster.controller.handle(&key).await.unwrap();

    assert_eq!(decision, Decision::NoOp);
    assert_eq!(cluster.dispatches(), 0);
    assert_eq!(cluster.state(&key), ProcessingState::Started);
}

#[tokio::test]
async fn started_finished_run_dispatches_and_stays_started() {
    let cluster = Cluster::new();
    let key = run_key("build-1");
    cluster.store.insert_run(
        WatchedRun::new("ci", "build-1")
            .with_processing_state(ProcessingState::Started)
            .finished(true),
    );

    let decision = cluster.controller.handle(&key).await.unwrap();

    assert_eq!(decision, Decision::Dispatch);
    assert_eq!(cluster.dispatches(), 1);
    assert_eq!(cluster.state(&key), ProcessingState::Started);
}

#[tokio::test]
async fn complete_run_is_ignored_whether_or_not_done() {
    for run in [
        WatchedRun::new("ci", "build-1").with_processing_state(ProcessingState::Complete),
        WatchedRun::new("ci", "build-1")
            .with_processing_state(ProcessingState::Complete)
            .finished(true),
    ] {
        let cluster = Cluster::new();
        cluster.store.insert_run(run);

        let decision = cluster.controller.handle(&run_key("build-1")).await.unwrap();

        assert_eq!(decision, Decision::NoOp);
        assert_eq!(cluster.dispatches(), 0);
        assert_eq!(cluster.store.patch_count(), 0);
    }
}

#[tokio::test]
async fn first_run_in_namespace_creates_the_singleton() {
    let cluster = Cluster::new();
    cluster.store.insert_run(WatchedRun::new("ci", "build-1"));
    assert!(cluster.store.observation("ci").is_none());

    cluster.controller.handle(&run_key("build-1")).await.unwrap();

    let singleton = cluster.store.observation("ci").unwrap();
    assert_eq!(singleton.name(), tko_core::SINGLETON_NAME);
    assert!(singleton.channels.is_empty());
    assert_eq!(cluster.queue.items()[0].key(), singleton.key());
}
