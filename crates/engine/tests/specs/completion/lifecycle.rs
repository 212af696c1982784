//! Whole-run histories
//!
//! A run is created, runs, finishes, and is marked complete downstream,
//! with the change feed delivering a notification after every write.

use crate::prelude::*;
use tko_adapters::ChannelQueue;
use tko_engine::{EngineConfig, Runtime};
use tokio::sync::mpsc;

#[tokio::test]
async fn run_history_dispatches_on_claim_and_on_finish() {
    let cluster = Cluster::new();
    let key = run_key("build-1");

    // Created
    cluster.store.insert_run(WatchedRun::new("ci", "build-1"));
    assert_eq!(cluster.controller.handle(&key).await.unwrap(), Decision::Dispatch);
    // Our own claim write echoes back through the feed
    assert_eq!(cluster.controller.handle(&key).await.unwrap(), Decision::NoOp);

    // Still running, status churn
    for _ in 0..3 {
        cluster.store.update_run(&key, |_| {}).unwrap();
        assert_eq!(cluster.controller.handle(&key).await.unwrap(), Decision::NoOp);
    }

    // Finished
    cluster.finish(&key, true);
    assert_eq!(cluster.controller.handle(&key).await.unwrap(), Decision::Dispatch);
    assert_eq!(cluster.dispatches(), 2);

    // Downstream reconciler records completion
    assert!(cluster.controller.mark_complete(&key).await.unwrap());
    assert_eq!(cluster.state(&key), ProcessingState::Complete);

    // Replays after completion are absorbed
    for _ in 0..3 {
        assert_eq!(cluster.controller.handle(&key).await.unwrap(), Decision::NoOp);
    }
    assert_eq!(cluster.dispatches(), 2);
    assert_eq!(cluster.claims(), 1);
}

#[tokio::test]
async fn finished_run_dispatches_again_until_marked_complete() {
    let cluster = Cluster::new();
    let key = run_key("build-1");
    cluster.store.insert_run(WatchedRun::new("ci", "build-1").finished(false));

    cluster.controller.handle(&key).await.unwrap();
    cluster.controller.handle(&key).await.unwrap();
    cluster.controller.handle(&key).await.unwrap();

    // Claim dispatch plus one per later sighting of the finished run
    assert_eq!(cluster.dispatches(), 3);
    assert_eq!(cluster.claims(), 1);
    assert_eq!(cluster.state(&key), ProcessingState::Started);
}

#[tokio::test]
async fn never_finishing_run_dispatches_once() {
    let cluster = Cluster::new();
    let key = run_key("build-1");
    cluster.store.insert_run(WatchedRun::new("ci", "build-1"));

    for _ in 0..20 {
        cluster.controller.handle(&key).await.unwrap();
    }

    assert_eq!(cluster.dispatches(), 1);
}

#[tokio::test]
async fn configured_runtime_feeds_channel_queue() {
    let store = FakeStore::new();
    store.insert_run(WatchedRun::new("ci", "build-1"));
    store.insert_run(WatchedRun::new("prod", "deploy-1").finished(true));

    let config = EngineConfig::from_toml("max_concurrent = 2\nstore_timeout = \"5s\"").unwrap();
    let (queue, mut reconciler) = ChannelQueue::new();
    let controller = CompletionController::from_config(
        ControllerDeps {
            store: store.clone(),
            queue,
            clock: FakeClock::new(),
            metrics: FakeMetrics::new(),
        },
        &config,
    );
    let runtime = Runtime::new(controller, config.max_concurrent);

    let (tx, rx) = mpsc::channel(4);
    tx.send(run_key("build-1")).await.unwrap();
    tx.send(ObjectKey::new("prod", "deploy-1")).await.unwrap();
    drop(tx);

    let stats = runtime.run(rx).await;
    assert_eq!(stats.dispatched, 2);

    let mut received = Vec::new();
    while let Ok(item) = reconciler.try_recv() {
        received.push(item.namespace);
    }
    received.sort();
    assert_eq!(received, vec!["ci".to_string(), "prod".to_string()]);
    assert!(store.observation("ci").is_some());
    assert!(store.observation("prod").is_some());
}
