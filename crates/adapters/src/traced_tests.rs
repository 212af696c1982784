// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use crate::queue::FakeQueue;
use crate::store::{FakeStore, StoreCall, StoreOp};
use tko_core::ProcessingState;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_patch_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeStore::new();
        let base = fake.insert_run(WatchedRun::new("ci", "build-1"));
        let traced = TracedStore::new(fake);

        traced
            .patch_run(&base, &base.with_state_written(ProcessingState::Started))
            .await
    });

    assert!(result.is_ok(), "patch should succeed: {:?}", result);
    assert!(
        logs.contains("store.patch_run"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("ci/build-1"),
        "Should log run key. Logs:\n{}",
        logs
    );
    assert!(logs.contains("patching"), "Should log entry. Logs:\n{}", logs);
    assert!(logs.contains("patched"), "Should log completion. Logs:\n{}", logs);
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_patch_logs_conflict_below_error() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeStore::new();
        let base = fake.insert_run(WatchedRun::new("ci", "build-1"));
        fake.fail_next(StoreOp::PatchRun, StoreError::Conflict("stale".to_string()));
        let traced = TracedStore::new(fake);

        traced
            .patch_run(&base, &base.with_state_written(ProcessingState::Started))
            .await
    });

    assert!(result.unwrap_err().is_conflict());
    assert!(
        logs.contains("patch conflicted"),
        "Should log conflict. Logs:\n{}",
        logs
    );
    assert!(!logs.contains("ERROR"), "Conflict is not an error. Logs:\n{}", logs);
}

#[test]
fn traced_get_logs_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeStore::new();
        fake.fail_next(StoreOp::GetRun, StoreError::Unreachable("refused".to_string()));
        TracedStore::new(fake)
            .get_run(&ObjectKey::new("ci", "build-1"))
            .await
    });

    assert!(result.is_err());
    assert!(logs.contains("get failed"), "Should log failure. Logs:\n{}", logs);
    assert!(logs.contains("refused"), "Should log cause. Logs:\n{}", logs);
}

#[test]
fn traced_create_observation_logs_already_exists_quietly() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeStore::new();
        fake.insert_observation(ObservationSingleton::new("ci"));
        TracedStore::new(fake)
            .create_observation(&ObservationSingleton::new("ci"))
            .await
    });

    assert!(result.unwrap_err().is_already_exists());
    assert!(
        logs.contains("singleton already exists"),
        "Should log race. Logs:\n{}",
        logs
    );
    assert!(!logs.contains("WARN"), "Race is not a warning. Logs:\n{}", logs);
}

#[test]
fn traced_queue_logs_enqueue() {
    let (logs, result) = with_tracing(|| async {
        TracedQueue::new(FakeQueue::new())
            .enqueue(WorkItem::for_namespace("ci"))
            .await
    });

    assert!(result.is_ok());
    assert!(logs.contains("queue.enqueue"), "Should log span. Logs:\n{}", logs);
    assert!(
        logs.contains("ci/tekton-observer"),
        "Should log item. Logs:\n{}",
        logs
    );
}

/// Store whose reads suspend before answering, so other tasks run meanwhile
#[derive(Clone)]
struct YieldingStore {
    inner: FakeStore,
}

#[async_trait]
impl ObjectStore for YieldingStore {
    async fn get_run(&self, key: &ObjectKey) -> Result<Option<WatchedRun>, StoreError> {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.inner.get_run(key).await
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

#[test]
fn suspended_call_does_not_claim_other_tasks_logs() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeStore::new();
        fake.insert_run(WatchedRun::new("ci", "run-a"));
        let traced = TracedStore::new(YieldingStore { inner: fake });
        let key = ObjectKey::new("ci", "run-a");

        let (read, ()) = tokio::join!(traced.get_run(&key), async {
            tokio::task::yield_now().await;
            tracing::info!("unrelated event from another task");
        });
        read
    });

    assert!(result.unwrap().is_some());
    let line = logs
        .lines()
        .find(|l| l.contains("unrelated event"))
        .unwrap_or_else(|| panic!("Should log the other task. Logs:\n{}", logs));
    assert!(
        !line.contains("store.get_run"),
        "Other task's line must not carry the store span: {}",
        line
    );
    assert!(
        logs.lines()
            .any(|l| l.contains("store.get_run") && l.contains("read run")),
        "Own result is still logged in the span. Logs:\n{}",
        logs
    );
}

// =============================================================================
// Delegation tests - verify traced wrapper delegates to inner adapter
// =============================================================================

#[tokio::test]
async fn traced_store_delegates_patch_to_inner() {
    let fake = FakeStore::new();
    let base = fake.insert_run(WatchedRun::new("ci", "build-1"));
    let traced = TracedStore::new(fake.clone());

    traced
        .patch_run(&base, &base.with_state_written(ProcessingState::Started))
        .await
        .unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        StoreCall::PatchRun {
            key,
            resource_version,
            ..
        } => {
            assert_eq!(key, &base.key);
            assert_eq!(*resource_version, base.resource_version);
        }
        other => panic!("Expected PatchRun call, got {:?}", other),
    }
}

#[tokio::test]
async fn traced_queue_delegates_to_inner() {
    let fake = FakeQueue::new();
    let traced = TracedQueue::new(fake.clone());

    traced.enqueue(WorkItem::for_namespace("ci")).await.unwrap();

    assert_eq!(fake.items(), vec![WorkItem::for_namespace("ci")]);
}
