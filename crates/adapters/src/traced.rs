// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::queue::{QueueError, WorkQueue};
use crate::store::{ObjectStore, StoreError};
use async_trait::async_trait;
use tko_core::{AuditEvent, ObjectKey, ObservationSingleton, WatchedRun, WorkItem};
use tracing::Instrument;

/// Wrapper that adds tracing to any ObjectStore
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for TracedStore<S> {
    async fn get_run(&self, key: &ObjectKey) -> Result<Option<WatchedRun>, StoreError> {
        let span = tracing::debug_span!("store.get_run", run = %key);

        let start = std::time::Instant::now();
        let result = self.inner.get_run(key).instrument(span.clone()).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        span.in_scope(|| match &result {
            Ok(Some(run)) => tracing::debug!(
                elapsed_ms,
                resource_version = run.resource_version,
                done = run.is_done(),
                "read run"
            ),
            Ok(None) => tracing::debug!(elapsed_ms, "run not found"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "get failed"),
        });

        result
    }

    async fn patch_run(
        &self,
        base: &WatchedRun,
        mutated: &WatchedRun,
    ) -> Result<WatchedRun, StoreError> {
        let span = tracing::info_span!(
            "store.patch_run",
            run = %base.key,
            resource_version = base.resource_version
        );
        span.in_scope(|| tracing::info!("patching"));

        let start = std::time::Instant::now();
        let result = self
            .inner
            .patch_run(base, mutated)
            .instrument(span.clone())
            .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        span.in_scope(|| match &result {
            Ok(stored) => tracing::info!(
                elapsed_ms,
                new_version = stored.resource_version,
                "patched"
            ),
            // Losing an optimistic race is expected
            Err(e) if e.is_conflict() => tracing::info!(elapsed_ms, error = %e, "patch conflicted"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "patch failed"),
        });

        result
    }

    async fn get_observation(
        &self,
        namespace: &str,
    ) -> Result<Option<ObservationSingleton>, StoreError> {
        let result = self.inner.get_observation(namespace).await;
        tracing::trace!(
            namespace,
            found = ?result.as_ref().map(|o| o.is_some()).ok(),
            "checked singleton"
        );
        result
    }

    async fn create_observation(
        &self,
        observation: &ObservationSingleton,
    ) -> Result<(), StoreError> {
        let span = tracing::info_span!(
            "store.create_observation",
            namespace = %observation.namespace
        );

        let result = self
            .inner
            .create_observation(observation)
            .instrument(span.clone())
            .await;
        span.in_scope(|| match &result {
            Ok(()) => tracing::info!("singleton created"),
            Err(e) if e.is_already_exists() => tracing::debug!("singleton already exists"),
            Err(e) => tracing::warn!(error = %e, "singleton create failed"),
        });

        result
    }

    async fn create_event(&self, event: &AuditEvent) -> Result<String, StoreError> {
        let span = tracing::debug_span!(
            "store.create_event",
            namespace = %event.namespace,
            reason = %event.reason
        );

        let result = self.inner.create_event(event).instrument(span.clone()).await;
        span.in_scope(|| match &result {
            Ok(name) => tracing::debug!(name, "event created"),
            Err(e) => tracing::warn!(error = %e, "event create failed"),
        });

        result
    }
}

/// Wrapper that adds tracing to any WorkQueue
#[derive(Clone)]
pub struct TracedQueue<Q> {
    inner: Q,
}

impl<Q> TracedQueue<Q> {
    pub fn new(inner: Q) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<Q: WorkQueue> WorkQueue for TracedQueue<Q> {
    async fn enqueue(&self, item: WorkItem) -> Result<(), QueueError> {
        let span = tracing::info_span!("queue.enqueue", item = %item);

        let result = self.inner.enqueue(item).instrument(span.clone()).await;
        span.in_scope(|| match &result {
            Ok(()) => tracing::info!("enqueued"),
            Err(e) => tracing::error!(error = %e, "enqueue failed"),
        });

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
