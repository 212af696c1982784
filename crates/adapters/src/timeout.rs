// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caller-imposed deadline on every store call
//!
//! A call that misses its deadline is dropped before it completes, so a patch
//! either lands whole or not at all.

use crate::store::{ObjectStore, StoreError};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tko_core::{AuditEvent, ObjectKey, ObservationSingleton, WatchedRun};

#[derive(Clone)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for TimeoutStore<S> {
    async fn get_run(&self, key: &ObjectKey) -> Result<Option<WatchedRun>, StoreError> {
        self.bounded(self.inner.get_run(key)).await
    }

    async fn patch_run(
        &self,
        base: &WatchedRun,
        mutated: &WatchedRun,
    ) -> Result<WatchedRun, StoreError> {
        self.bounded(self.inner.patch_run(base, mutated)).await
    }

    async fn get_observation(
        &self,
        namespace: &str,
    ) -> Result<Option<ObservationSingleton>, StoreError> {
        self.bounded(self.inner.get_observation(namespace)).await
    }

    async fn create_observation(
        &self,
        observation: &ObservationSingleton,
    ) -> Result<(), StoreError> {
        self.bounded(self.inner.create_observation(observation)).await
    }

    async fn create_event(&self, event: &AuditEvent) -> Result<String, StoreError> {
        self.bounded(self.inner.create_event(event)).await
    }
}

#[cfg(test)]
#[path = "timeout_tests.rs"]
mod tests;
