// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store wrapper recording call latency per operation and outcome

use crate::metrics::{CallOutcome, MetricsSink};
use crate::store::{ObjectStore, StoreError, StoreOp};
use async_trait::async_trait;
use std::time::Instant;
use tko_core::{AuditEvent, ObjectKey, ObservationSingleton, WatchedRun};

#[derive(Clone)]
pub struct MeteredStore<S, M> {
    inner: S,
    metrics: M,
}

impl<S, M: MetricsSink> MeteredStore<S, M> {
    pub fn new(inner: S, metrics: M) -> Self {
        Self { inner, metrics }
    }

    fn observe<T>(&self, op: StoreOp, start: Instant, result: &Result<T, StoreError>) {
        self.metrics
            .record_store_call(op, CallOutcome::of(result), start.elapsed());
    }
}

#[async_trait]
impl<S: ObjectStore, M: MetricsSink> ObjectStore for MeteredStore<S, M> {
    async fn get_run(&self, key: &ObjectKey) -> Result<Option<WatchedRun>, StoreError> {
        let start = Instant::now();
        let result = self.inner.get_run(key).await;
        self.observe(StoreOp::GetRun, start, &result);
        result
    }

    async fn patch_run(
        &self,
        base: &WatchedRun,
        mutated: &WatchedRun,
    ) -> Result<WatchedRun, StoreError> {
        let start = Instant::now();
        let result = self.inner.patch_run(base, mutated).await;
        self.observe(StoreOp::PatchRun, start, &result);
        result
    }

    async fn get_observation(
        &self,
        namespace: &str,
    ) -> Result<Option<ObservationSingleton>, StoreError> {
        let start = Instant::now();
        let result = self.inner.get_observation(namespace).await;
        self.observe(StoreOp::GetObservation, start, &result);
        result
    }

    async fn create_observation(
        &self,
        observation: &ObservationSingleton,
    ) -> Result<(), StoreError> {
        let start = Instant::now();
        let result = self.inner.create_observation(observation).await;
        self.observe(StoreOp::CreateObservation, start, &result);
        result
    }

    async fn create_event(&self, event: &AuditEvent) -> Result<String, StoreError> {
        let start = Instant::now();
        let result = self.inner.create_event(event).await;
        self.observe(StoreOp::CreateEvent, start, &result);
        result
    }
}

#[cfg(test)]
#[path = "metered_tests.rs"]
mod tests;
