// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake object store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ObjectStore, StoreError, StoreOp};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tko_core::{AnnotationPatch, AuditEvent, ObjectKey, ObservationSingleton, WatchedRun};

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetRun {
        key: ObjectKey,
    },
    PatchRun {
        key: ObjectKey,
        resource_version: u64,
        patch: AnnotationPatch,
    },
    GetObservation {
        namespace: String,
    },
    CreateObservation {
        namespace: String,
    },
    CreateEvent {
        generate_name: String,
    },
}

#[derive(Default)]
struct FakeStoreState {
    runs: HashMap<ObjectKey, WatchedRun>,
    observations: HashMap<String, ObservationSingleton>,
    events: Vec<(String, AuditEvent)>,
    calls: Vec<StoreCall>,
    faults: HashMap<StoreOp, VecDeque<StoreError>>,
    /// Cluster-wide resource version counter
    version: u64,
    event_seq: u64,
}

impl FakeStoreState {
    fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    fn take_fault(&mut self, op: StoreOp) -> Result<(), StoreError> {
        match self.faults.get_mut(&op).and_then(|q| q.pop_front()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory object store with optimistic concurrency
#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<Mutex<FakeStoreState>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeStoreState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a run, assigning it a fresh resource version
    pub fn insert_run(&self, mut run: WatchedRun) -> WatchedRun {
        let mut state = self.state();
        run.resource_version = state.next_version();
        state.runs.insert(run.key.clone(), run.clone());
        run
    }

    /// Mutate a stored run in place (status updates from the pipeline controller)
    pub fn update_run(&self, key: &ObjectKey, f: impl FnOnce(&mut WatchedRun)) -> Option<WatchedRun> {
        let mut state = self.state();
        let version = state.next_version();
        let run = state.runs.get_mut(key)?;
        f(run);
        run.resource_version = version;
        Some(run.clone())
    }

    pub fn delete_run(&self, key: &ObjectKey) -> Option<WatchedRun> {
        self.state().runs.remove(key)
    }

    pub fn run(&self, key: &ObjectKey) -> Option<WatchedRun> {
        self.state().runs.get(key).cloned()
    }

    pub fn insert_observation(&self, observation: ObservationSingleton) {
        self.state()
            .observations
            .insert(observation.namespace.clone(), observation);
    }

    pub fn observation(&self, namespace: &str) -> Option<ObservationSingleton> {
        self.state().observations.get(namespace).cloned()
    }

    /// Created audit events with their assigned names
    pub fn events(&self) -> Vec<(String, AuditEvent)> {
        self.state().events.clone()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    /// Number of patch calls that reached the store
    pub fn patch_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, StoreCall::PatchRun { .. }))
            .count()
    }

    /// Fail the next call of `op` with `err`; queued faults fire in order
    pub fn fail_next(&self, op: StoreOp, err: StoreError) {
        self.state().faults.entry(op).or_default().push_back(err);
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn get_run(&self, key: &ObjectKey) -> Result<Option<WatchedRun>, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::GetRun { key: key.clone() });
        state.take_fault(StoreOp::GetRun)?;
        Ok(state.runs.get(key).cloned())
    }

    async fn patch_run(
        &self,
        base: &WatchedRun,
        mutated: &WatchedRun,
    ) -> Result<WatchedRun, StoreError> {
        let patch = AnnotationPatch::diff(&base.annotations, &mutated.annotations);
        let mut state = self.state();
        state.calls.push(StoreCall::PatchRun {
            key: base.key.clone(),
            resource_version: base.resource_version,
            patch: patch.clone(),
        });
        state.take_fault(StoreOp::PatchRun)?;

        let live_version = match state.runs.get(&base.key) {
            Some(live) => live.resource_version,
            None => return Err(StoreError::NotFound(base.key.to_string())),
        };
        if live_version != base.resource_version {
            return Err(StoreError::Conflict(format!(
                "{} is at version {}, patch based on {}",
                base.key, live_version, base.resource_version
            )));
        }

        let version = if patch.is_empty() {
            live_version
        } else {
            state.next_version()
        };
        let live = state
            .runs
            .get_mut(&base.key)
            .ok_or_else(|| StoreError::NotFound(base.key.to_string()))?;
        patch.apply(&mut live.annotations);
        live.resource_version = version;
        Ok(live.clone())
    }

    async fn get_observation(
        &self,
        namespace: &str,
    ) -> Result<Option<ObservationSingleton>, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::GetObservation {
            namespace: namespace.to_string(),
        });
        state.take_fault(StoreOp::GetObservation)?;
        Ok(state.observations.get(namespace).cloned())
    }

    async fn create_observation(
        &self,
        observation: &ObservationSingleton,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::CreateObservation {
            namespace: observation.namespace.clone(),
        });
        state.take_fault(StoreOp::CreateObservation)?;

        if state.observations.contains_key(&observation.namespace) {
            return Err(StoreError::AlreadyExists(observation.key().to_string()));
        }
        state
            .observations
            .insert(observation.namespace.clone(), observation.clone());
        Ok(())
    }

    async fn create_event(&self, event: &AuditEvent) -> Result<String, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::CreateEvent {
            generate_name: event.generate_name.clone(),
        });
        state.take_fault(StoreOp::CreateEvent)?;

        state.event_seq += 1;
        let name = format!("{}{:05x}", event.generate_name, state.event_seq);
        state.events.push((name.clone(), event.clone()));
        Ok(name)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
