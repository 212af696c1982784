// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object store adapters
//!
//! The store is the only shared state in the system. Reads are strongly
//! consistent, creates fail on existing identity, and patches are optimistic:
//! a patch computed against a stale base fails with [`StoreError::Conflict`].

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStore, StoreCall};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tko_core::{AuditEvent, ObjectKey, ObservationSingleton, WatchedRun};

/// Errors from store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_))
    }
}

/// Adapter for the object store holding runs, singletons and audit events
#[async_trait]
pub trait ObjectStore: Clone + Send + Sync + 'static {
    /// Read a run; `None` when it does not exist (yet or anymore)
    async fn get_run(&self, key: &ObjectKey) -> Result<Option<WatchedRun>, StoreError>;

    /// Apply the annotation diff of `mutated` against `base`
    ///
    /// Fails with `Conflict` when `base` is stale. Returns the stored run.
    async fn patch_run(
        &self,
        base: &WatchedRun,
        mutated: &WatchedRun,
    ) -> Result<WatchedRun, StoreError>;

    /// Read the observation singleton for a namespace
    async fn get_observation(
        &self,
        namespace: &str,
    ) -> Result<Option<ObservationSingleton>, StoreError>;

    /// Create the observation singleton; `AlreadyExists` if present
    async fn create_observation(
        &self,
        observation: &ObservationSingleton,
    ) -> Result<(), StoreError>;

    /// Create an audit event, returning the name the store assigned
    async fn create_event(&self, event: &AuditEvent) -> Result<String, StoreError>;
}

/// Store operation names, used for spans, metrics and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetRun,
    PatchRun,
    GetObservation,
    CreateObservation,
    CreateEvent,
}

impl StoreOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOp::GetRun => "get_run",
            StoreOp::PatchRun => "patch_run",
            StoreOp::GetObservation => "get_observation",
            StoreOp::CreateObservation => "create_observation",
            StoreOp::CreateEvent => "create_event",
        }
    }
}
