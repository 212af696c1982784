// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metrics sinks
//!
//! Components receive a [`MetricsSink`] at construction instead of writing to
//! a process-wide registry. Recording is a side channel: it returns nothing
//! and cannot fail.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `tknobs_kubernetes_request_duration_seconds` | Histogram | `op`, `success` |
//! | `tknobs_decisions_total` | Counter | `decision` |
//! | `tknobs_started_processing_pipeline_runs_total` | Counter | - |
//! | `tknobs_dispatches_total` | Counter | - |

mod facade;

pub use facade::{labels, names, FacadeMetrics};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMetrics, MetricsCall};

use crate::store::StoreOp;
use std::time::Duration;
use tko_core::Decision;

/// Coarse result of a store call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
}

impl CallOutcome {
    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => CallOutcome::Success,
            Err(_) => CallOutcome::Failure,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            CallOutcome::Success => "true",
            CallOutcome::Failure => "false",
        }
    }
}

/// Sink for controller and store metrics
pub trait MetricsSink: Clone + Send + Sync + 'static {
    fn record_store_call(&self, op: StoreOp, outcome: CallOutcome, elapsed: Duration);

    fn record_decision(&self, decision: Decision);

    /// A run was claimed (`processing-state` set to `started`)
    fn record_claim(&self);

    /// A work item was handed to the downstream queue
    fn record_dispatch(&self);
}

/// Metrics sink that drops everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpMetrics;

impl NoOpMetrics {
    pub fn new() -> Self {
        Self
    }
}

impl MetricsSink for NoOpMetrics {
    fn record_store_call(&self, _op: StoreOp, _outcome: CallOutcome, _elapsed: Duration) {}

    fn record_decision(&self, _decision: Decision) {}

    fn record_claim(&self) {}

    fn record_dispatch(&self) {}
}
