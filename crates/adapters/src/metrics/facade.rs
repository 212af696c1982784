// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sink writing through the `metrics` crate facade
//!
//! Whatever recorder the host process installs (Prometheus exporter, statsd,
//! ...) receives the samples. Without a recorder they are discarded.

use super::{CallOutcome, MetricsSink};
use crate::store::StoreOp;
use ::metrics::{counter, histogram};
use std::time::Duration;
use tko_core::Decision;

/// Metric names
pub mod names {
    /// Histogram: store request latency in seconds
    pub const STORE_REQUEST_DURATION_SECONDS: &str = "tknobs_kubernetes_request_duration_seconds";
    /// Counter: decisions taken per notification
    pub const DECISIONS_TOTAL: &str = "tknobs_decisions_total";
    /// Counter: runs claimed for processing
    pub const STARTED_PROCESSING_TOTAL: &str = "tknobs_started_processing_pipeline_runs_total";
    /// Counter: work items enqueued
    pub const DISPATCHES_TOTAL: &str = "tknobs_dispatches_total";
}

/// Label keys
pub mod labels {
    pub const OP: &str = "op";
    pub const SUCCESS: &str = "success";
    pub const DECISION: &str = "decision";
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FacadeMetrics;

impl FacadeMetrics {
    pub fn new() -> Self {
        Self
    }
}

impl MetricsSink for FacadeMetrics {
    fn record_store_call(&self, op: StoreOp, outcome: CallOutcome, elapsed: Duration) {
        histogram!(
            names::STORE_REQUEST_DURATION_SECONDS,
            labels::OP => op.as_str(),
            labels::SUCCESS => outcome.as_label(),
        )
        .record(elapsed.as_secs_f64());
    }

    fn record_decision(&self, decision: Decision) {
        counter!(names::DECISIONS_TOTAL, labels::DECISION => decision.as_str()).increment(1);
    }

    fn record_claim(&self) {
        counter!(names::STARTED_PROCESSING_TOTAL).increment(1);
    }

    fn record_dispatch(&self) {
        counter!(names::DISPATCHES_TOTAL).increment(1);
    }
}

#[cfg(test)]
#[path = "facade_tests.rs"]
mod tests;
