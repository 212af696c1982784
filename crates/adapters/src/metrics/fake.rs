// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake metrics sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CallOutcome, MetricsSink};
use crate::store::StoreOp;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tko_core::Decision;

/// Recorded metrics sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsCall {
    StoreCall { op: StoreOp, outcome: CallOutcome },
    Decision(Decision),
    Claim,
    Dispatch,
}

#[derive(Clone, Default)]
pub struct FakeMetrics {
    calls: Arc<Mutex<Vec<MetricsCall>>>,
}

impl FakeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded samples
    pub fn calls(&self) -> Vec<MetricsCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn decisions(&self) -> Vec<Decision> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MetricsCall::Decision(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &MetricsCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn push(&self, call: MetricsCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl MetricsSink for FakeMetrics {
    fn record_store_call(&self, op: StoreOp, outcome: CallOutcome, _elapsed: Duration) {
        self.push(MetricsCall::StoreCall { op, outcome });
    }

    fn record_decision(&self, decision: Decision) {
        self.push(MetricsCall::Decision(decision));
    }

    fn record_claim(&self) {
        self.push(MetricsCall::Claim);
    }

    fn record_dispatch(&self) {
        self.push(MetricsCall::Dispatch);
    }
}
