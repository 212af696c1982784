// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the object store, the downstream queue and metrics

pub mod metered;
pub mod metrics;
pub mod queue;
pub mod store;
pub mod timeout;
pub mod traced;

pub use metered::MeteredStore;
pub use crate::metrics::{CallOutcome, FacadeMetrics, MetricsSink, NoOpMetrics};
pub use queue::{ChannelQueue, QueueError, WorkQueue};
pub use store::{ObjectStore, StoreError, StoreOp};
pub use timeout::TimeoutStore;
pub use traced::{TracedQueue, TracedStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use crate::metrics::{FakeMetrics, MetricsCall};
#[cfg(any(test, feature = "test-support"))]
pub use queue::FakeQueue;
#[cfg(any(test, feature = "test-support"))]
pub use store::{FakeStore, StoreCall};
