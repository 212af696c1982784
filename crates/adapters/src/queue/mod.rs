// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Downstream work queue adapters
//!
//! Enqueueing is fire-and-forget. The queue is expected to coalesce
//! duplicate items; the completion controller never relies on that for
//! correctness of the claim.

mod channel;

pub use channel::ChannelQueue;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeQueue;

use async_trait::async_trait;
use thiserror::Error;
use tko_core::WorkItem;

/// Errors from queue operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue closed")]
    Closed,
    #[error("enqueue rejected: {0}")]
    Rejected(String),
}

/// Adapter for the queue feeding the notification reconciler
#[async_trait]
pub trait WorkQueue: Clone + Send + Sync + 'static {
    /// Enqueue a reconcile request
    async fn enqueue(&self, item: WorkItem) -> Result<(), QueueError>;
}
