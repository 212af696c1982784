// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process queue backed by a tokio channel

use super::{QueueError, WorkQueue};
use async_trait::async_trait;
use tko_core::WorkItem;
use tokio::sync::mpsc;

/// Work queue handing items to an in-process reconciler
#[derive(Clone, Debug)]
pub struct ChannelQueue {
    tx: mpsc::UnboundedSender<WorkItem>,
}

impl ChannelQueue {
    /// Create a queue and the receiver the reconciler drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WorkItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl WorkQueue for ChannelQueue {
    async fn enqueue(&self, item: WorkItem) -> Result<(), QueueError> {
        self.tx.send(item).map_err(|_| QueueError::Closed)
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
