// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake work queue for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{QueueError, WorkQueue};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tko_core::WorkItem;

#[derive(Default)]
struct FakeQueueState {
    items: Vec<WorkItem>,
    faults: VecDeque<QueueError>,
}

/// Fake work queue recording every accepted item
#[derive(Clone, Default)]
pub struct FakeQueue {
    inner: Arc<Mutex<FakeQueueState>>,
}

impl FakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items accepted so far, duplicates included
    pub fn items(&self) -> Vec<WorkItem> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).items.clone()
    }

    /// Fail the next enqueue with `err`
    pub fn fail_next(&self, err: QueueError) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .faults
            .push_back(err);
    }
}

#[async_trait]
impl WorkQueue for FakeQueue {
    async fn enqueue(&self, item: WorkItem) -> Result<(), QueueError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(err) = state.faults.pop_front() {
            return Err(err);
        }
        state.items.push(item);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
