// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker loop over the change-notification feed

use crate::controller::CompletionController;
use crate::error::EngineError;
use std::sync::Arc;
use tko_adapters::{MetricsSink, ObjectStore, WorkQueue};
use tko_core::{Clock, Decision, ObjectKey};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};

/// Totals for one drained feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed: usize,
    pub dispatched: usize,
    pub failed: usize,
}

impl RunStats {
    fn record(&mut self, joined: Result<(ObjectKey, Result<Decision, EngineError>), JoinError>) {
        match joined {
            Ok((_, Ok(decision))) => {
                self.processed += 1;
                if decision.dispatches() {
                    self.dispatched += 1;
                }
            }
            Ok((key, Err(e))) => {
                self.processed += 1;
                self.failed += 1;
                tracing::warn!(run = %key, error = %e, "notification failed, awaiting redelivery");
            }
            Err(e) => {
                self.failed += 1;
                tracing::error!(error = %e, "notification task aborted");
            }
        }
    }
}

/// Runs the controller for every key on the feed, at most
/// `max_concurrent` at a time
pub struct Runtime<S, Q, C, M> {
    controller: CompletionController<S, Q, C, M>,
    permits: Arc<Semaphore>,
}

impl<S, Q, C, M> Runtime<S, Q, C, M>
where
    S: ObjectStore,
    Q: WorkQueue,
    C: Clock,
    M: MetricsSink,
{
    pub fn new(controller: CompletionController<S, Q, C, M>, max_concurrent: usize) -> Self {
        Self {
            controller,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Drain `feed` until its senders are gone and in-flight work finishes
    pub async fn run(&self, mut feed: mpsc::Receiver<ObjectKey>) -> RunStats {
        let mut tasks = JoinSet::new();
        let mut stats = RunStats::default();

        while let Some(key) = feed.recv().await {
            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                // Never closed while the runtime holds it
                Err(_) => break,
            };
            let controller = self.controller.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = controller.handle(&key).await;
                (key, result)
            });

            while let Some(joined) = tasks.try_join_next() {
                stats.record(joined);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            stats.record(joined);
        }

        tracing::info!(
            processed = stats.processed,
            dispatched = stats.dispatched,
            failed = stats.failed,
            "feed drained"
        );
        stats
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
