// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch trigger: make sure the namespace singleton exists, then enqueue

use crate::emitter::AuditEmitter;
use tko_adapters::{MetricsSink, ObjectStore, QueueError, WorkQueue};
use tko_core::{Clock, Level, ObjectReference, ObservationSingleton, WorkItem};

/// Audit reason for a singleton that could not be created
pub const CREATE_OBSERVATION_REASON: &str = "CreateTektonObservation";

#[derive(Clone)]
pub struct DispatchTrigger<S, Q, C, M> {
    store: S,
    queue: Q,
    emitter: AuditEmitter<S, C>,
    metrics: M,
}

impl<S, Q, C, M> DispatchTrigger<S, Q, C, M>
where
    S: ObjectStore,
    Q: WorkQueue,
    C: Clock,
    M: MetricsSink,
{
    pub fn new(store: S, queue: Q, emitter: AuditEmitter<S, C>, metrics: M) -> Self {
        Self {
            store,
            queue,
            emitter,
            metrics,
        }
    }

    /// Enqueue `item`, creating its singleton first if needed
    ///
    /// Singleton problems are reported against `subject` and do not stop the
    /// enqueue; the address is the same whether or not the singleton exists.
    pub async fn trigger(&self, item: WorkItem, subject: &ObjectReference) -> Result<(), QueueError> {
        self.ensure_singleton(&item.namespace, subject).await;
        self.queue.enqueue(item).await?;
        self.metrics.record_dispatch();
        Ok(())
    }

    async fn ensure_singleton(&self, namespace: &str, subject: &ObjectReference) {
        match self.store.get_observation(namespace).await {
            Ok(Some(_)) => return,
            Ok(None) => {}
            // Fall through to create; it reports if the store really is down
            Err(e) => tracing::debug!(namespace, error = %e, "singleton lookup failed"),
        }

        let singleton = ObservationSingleton::new(namespace);
        match self.store.create_observation(&singleton).await {
            Ok(()) => tracing::info!(namespace, "created observation singleton"),
            Err(e) if e.is_already_exists() => {
                tracing::debug!(namespace, "singleton created concurrently")
            }
            Err(e) => {
                let message = "Failed to create TektonObservation CR";
                tracing::error!(namespace, error = %e, "{}", message);
                self.emitter
                    .emit(
                        subject.clone(),
                        Level::Error,
                        CREATE_OBSERVATION_REASON,
                        &format!("{}. {}", message, e),
                    )
                    .await;
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
