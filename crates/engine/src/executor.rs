// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect executor

use crate::dispatch::DispatchTrigger;
use tko_adapters::{MetricsSink, ObjectStore, QueueError, StoreError, WorkQueue};
use tko_core::{Clock, Effect, ProcessingState, UnknownStateError, WatchedRun};
use thiserror::Error;
use tracing::Instrument;

/// Errors that can occur during effect execution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecuteError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("refusing to move processing state from {from} to {to}")]
    Regression {
        from: ProcessingState,
        to: ProcessingState,
    },
    #[error(transparent)]
    UnknownState(#[from] UnknownStateError),
}

impl ExecuteError {
    /// Another writer advanced the run first
    pub fn is_conflict(&self) -> bool {
        matches!(self, ExecuteError::Store(e) if e.is_conflict())
    }
}

/// Executes effects using the configured adapters
#[derive(Clone)]
pub struct Executor<S, Q, C, M> {
    store: S,
    dispatch: DispatchTrigger<S, Q, C, M>,
    metrics: M,
}

impl<S, Q, C, M> Executor<S, Q, C, M>
where
    S: ObjectStore,
    Q: WorkQueue,
    C: Clock,
    M: MetricsSink,
{
    pub fn new(store: S, dispatch: DispatchTrigger<S, Q, C, M>, metrics: M) -> Self {
        Self {
            store,
            dispatch,
            metrics,
        }
    }

    /// Execute a single effect with tracing
    pub async fn execute(&self, effect: Effect) -> Result<(), ExecuteError> {
        use tko_core::TracedEffect;

        let op_name = effect.name();
        let span = tracing::info_span!("effect", effect = op_name);
        span.in_scope(|| tracing::info!(fields = ?effect.fields(), "executing"));

        let start = std::time::Instant::now();
        let result = self.execute_inner(effect).instrument(span.clone()).await;
        let elapsed = start.elapsed();

        span.in_scope(|| match &result {
            Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "completed"),
            Err(e) if e.is_conflict() => tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "lost race"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "failed"
            ),
        });

        result
    }

    /// Execute effects in order, stopping at the first failure
    pub async fn execute_all(&self, effects: Vec<Effect>) -> Result<(), ExecuteError> {
        for effect in effects {
            self.execute(effect).await?;
        }
        Ok(())
    }

    async fn execute_inner(&self, effect: Effect) -> Result<(), ExecuteError> {
        match effect {
            Effect::SetProcessingState { base, state } => {
                self.set_processing_state(&base, state).await?;
                if state == ProcessingState::Started {
                    self.metrics.record_claim();
                }
                Ok(())
            }

            Effect::Dispatch { item, subject } => {
                self.dispatch.trigger(item, &subject).await?;
                Ok(())
            }
        }
    }

    async fn set_processing_state(
        &self,
        base: &WatchedRun,
        state: ProcessingState,
    ) -> Result<WatchedRun, ExecuteError> {
        let from = base.processing_state()?;
        if !from.can_advance_to(state) {
            return Err(ExecuteError::Regression { from, to: state });
        }
        let mutated = base.with_state_written(state);
        Ok(self.store.patch_run(base, &mutated).await?)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
