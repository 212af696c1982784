// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion controller
//!
//! One call to [`CompletionController::handle`] per change notification:
//! read the run, decide, carry out the effects. The store's optimistic
//! concurrency is the only serialisation point between concurrent handlers
//! of the same run. A lost claim is re-read and re-decided once, then
//! dropped; the winner has already dispatched.

use crate::config::EngineConfig;
use crate::dispatch::DispatchTrigger;
use crate::emitter::AuditEmitter;
use crate::error::EngineError;
use crate::executor::{ExecuteError, Executor};
use tko_adapters::{
    MeteredStore, MetricsSink, ObjectStore, StoreError, TimeoutStore, TracedStore, WorkQueue,
};
use tko_core::{
    completion_effect, decide, Clock, Decision, Level, ObjectKey, ObjectReference, RunSummary,
    Transition, WatchedRun,
};
use tracing::Instrument;

/// Audit reason for failures while processing a run
pub const PROCESS_RUN_REASON: &str = "ProcessRun";

/// Audit reason for an unreadable attributes annotation
pub const INVALID_ATTRIBUTES_REASON: &str = "InvalidAttributes";

/// Re-reads allowed after a lost optimistic write
const MAX_REEVALUATIONS: usize = 1;

/// Store stack used in production: deadline, then metrics, then tracing
pub type InstrumentedStore<S, M> = TracedStore<MeteredStore<TimeoutStore<S>, M>>;

/// Controller adapter dependencies
pub struct ControllerDeps<S, Q, C, M> {
    pub store: S,
    pub queue: Q,
    pub clock: C,
    pub metrics: M,
}

#[derive(Clone)]
pub struct CompletionController<S, Q, C, M> {
    store: S,
    executor: Executor<S, Q, C, M>,
    emitter: AuditEmitter<S, C>,
    metrics: M,
    cluster_name: String,
}

impl<S, Q, C, M> CompletionController<InstrumentedStore<S, M>, Q, C, M>
where
    S: ObjectStore,
    Q: WorkQueue,
    C: Clock,
    M: MetricsSink,
{
    /// Build a controller with the configured store deadline and audit identity
    pub fn from_config(deps: ControllerDeps<S, Q, C, M>, config: &EngineConfig) -> Self {
        let store = TracedStore::new(MeteredStore::new(
            TimeoutStore::new(deps.store, config.store_timeout),
            deps.metrics.clone(),
        ));
        CompletionController::new(
            ControllerDeps {
                store,
                queue: deps.queue,
                clock: deps.clock,
                metrics: deps.metrics,
            },
            &config.reporting_instance,
            &config.cluster_name,
        )
    }
}

impl<S, Q, C, M> CompletionController<S, Q, C, M>
where
    S: ObjectStore,
    Q: WorkQueue,
    C: Clock,
    M: MetricsSink,
{
    pub fn new(
        deps: ControllerDeps<S, Q, C, M>,
        reporting_instance: &str,
        cluster_name: &str,
    ) -> Self {
        let emitter = AuditEmitter::new(deps.store.clone(), deps.clock, reporting_instance);
        let dispatch = DispatchTrigger::new(
            deps.store.clone(),
            deps.queue,
            emitter.clone(),
            deps.metrics.clone(),
        );
        Self {
            executor: Executor::new(deps.store.clone(), dispatch, deps.metrics.clone()),
            store: deps.store,
            emitter,
            metrics: deps.metrics,
            cluster_name: cluster_name.to_string(),
        }
    }

    /// Process one change notification for `key`
    ///
    /// Returns `Dispatch` when a work item was enqueued (including a fresh
    /// claim) and `NoOp` otherwise. Errors leave the run unclaimed or
    /// claimed-and-undispatched; either way redelivery retries.
    pub async fn handle(&self, key: &ObjectKey) -> Result<Decision, EngineError> {
        let span = tracing::info_span!(
            "handle",
            namespace = %key.namespace,
            run = %key.name,
            uid = tracing::field::Empty,
            cluster = %self.cluster_name,
        );
        self.handle_inner(key).instrument(span).await
    }

    async fn handle_inner(&self, key: &ObjectKey) -> Result<Decision, EngineError> {
        let Some(mut run) = self.read(key).await? else {
            // Deletion wins over any pending notification
            tracing::debug!("run not found, likely deleted");
            return Ok(self.finish(Decision::NoOp));
        };
        tracing::Span::current().record("uid", run.uid.as_str());

        for attempt in 0..=MAX_REEVALUATIONS {
            let transition = match decide(&run) {
                Ok(transition) => transition,
                Err(e) => {
                    tracing::warn!(error = %e, "leaving run with foreign processing state alone");
                    return Ok(self.finish(Decision::NoOp));
                }
            };
            tracing::debug!(
                from = %transition.from,
                to = %transition.to,
                decision = %transition.decision,
                done = run.is_done(),
                "decided"
            );
            if transition.decision == Decision::NoOp {
                return Ok(self.finish(Decision::NoOp));
            }

            match self.apply(&run, transition).await {
                Ok(()) => {
                    self.metrics.record_decision(transition.decision);
                    return Ok(Decision::Dispatch);
                }
                Err(e) if e.is_conflict() && attempt < MAX_REEVALUATIONS => {
                    tracing::info!("claim lost to a concurrent writer, re-reading");
                    match self.read(key).await? {
                        Some(fresh) => run = fresh,
                        None => return Ok(self.finish(Decision::NoOp)),
                    }
                }
                Err(e) if e.is_conflict() => {
                    tracing::info!("claim lost again, dropping notification");
                    return Ok(self.finish(Decision::NoOp));
                }
                Err(ExecuteError::Store(StoreError::NotFound(_))) => {
                    tracing::debug!("run deleted while processing");
                    return Ok(self.finish(Decision::NoOp));
                }
                Err(e) => {
                    let message = match &e {
                        // The claim landed; redelivery only dispatches once the run is done
                        ExecuteError::Queue(_) if transition.writes_state() => {
                            format!("PipelineRun claimed but not dispatched: {}", e)
                        }
                        _ => format!("Failed to process PipelineRun: {}", e),
                    };
                    self.emitter
                        .emit(
                            ObjectReference::for_run(&run),
                            Level::Error,
                            PROCESS_RUN_REASON,
                            &message,
                        )
                        .await;
                    return Err(e.into());
                }
            }
        }

        Ok(self.finish(Decision::NoOp))
    }

    /// Read `key`, auditing a failed read against the key alone
    async fn read(&self, key: &ObjectKey) -> Result<Option<WatchedRun>, EngineError> {
        match self.store.get_run(key).await {
            Ok(run) => Ok(run),
            Err(e) => {
                self.emitter
                    .emit(
                        ObjectReference::for_key(key),
                        Level::Error,
                        PROCESS_RUN_REASON,
                        &format!("Failed to read PipelineRun: {}", e),
                    )
                    .await;
                Err(e.into())
            }
        }
    }

    async fn apply(&self, run: &WatchedRun, transition: Transition) -> Result<(), ExecuteError> {
        self.executor.execute_all(transition.effects(run)).await?;
        if run.is_done() {
            self.report_finished(run).await;
        }
        Ok(())
    }

    /// Log what a finished run looked like and flag unreadable attributes
    async fn report_finished(&self, run: &WatchedRun) {
        let (summary, warnings) = RunSummary::from_run(run);
        tracing::info!(
            pipeline = %summary.pipeline_name,
            total_time = %summary.total_time,
            variables = summary.variables.len(),
            "run finished"
        );
        for warning in warnings {
            let message = warning.message();
            tracing::warn!("{}", message);
            self.emitter
                .emit(
                    ObjectReference::for_run(run),
                    Level::Warn,
                    INVALID_ATTRIBUTES_REASON,
                    &message,
                )
                .await;
        }
    }

    fn finish(&self, decision: Decision) -> Decision {
        self.metrics.record_decision(decision);
        decision
    }

    /// Record that downstream processing of `key` has finished
    ///
    /// Forward-only: a run already `complete` or no longer present is left
    /// alone and `false` is returned. One lost race is retried from a fresh
    /// read.
    pub async fn mark_complete(&self, key: &ObjectKey) -> Result<bool, EngineError> {
        let span = tracing::info_span!(
            "mark_complete",
            namespace = %key.namespace,
            run = %key.name,
        );
        self.mark_complete_inner(key).instrument(span).await
    }

    async fn mark_complete_inner(&self, key: &ObjectKey) -> Result<bool, EngineError> {
        for attempt in 0..=MAX_REEVALUATIONS {
            let Some(run) = self.store.get_run(key).await? else {
                return Ok(false);
            };
            let Some(effect) = completion_effect(&run).map_err(ExecuteError::from)? else {
                tracing::debug!("already complete");
                return Ok(false);
            };

            match self.executor.execute(effect).await {
                Ok(()) => return Ok(true),
                Err(e) if e.is_conflict() && attempt < MAX_REEVALUATIONS => {
                    tracing::info!("completion raced a concurrent writer, re-reading");
                }
                Err(e) if e.is_conflict() => {
                    tracing::info!("completion lost again, leaving it to the other writer");
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
