// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion detection state machine
//!
//! Decides, for one observation of a run, whether downstream reconciliation
//! should fire. The decision depends only on the run's processing state and
//! whether it is done:
//!
//! | state    | done  | next     | decision      |
//! |----------|-------|----------|---------------|
//! | absent   | any   | started  | `MarkStarted` |
//! | started  | false | started  | `NoOp`        |
//! | started  | true  | started  | `Dispatch`    |
//! | complete | any   | complete | `NoOp`        |
//!
//! `MarkStarted` claims the run before dispatching. The claim is written with
//! an optimistic patch, so of two observers racing on the same fresh run only
//! one lands it; the loser re-reads, sees `started` and stands down.
//! `complete` is only ever written by the downstream consumer.

use crate::audit::ObjectReference;
use crate::effect::Effect;
use crate::observation::WorkItem;
use crate::run::{ProcessingState, UnknownStateError, WatchedRun};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Nothing to do for this observation
    NoOp,
    /// Claim the run by writing `started`, then dispatch
    MarkStarted,
    /// Dispatch without touching the annotation
    Dispatch,
}

impl Decision {
    /// Whether this decision ends in a work item being handed off
    pub fn dispatches(&self) -> bool {
        matches!(self, Decision::MarkStarted | Decision::Dispatch)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::NoOp => "noop",
            Decision::MarkStarted => "mark_started",
            Decision::Dispatch => "dispatch",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ProcessingState,
    pub to: ProcessingState,
    pub decision: Decision,
}

impl Transition {
    /// The total mapping `(state, done) -> (next state, decision)`
    pub fn of(state: ProcessingState, done: bool) -> Self {
        let (to, decision) = match (state, done) {
            (ProcessingState::Absent, _) => (ProcessingState::Started, Decision::MarkStarted),
            (ProcessingState::Started, false) => (ProcessingState::Started, Decision::NoOp),
            (ProcessingState::Started, true) => (ProcessingState::Started, Decision::Dispatch),
            (ProcessingState::Complete, _) => (ProcessingState::Complete, Decision::NoOp),
        };
        Self {
            from: state,
            to,
            decision,
        }
    }

    /// Whether the transition writes a new annotation value
    pub fn writes_state(&self) -> bool {
        self.from != self.to
    }

    /// Effects realising this transition for `run`, in execution order
    ///
    /// The state write always precedes the dispatch so that a failed claim
    /// never hands off work.
    pub fn effects(&self, run: &WatchedRun) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.writes_state() {
            effects.push(Effect::SetProcessingState {
                base: Box::new(run.clone()),
                state: self.to,
            });
        }
        if self.decision.dispatches() {
            effects.push(dispatch_effect(run));
        }
        effects
    }
}

/// Evaluate one observation of `run`
///
/// Fails only when the annotation holds a value this system never writes;
/// callers treat that as `NoOp` rather than overwrite someone else's data.
pub fn decide(run: &WatchedRun) -> Result<Transition, UnknownStateError> {
    let state = run.processing_state()?;
    Ok(Transition::of(state, run.is_done()))
}

/// Effect recording that downstream processing of `run` has finished
///
/// `None` when the run is already complete.
pub fn completion_effect(run: &WatchedRun) -> Result<Option<Effect>, UnknownStateError> {
    let state = run.processing_state()?;
    if !state.can_advance_to(ProcessingState::Complete) {
        return Ok(None);
    }
    Ok(Some(Effect::SetProcessingState {
        base: Box::new(run.clone()),
        state: ProcessingState::Complete,
    }))
}

fn dispatch_effect(run: &WatchedRun) -> Effect {
    Effect::Dispatch {
        item: WorkItem::for_namespace(run.namespace()),
        subject: ObjectReference::for_run(run),
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
