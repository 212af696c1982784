// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects requested by the completion state machine

use crate::audit::ObjectReference;
use crate::observation::WorkItem;
use crate::run::{ProcessingState, WatchedRun};
use crate::traced::TracedEffect;

/// Side effects the executor carries out, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write `state` onto the run with an optimistic patch against `base`
    SetProcessingState {
        base: Box<WatchedRun>,
        state: ProcessingState,
    },
    /// Hand a reconcile request to the downstream queue
    Dispatch {
        item: WorkItem,
        /// Run that caused the dispatch; audit events land on it
        subject: ObjectReference,
    },
}

impl TracedEffect for Effect {
    fn name(&self) -> &'static str {
        match self {
            Effect::SetProcessingState { .. } => "set_processing_state",
            Effect::Dispatch { .. } => "dispatch",
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::SetProcessingState { base, state } => vec![
                ("run", base.key.to_string()),
                ("resource_version", base.resource_version.to_string()),
                ("state", state.to_string()),
            ],
            Effect::Dispatch { item, subject } => vec![
                ("item", item.to_string()),
                ("run", format!("{}/{}", subject.namespace, subject.name)),
            ],
        }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
