// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watched PipelineRun objects and their processing state
//!
//! A [`WatchedRun`] is a snapshot of a PipelineRun as read from the object
//! store. The only part of it this system ever writes is the
//! [`PROCESSING_STATE_ANNOTATION`], which carries a [`ProcessingState`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// API group used for every annotation and label this system owns
pub const GROUP_NAME: &str = "observer.tkn.dev";

/// Annotation holding the run's [`ProcessingState`]
pub const PROCESSING_STATE_ANNOTATION: &str = "observer.tkn.dev/processing-state";

/// Annotation holding user supplied attributes as a JSON object
pub const ATTRIBUTES_ANNOTATION: &str = "observer.tkn.dev/attributes";

/// Annotation and label naming the object an audit event is about
pub const OBSERVER_NAME_ANNOTATION: &str = "observer.tkn.dev/name";

const STARTED: &str = "started";
const COMPLETE: &str = "complete";
// Written on claim by earlier deployments.
const LEGACY_PROCESSING: &str = "processing";

/// Identity of an object in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Processing progress recorded on a run
///
/// Strictly forward-only: `Absent -> Started -> Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProcessingState {
    /// Annotation not set; nobody has claimed the run yet
    Absent,
    /// Claimed; a dispatch has been issued for the run
    Started,
    /// Downstream processing finished; terminal
    Complete,
}

/// The annotation holds a value this system never writes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown processing state: {0:?}")]
pub struct UnknownStateError(pub String);

impl ProcessingState {
    /// Parse the annotation value, `None` meaning the key is missing
    pub fn from_annotation(value: Option<&str>) -> Result<Self, UnknownStateError> {
        match value {
            None => Ok(Self::Absent),
            Some(STARTED) | Some(LEGACY_PROCESSING) => Ok(Self::Started),
            Some(COMPLETE) => Ok(Self::Complete),
            Some(other) => Err(UnknownStateError(other.to_string())),
        }
    }

    /// Annotation value to write, `None` for [`ProcessingState::Absent`]
    pub fn as_annotation(&self) -> Option<&'static str> {
        match self {
            Self::Absent => None,
            Self::Started => Some(STARTED),
            Self::Complete => Some(COMPLETE),
        }
    }

    /// Whether moving to `next` respects the forward-only ordering
    pub fn can_advance_to(&self, next: ProcessingState) -> bool {
        next > *self
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_annotation().unwrap_or("absent"))
    }
}

/// A named parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A parameter declared by the pipeline, with its optional default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default)]
    pub default: Option<String>,
}

/// Reference to the pipeline a run executes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRef {
    #[serde(default)]
    pub name: Option<String>,
    /// Params handed to a remote resolver (git, bundles, hub...)
    #[serde(default)]
    pub resolver_params: Vec<Param>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub pipeline_ref: Option<PipelineRef>,
    /// Pipeline embedded directly in the run instead of referenced
    #[serde(default)]
    pub inline_pipeline: bool,
}

/// Status of the run's `Succeeded` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    #[serde(default)]
    pub succeeded: Option<ConditionStatus>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_time: Option<DateTime<Utc>>,
    /// Params declared by the resolved pipeline
    #[serde(default)]
    pub pipeline_params: Vec<ParamSpec>,
}

/// Snapshot of a PipelineRun read from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedRun {
    pub key: ObjectKey,
    #[serde(default)]
    pub uid: String,
    /// Optimistic concurrency token; patches against a stale version conflict
    #[serde(default)]
    pub resource_version: u64,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub spec: RunSpec,
    #[serde(default)]
    pub status: RunStatus,
}

impl WatchedRun {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: ObjectKey::new(namespace, name),
            uid: String::new(),
            resource_version: 0,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            spec: RunSpec::default(),
            status: RunStatus::default(),
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_processing_state(self, state: ProcessingState) -> Self {
        match state.as_annotation() {
            Some(value) => self.with_annotation(PROCESSING_STATE_ANNOTATION, value),
            None => self,
        }
    }

    /// Mark the `Succeeded` condition as resolved
    pub fn finished(mut self, succeeded: bool) -> Self {
        self.status.succeeded = Some(if succeeded {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        });
        self
    }

    pub fn namespace(&self) -> &str {
        &self.key.namespace
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// The run has finished, successfully or not
    pub fn is_done(&self) -> bool {
        matches!(
            self.status.succeeded,
            Some(ConditionStatus::True) | Some(ConditionStatus::False)
        )
    }

    /// Current processing state read from the annotation bag
    pub fn processing_state(&self) -> Result<ProcessingState, UnknownStateError> {
        ProcessingState::from_annotation(
            self.annotations
                .get(PROCESSING_STATE_ANNOTATION)
                .map(String::as_str),
        )
    }

    /// Copy of this run with the processing state annotation replaced
    pub fn with_state_written(&self, state: ProcessingState) -> WatchedRun {
        let mut updated = self.clone();
        match state.as_annotation() {
            Some(value) => {
                updated
                    .annotations
                    .insert(PROCESSING_STATE_ANNOTATION.to_string(), value.to_string());
            }
            None => {
                updated.annotations.remove(PROCESSING_STATE_ANNOTATION);
            }
        }
        updated
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
