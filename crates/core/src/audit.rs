// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit events recorded against watched objects
//!
//! Audit events are write-only: this system never reads, updates or deletes
//! them. Names are assigned by the store from [`AuditEvent::generate_name`].

use crate::run::{ObjectKey, WatchedRun, GROUP_NAME, OBSERVER_NAME_ANNOTATION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Controller name stamped on every audit event
pub const REPORTING_CONTROLLER: &str = "kcloutie/tekton-observer";

/// Source component stamped on every audit event
pub const REPORTING_COMPONENT: &str = "Tekton Observer";

const API_VERSION: &str = "v1";
const LABEL_VALUE_MAX: usize = 63;

/// Level the caller reports at; mapped onto an event [`Severity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Warning,
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::Info => Severity::Normal,
            Level::Warn | Level::Error => Severity::Warning,
        }
    }
}

/// Reference to the object an event is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub uid: String,
    pub resource_version: u64,
}

impl ObjectReference {
    pub fn for_run(run: &WatchedRun) -> Self {
        Self {
            uid: run.uid.clone(),
            resource_version: run.resource_version,
            ..Self::for_key(&run.key)
        }
    }

    /// Reference to a run known only by key, e.g. when it could not be read
    pub fn for_key(key: &ObjectKey) -> Self {
        Self {
            api_version: format!("{}/{}", GROUP_NAME, API_VERSION),
            kind: "PipelineRun".to_string(),
            namespace: key.namespace.clone(),
            name: key.name.clone(),
            uid: String::new(),
            resource_version: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Prefix the store extends into a unique name
    pub generate_name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub reason: String,
    pub message: String,
    pub severity: Severity,
    pub involved_object: ObjectReference,
    pub reporting_controller: String,
    pub reporting_instance: String,
    pub component: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        subject: ObjectReference,
        level: Level,
        reason: impl Into<String>,
        message: impl Into<String>,
        reporting_instance: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let reason = reason.into();
        let mut labels = BTreeMap::new();
        labels.insert(
            OBSERVER_NAME_ANNOTATION.to_string(),
            clean_label_value(&subject.name),
        );
        let mut annotations = BTreeMap::new();
        annotations.insert(OBSERVER_NAME_ANNOTATION.to_string(), subject.name.clone());

        Self {
            generate_name: format!("{}-", subject.name),
            namespace: subject.namespace.clone(),
            labels,
            annotations,
            reason,
            message: message.into(),
            severity: level.into(),
            involved_object: subject,
            reporting_controller: REPORTING_CONTROLLER.to_string(),
            reporting_instance: reporting_instance.into(),
            component: REPORTING_COMPONENT.to_string(),
            timestamp,
        }
    }
}

/// Coerce `value` into a valid Kubernetes label value
///
/// At most 63 characters from `[A-Za-z0-9_.-]`, starting and ending with an
/// alphanumeric. Invalid characters become `-`.
pub fn clean_label_value(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .take(LABEL_VALUE_MAX)
        .collect();

    replaced
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
