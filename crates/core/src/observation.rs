// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-namespace observation singleton and the work items addressed at it

use crate::run::ObjectKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed name of the observation singleton in every namespace
pub const SINGLETON_NAME: &str = "tekton-observer";

/// A pub/sub destination for fan-out notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    #[serde(rename = "pubSubProjectID")]
    pub provider_project_id: String,
    #[serde(rename = "pubSubTopicID")]
    pub channel_id: String,
}

impl NotificationChannel {
    pub fn new(provider_project_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            provider_project_id: provider_project_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

/// Configuration object downstream reconciliation targets
///
/// Channels are kept in insertion order, which is the delivery order.
/// Duplicates are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSingleton {
    pub namespace: String,
    #[serde(default)]
    pub channels: Vec<NotificationChannel>,
}

impl ObservationSingleton {
    /// Empty singleton for `namespace`, as created on first sighting
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            channels: Vec::new(),
        }
    }

    pub fn with_channel(mut self, channel: NotificationChannel) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn name(&self) -> &str {
        SINGLETON_NAME
    }

    pub fn key(&self) -> ObjectKey {
        singleton_key(&self.namespace)
    }
}

/// Store identity of the singleton in `namespace`
pub fn singleton_key(namespace: &str) -> ObjectKey {
    ObjectKey::new(namespace, SINGLETON_NAME)
}

/// Reconcile request handed to the downstream queue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    pub namespace: String,
    pub name: String,
}

impl WorkItem {
    /// Work item for the singleton in `namespace`
    ///
    /// Every run in a namespace maps to the same address, so dispatches
    /// coalesce on one level-triggered target.
    pub fn for_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: SINGLETON_NAME.to_string(),
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
#[path = "observation_tests.rs"]
mod tests;
