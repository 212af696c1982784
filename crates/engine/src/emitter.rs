// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort audit events

use tko_adapters::ObjectStore;
use tko_core::{AuditEvent, Clock, Level, ObjectReference};

/// Writes audit events against runs and singletons
///
/// Emission never fails from the caller's point of view: store errors are
/// logged and dropped.
#[derive(Clone)]
pub struct AuditEmitter<S, C> {
    store: S,
    clock: C,
    reporting_instance: String,
}

impl<S: ObjectStore, C: Clock> AuditEmitter<S, C> {
    pub fn new(store: S, clock: C, reporting_instance: impl Into<String>) -> Self {
        Self {
            store,
            clock,
            reporting_instance: reporting_instance.into(),
        }
    }

    pub async fn emit(&self, subject: ObjectReference, level: Level, reason: &str, message: &str) {
        let event = AuditEvent::new(
            subject,
            level,
            reason,
            message,
            self.reporting_instance.clone(),
            self.clock.now(),
        );

        match self.store.create_event(&event).await {
            Ok(name) => tracing::debug!(name, reason, "audit event recorded"),
            Err(e) => tracing::warn!(
                error = %e,
                reason,
                object = %event.involved_object.name,
                "failed to record audit event"
            ),
        }
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
