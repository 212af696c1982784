// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tko-core: pure types and the completion state machine
//!
//! This crate provides:
//! - The watched run model and its processing state annotation
//! - The completion detection state machine and the effects it requests
//! - The observation singleton, work items, and audit events
//! - Run summaries for notification payloads

pub mod audit;
pub mod clock;
pub mod completion;
pub mod effect;
pub mod observation;
pub mod patch;
pub mod run;
pub mod summary;
pub mod traced;

pub use audit::{AuditEvent, Level, ObjectReference, Severity};
pub use clock::{Clock, FakeClock, SystemClock};
pub use completion::{completion_effect, decide, Decision, Transition};
pub use effect::Effect;
pub use observation::{NotificationChannel, ObservationSingleton, WorkItem, SINGLETON_NAME};
pub use patch::AnnotationPatch;
pub use run::{ObjectKey, ProcessingState, UnknownStateError, WatchedRun};
pub use summary::{RunSummary, SummaryWarning};
pub use traced::TracedEffect;
