// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Completion detection engine for pipeline runs
//!
//! Wires the pure state machine in `tko-core` to the store and queue
//! adapters: one [`CompletionController::handle`] per change notification,
//! driven concurrently by [`Runtime`].

pub mod config;
mod controller;
mod dispatch;
mod emitter;
mod error;
mod executor;
pub mod logging;
mod runtime;

pub use config::{ConfigError, EngineConfig, LogConfig};
pub use controller::{
    CompletionController, ControllerDeps, InstrumentedStore, INVALID_ATTRIBUTES_REASON,
    PROCESS_RUN_REASON,
};
pub use dispatch::{DispatchTrigger, CREATE_OBSERVATION_REASON};
pub use emitter::AuditEmitter;
pub use error::EngineError;
pub use executor::{ExecuteError, Executor};
pub use runtime::{RunStats, Runtime};
