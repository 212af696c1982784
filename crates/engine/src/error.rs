// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the completion controller

use crate::ExecuteError;
use tko_adapters::StoreError;
use thiserror::Error;

/// Errors surfaced to whoever delivered the notification
///
/// The run is left as it was; redelivery of the notification is the retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("execute error: {0}")]
    Execute(#[from] ExecuteError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
