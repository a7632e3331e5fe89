// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Umdruck.

use thiserror::Error;

use crate::types::{MAX_TARGET_NAME_LEN, PortId};

/// Top-level error type for all Umdruck operations.
///
/// Every failure is reported synchronously to the immediate caller; a port
/// that fails an operation stays in its current state and may be retried
/// or closed. A short write is NOT an error — the accepted count is a
/// success value and the host owns the retry.
#[derive(Debug, Error)]
pub enum UmdruckError {
    // -- Argument validation --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("target queue name is {len} bytes, limit is {}", MAX_TARGET_NAME_LEN)]
    TargetTooLong { len: usize },

    // -- Port / session state --
    #[error("no open port for token {0}")]
    UnknownPort(PortId),

    #[error("no active document session on port {0}")]
    NoActiveSession(PortId),

    #[error("document session already active on port {0}")]
    SessionActive(PortId),

    // -- Target queue --
    #[error("target queue unavailable: {0}")]
    TargetUnavailable(String),

    #[error("job creation on target queue failed: {0}")]
    JobCreation(String),

    #[error("job control not supported: {0}")]
    ControlUnsupported(String),

    // -- Transport / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, UmdruckError>;
