// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Umdruck — Core types, error definitions, and configuration shared across
// the port-monitor crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::MonitorConfig;
pub use error::UmdruckError;
pub use types::*;
