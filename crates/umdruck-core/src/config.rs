// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Monitor configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One-time host handshake record for the port monitor.
///
/// Constructed explicitly by the host (or loaded from its settings file)
/// and handed to the monitor at initialization; read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Monitor name reported to the host spooler.
    pub monitor_name: String,
    /// Document name attached to every forwarded job on the target queue.
    pub document_name: String,
    /// Spool datatype tag for forwarded jobs. The byte stream is passed
    /// through unchanged regardless of this tag.
    pub datatype: String,
    /// Pause each forwarded job on the target queue as soon as it is
    /// created, so it can be inspected and released by hand.
    pub auto_hold: bool,
    /// Connect timeout for network spool backends, in seconds.
    pub connect_timeout_secs: u64,
    /// Per-write timeout for network spool backends, in seconds.
    pub write_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            monitor_name: "Umdruck Port Monitor".into(),
            document_name: "Umdruck Redirect".into(),
            datatype: "RAW".into(),
            auto_hold: false,
            connect_timeout_secs: 10,
            write_timeout_secs: 60,
        }
    }
}

impl MonitorConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}
