// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Umdruck port monitor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, UmdruckError};

/// Maximum length of a resolved target queue name, in bytes.
///
/// The classic spooler contract reserves a 256-character buffer including
/// the terminator; names that would not fit are rejected outright rather
/// than truncated.
pub const MAX_TARGET_NAME_LEN: usize = 255;

/// Opaque token for one open virtual port.
///
/// Returned by `open_port` and passed back unchanged by the host on every
/// subsequent call. The token is the only reference to the port's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of the real, already-registered queue that receives forwarded bytes.
///
/// Bounds-checked on construction and immutable for the life of the port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetName(String);

impl TargetName {
    /// Validate and wrap a queue name.
    ///
    /// Empty names are rejected (the host must always supply one) and names
    /// longer than [`MAX_TARGET_NAME_LEN`] are a hard resolution failure.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(UmdruckError::InvalidArgument(
                "empty target queue name".into(),
            ));
        }
        if name.len() > MAX_TARGET_NAME_LEN {
            return Err(UmdruckError::TargetTooLong { len: name.len() });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TargetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TargetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Control verbs that can be applied to a job on the target queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobControl {
    /// Hold the job so it does not print until released.
    Pause,
    /// Release a held job for normal processing.
    Resume,
    /// Remove the job from the queue.
    Cancel,
}

impl JobControl {
    /// Verb keyword used in trace output.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Cancel => "cancel",
        }
    }
}

/// Accounting record returned when a document session is finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReceipt {
    /// Queue the document was forwarded to.
    pub target: String,
    /// Job identifier assigned by the target queue.
    pub job_id: u32,
    /// Bytes the target queue actually accepted across all writes.
    pub bytes_forwarded: u64,
    /// SHA-256 hash of the accepted byte stream, hex-encoded.
    pub document_hash: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// One entry in a port enumeration response.
///
/// Umdruck never reports dynamically-discoverable ports (provisioning is
/// out-of-band), so enumeration always yields zero of these; the type
/// exists for the exported surface's signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDescriptor {
    pub port_name: String,
    pub monitor_name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_name_accepts_plain_queue_name() {
        let name = TargetName::new("LaserJet1").expect("valid name");
        assert_eq!(name.as_str(), "LaserJet1");
    }

    #[test]
    fn target_name_rejects_empty() {
        let err = TargetName::new("").expect_err("empty must fail");
        assert!(matches!(err, UmdruckError::InvalidArgument(_)));
    }

    #[test]
    fn target_name_boundary_is_inclusive() {
        let max = "q".repeat(MAX_TARGET_NAME_LEN);
        assert!(TargetName::new(max).is_ok());

        let over = "q".repeat(MAX_TARGET_NAME_LEN + 1);
        let err = TargetName::new(over).expect_err("oversized must fail");
        assert!(matches!(
            err,
            UmdruckError::TargetTooLong {
                len
            } if len == MAX_TARGET_NAME_LEN + 1
        ));
    }

    #[test]
    fn port_ids_are_unique() {
        assert_ne!(PortId::new(), PortId::new());
    }
}
