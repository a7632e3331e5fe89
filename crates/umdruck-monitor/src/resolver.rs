// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Target resolver — maps a port identifier onto a target queue name.
//
// Port identifiers come from the provisioning tooling in one of two forms:
//
//   PP:\<QueueName>     redirect-style port, prefix stripped
//   <QueueName>         bare queue name, taken as-is
//
// The fallback is deliberate: an identifier without the prefix is treated
// as the queue name directly, never rejected.

use tracing::debug;

use umdruck_core::error::{Result, UmdruckError};
use umdruck_core::types::TargetName;

/// Literal prefix marking a redirect-style port identifier.
pub const PORT_PREFIX: &str = "PP:\\";

/// Resolve a port identifier into the target queue name.
///
/// Fails on an empty identifier, or when the resolved name would not fit
/// the bounded queue-name buffer (oversized names are rejected, never
/// truncated).
pub fn resolve_target(identifier: &str) -> Result<TargetName> {
    if identifier.is_empty() {
        return Err(UmdruckError::InvalidArgument("empty port identifier".into()));
    }

    let name = identifier.strip_prefix(PORT_PREFIX).unwrap_or(identifier);
    let target = TargetName::new(name)?;
    debug!(identifier, target = %target, "resolved port identifier");
    Ok(target)
}
