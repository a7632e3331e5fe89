// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Umdruck Monitor — the redirecting virtual printer port.
//
// The monitor presents itself to a print spooling host as an output port,
// but instead of driving hardware it forwards the raw byte stream of each
// document into a second, already-registered print queue.  This crate holds
// the port lifecycle state machine, the per-document forwarding sessions,
// and the spool backends the forwarded bytes land in.

pub mod monitor;
pub mod port;
pub mod resolver;
pub mod spool;

pub use monitor::PortMonitor;
pub use resolver::{PORT_PREFIX, resolve_target};
pub use spool::{DocumentInfo, QueueConnection, SpoolBackend};
