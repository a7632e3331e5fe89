// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spool backend abstractions.
//
// The monitor itself never talks to a queue directly; it goes through the
// `SpoolBackend` / `QueueConnection` pair so the same lifecycle logic runs
// against the host's real print-queue subsystem, a network printer, or the
// in-memory mock used by the tests.

pub mod mock;
pub mod raw_tcp;

use umdruck_core::error::Result;
use umdruck_core::types::{JobControl, TargetName};

pub use mock::MockSpool;
pub use raw_tcp::RawTcpSpool;

/// Document metadata handed to the target queue when a job is created.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    /// Name shown in the target queue's job list.
    pub name: String,
    /// Spool datatype tag (e.g. "RAW"). Advisory only — the forwarded
    /// bytes are never reinterpreted.
    pub datatype: String,
}

/// Access to a print-queue subsystem.
pub trait SpoolBackend: Send + Sync {
    /// Open a connection to the named target queue.
    ///
    /// This is the first point at which the queue name is validated against
    /// the real system; an unknown name fails here, not when the port was
    /// opened.
    fn open_queue(&self, target: &TargetName) -> Result<Box<dyn QueueConnection>>;
}

/// An open connection to one target queue.
///
/// Dropping the connection releases it; a connection that is dropped with a
/// document still open abandons that document to the queue's own cleanup.
pub trait QueueConnection: Send + std::fmt::Debug {
    /// Create a new job on the queue. Returns the queue-assigned job id.
    fn start_document(&mut self, doc: &DocumentInfo) -> Result<u32>;

    /// Begin a page within the current job.
    fn start_page(&mut self) -> Result<()>;

    /// Append bytes to the current job. Returns the number of bytes the
    /// queue actually accepted, which may be fewer than offered.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// End the current page.
    fn end_page(&mut self) -> Result<()>;

    /// Finalize the current job and hand it to the queue for processing.
    fn end_document(&mut self) -> Result<()>;

    /// Apply a control verb to a job on this queue.
    fn control_job(&mut self, job_id: u32, verb: JobControl) -> Result<()>;
}
