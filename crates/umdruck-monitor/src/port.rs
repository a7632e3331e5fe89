// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-port state and the document session state machine.
//
// A `RedirectPort` moves between exactly two states: no session, and one
// active session. The session owns the live queue connection and the job
// id together, so there is never a half-bound session, and dropping the
// session releases the connection on every path.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use umdruck_core::config::MonitorConfig;
use umdruck_core::error::{Result, UmdruckError};
use umdruck_core::types::{JobControl, PortId, SessionReceipt, TargetName};

use crate::spool::{DocumentInfo, QueueConnection, SpoolBackend};

/// One open virtual port.
pub(crate) struct RedirectPort {
    id: PortId,
    /// Resolved at open time, immutable for the life of the port.
    target: TargetName,
    session: Option<DocumentSession>,
}

/// A forwarding session: one document bracketed by start/end, mapping to
/// one job on the target queue.
struct DocumentSession {
    connection: Box<dyn QueueConnection>,
    job_id: u32,
    bytes_forwarded: u64,
    /// Running hash over the accepted bytes only.
    digest: Sha256,
    started_at: DateTime<Utc>,
}

impl RedirectPort {
    pub(crate) fn new(id: PortId, target: TargetName) -> Self {
        Self {
            id,
            target,
            session: None,
        }
    }

    pub(crate) fn target(&self) -> &TargetName {
        &self.target
    }

    pub(crate) fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Open a connection to the target queue, create a job on it, and bind
    /// the session to this port.
    ///
    /// Starting while a session is already active is an error and leaves
    /// the live session untouched. Any failure after the connection is
    /// opened drops it before the error surfaces — no partial state.
    pub(crate) fn start_session(
        &mut self,
        backend: &dyn SpoolBackend,
        config: &MonitorConfig,
    ) -> Result<u32> {
        if self.session.is_some() {
            return Err(UmdruckError::SessionActive(self.id));
        }

        let mut connection = backend.open_queue(&self.target)?;
        let doc = DocumentInfo {
            name: config.document_name.clone(),
            datatype: config.datatype.clone(),
        };
        // An early return drops `connection`, releasing it.
        let job_id = connection.start_document(&doc)?;

        if config.auto_hold {
            // Best-effort: a transport without job control still forwards.
            if let Err(e) = connection.control_job(job_id, JobControl::Pause) {
                warn!(port = %self.id, job_id, error = %e, "auto-hold pause failed");
            }
        }

        if let Err(e) = connection.start_page() {
            // Don't leave a half-created job behind on the queue.
            let _ = connection.end_document();
            return Err(e);
        }

        debug!(port = %self.id, target = %self.target, job_id, "document session started");
        self.session = Some(DocumentSession {
            connection,
            job_id,
            bytes_forwarded: 0,
            digest: Sha256::new(),
            started_at: Utc::now(),
        });
        Ok(job_id)
    }

    /// Forward a buffer into the active session, unmodified and in order.
    ///
    /// Returns the number of bytes the target queue accepted; the caller
    /// owns retrying the remainder. Accounting covers accepted bytes only.
    pub(crate) fn forward(&mut self, buf: &[u8]) -> Result<usize> {
        let session = self
            .session
            .as_mut()
            .ok_or(UmdruckError::NoActiveSession(self.id))?;

        let accepted = session.connection.write(buf)?;
        session.digest.update(&buf[..accepted]);
        session.bytes_forwarded += accepted as u64;
        debug!(
            port = %self.id,
            offered = buf.len(),
            accepted,
            total = session.bytes_forwarded,
            "bytes forwarded"
        );
        Ok(accepted)
    }

    /// End the page and the job, release the connection, and return the
    /// session accounting. This is the point where the job is handed to
    /// the target queue for normal processing.
    pub(crate) fn finish_session(&mut self) -> Result<SessionReceipt> {
        let DocumentSession {
            mut connection,
            job_id,
            bytes_forwarded,
            digest,
            started_at,
        } = self
            .session
            .take()
            .ok_or(UmdruckError::NoActiveSession(self.id))?;

        // The session is already cleared; if finalization fails the
        // connection still drops on return, so nothing leaks.
        connection.end_page()?;
        connection.end_document()?;

        debug!(port = %self.id, job_id, bytes = bytes_forwarded, "document session finished");
        Ok(SessionReceipt {
            target: self.target.as_str().to_string(),
            job_id,
            bytes_forwarded,
            document_hash: hex::encode(digest.finalize()),
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Apply a control verb to the active session's job.
    pub(crate) fn control(&mut self, verb: JobControl) -> Result<()> {
        let session = self
            .session
            .as_mut()
            .ok_or(UmdruckError::NoActiveSession(self.id))?;
        session.connection.control_job(session.job_id, verb)?;
        debug!(port = %self.id, job_id = session.job_id, verb = verb.verb(), "job control applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spool::MockSpool;

    fn port_on(queue: &str) -> RedirectPort {
        RedirectPort::new(PortId::new(), TargetName::new(queue).expect("target name"))
    }

    #[test]
    fn session_fields_are_bound_together() {
        let spool = MockSpool::with_queues(&["Q"]);
        let mut port = port_on("Q");
        assert!(!port.has_session());

        port.start_session(&spool, &MonitorConfig::default())
            .expect("start");
        assert!(port.has_session());

        port.finish_session().expect("finish");
        assert!(!port.has_session());
    }

    #[test]
    fn reentrant_start_fails_and_keeps_live_session() {
        let spool = MockSpool::with_queues(&["Q"]);
        let mut port = port_on("Q");
        let job_id = port
            .start_session(&spool, &MonitorConfig::default())
            .expect("start");

        let err = port
            .start_session(&spool, &MonitorConfig::default())
            .expect_err("second start must fail");
        assert!(matches!(err, UmdruckError::SessionActive(_)));

        // The first session still forwards and finalizes normally.
        port.forward(b"data").expect("forward");
        let receipt = port.finish_session().expect("finish");
        assert_eq!(receipt.job_id, job_id);
        assert_eq!(spool.open_connections(), 0);
    }

    #[test]
    fn accounting_covers_accepted_bytes_only() {
        let spool = MockSpool::with_queues(&["Q"]);
        spool.set_accept_limit(2);
        let mut port = port_on("Q");
        port.start_session(&spool, &MonitorConfig::default())
            .expect("start");

        assert_eq!(port.forward(b"abcdef").expect("forward"), 2);
        let receipt = port.finish_session().expect("finish");
        assert_eq!(receipt.bytes_forwarded, 2);

        let expected = hex::encode(Sha256::digest(b"ab"));
        assert_eq!(receipt.document_hash, expected);
    }

    #[test]
    fn failed_job_creation_releases_the_connection() {
        let spool = MockSpool::with_queues(&["Q"]);
        spool.set_fail_job_creation(true);
        let mut port = port_on("Q");

        let err = port
            .start_session(&spool, &MonitorConfig::default())
            .expect_err("job creation must fail");
        assert!(matches!(err, UmdruckError::JobCreation(_)));
        assert!(!port.has_session());
        assert_eq!(spool.open_connections(), 0);
    }
}
