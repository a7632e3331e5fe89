// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The port monitor -- the operation surface the spooling host binds to.
//
// The host calls synchronously on its own worker threads. Distinct port
// tokens refer to independently-owned state and may be used concurrently;
// operations on one token are serialized by that port's own mutex, since
// the host's exclusive per-token call sequencing is not assumed here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info, warn};

use umdruck_core::config::MonitorConfig;
use umdruck_core::error::{Result, UmdruckError};
use umdruck_core::types::{JobControl, PortDescriptor, PortId, SessionReceipt};

use crate::port::RedirectPort;
use crate::resolver::resolve_target;
use crate::spool::SpoolBackend;

/// Redirecting virtual port monitor.
///
/// Created once per process by the host handshake; the configuration and
/// backend reference are read-only afterwards. Its lifetime is bounded by
/// the host process — there is no teardown beyond dropping it.
pub struct PortMonitor {
    config: MonitorConfig,
    backend: Arc<dyn SpoolBackend>,
    ports: RwLock<HashMap<PortId, Arc<Mutex<RedirectPort>>>>,
}

impl PortMonitor {
    /// One-time host handshake: bind the monitor configuration and the
    /// print-queue subsystem the forwarded bytes will land in.
    pub fn new(config: MonitorConfig, backend: Arc<dyn SpoolBackend>) -> Self {
        info!(monitor = %config.monitor_name, auto_hold = config.auto_hold, "port monitor initialized");
        Self {
            config,
            backend,
            ports: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Create a virtual port from a port identifier.
    ///
    /// The identifier is resolved to a target queue name immediately, but
    /// the queue itself is only validated when a document starts.
    pub fn open_port(&self, identifier: &str) -> Result<PortId> {
        let target = resolve_target(identifier)?;
        let id = PortId::new();
        let port = RedirectPort::new(id, target.clone());

        // A panic on another host thread must not wedge every port.
        self.ports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(port)));

        info!(port = %id, target = %target, "virtual port opened");
        Ok(id)
    }

    /// Destroy a virtual port.
    ///
    /// The host is allowed to close a port mid-document; an active session
    /// is finalized first so the target queue connection never leaks.
    pub fn close_port(&self, id: PortId) -> Result<()> {
        let entry = self
            .ports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or(UmdruckError::UnknownPort(id))?;

        let mut port = entry.lock().unwrap_or_else(PoisonError::into_inner);
        if port.has_session() {
            warn!(port = %id, target = %port.target(), "closing port with active session");
            match port.finish_session() {
                Ok(receipt) => info!(
                    port = %id,
                    job_id = receipt.job_id,
                    bytes = receipt.bytes_forwarded,
                    "session finalized at close"
                ),
                // The session is gone and the connection dropped either way.
                Err(e) => warn!(port = %id, error = %e, "session finalization at close failed"),
            }
        }

        info!(port = %id, "virtual port closed");
        Ok(())
    }

    /// Begin a forwarding session: connect to the target queue, create a
    /// job on it, and bind the session to the port.
    ///
    /// `source_job_id` is the host spooler's own job number, carried for
    /// diagnostics only. Returns the job id assigned by the target queue.
    pub fn start_document(&self, id: PortId, source_job_id: u32) -> Result<u32> {
        let port = self.port(id)?;
        let mut port = port.lock().unwrap_or_else(PoisonError::into_inner);
        let job_id = port.start_session(self.backend.as_ref(), &self.config)?;
        info!(port = %id, source_job_id, job_id, target = %port.target(), "document redirected");
        Ok(job_id)
    }

    /// Forward bytes into the port's active session.
    ///
    /// Returns the count the target queue accepted, which may be short;
    /// the host retries the remainder. Write order is preserved.
    pub fn write_port(&self, id: PortId, buf: &[u8]) -> Result<usize> {
        let port = self.port(id)?;
        let mut port = port.lock().unwrap_or_else(PoisonError::into_inner);
        port.forward(buf)
    }

    /// Finalize the port's active session and hand the job to the target
    /// queue for normal processing.
    pub fn end_document(&self, id: PortId) -> Result<SessionReceipt> {
        let port = self.port(id)?;
        let mut port = port.lock().unwrap_or_else(PoisonError::into_inner);
        let receipt = port.finish_session()?;
        info!(
            port = %id,
            job_id = receipt.job_id,
            bytes = receipt.bytes_forwarded,
            hash = %receipt.document_hash,
            "document handed to target queue"
        );
        Ok(receipt)
    }

    /// Apply a control verb (pause/resume/cancel) to the job behind the
    /// port's active session on the target queue.
    pub fn control_job(&self, id: PortId, verb: JobControl) -> Result<()> {
        let port = self.port(id)?;
        let mut port = port.lock().unwrap_or_else(PoisonError::into_inner);
        port.control(verb)
    }

    /// List dynamically-discoverable ports.
    ///
    /// Always succeeds with zero entries, at any detail level: Umdruck
    /// ports are provisioned out-of-band by the installer tooling.
    pub fn enum_ports(&self, level: u32) -> Result<Vec<PortDescriptor>> {
        debug!(level, "port enumeration requested");
        Ok(Vec::new())
    }

    fn port(&self, id: PortId) -> Result<Arc<Mutex<RedirectPort>>> {
        self.ports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(UmdruckError::UnknownPort(id))
    }
}
