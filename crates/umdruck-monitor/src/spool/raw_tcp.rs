// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw TCP spool backend (JetDirect, port 9100).
//
// The simplest possible target queue: open a TCP socket and dump bytes.
// Target names resolve as `host[:port]`, defaulting to port 9100. There is
// no protocol negotiation and no feedback channel, so job ids are local
// bookkeeping and job control verbs are unsupported on this transport.

use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use umdruck_core::config::MonitorConfig;
use umdruck_core::error::{Result, UmdruckError};
use umdruck_core::types::{JobControl, TargetName};

use super::{DocumentInfo, QueueConnection, SpoolBackend};

/// Default raw TCP print port (HP JetDirect).
pub const RAW_PORT: u16 = 9100;

/// Spool backend that forwards documents to network printers over raw TCP.
pub struct RawTcpSpool {
    connect_timeout: Duration,
    write_timeout: Duration,
    next_job_id: Arc<AtomicU32>,
}

impl RawTcpSpool {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            write_timeout: Duration::from_secs(config.write_timeout_secs),
            next_job_id: Arc::new(AtomicU32::new(1)),
        }
    }

    /// Resolve a `host[:port]` target into socket addresses.
    fn resolve(target: &TargetName) -> Result<Vec<SocketAddr>> {
        let spec = target.as_str();
        let addrs = if spec.contains(':') {
            spec.to_socket_addrs()
        } else {
            (spec, RAW_PORT).to_socket_addrs()
        }
        .map_err(|e| UmdruckError::TargetUnavailable(format!("resolve {spec}: {e}")))?
        .collect::<Vec<_>>();

        if addrs.is_empty() {
            return Err(UmdruckError::TargetUnavailable(format!(
                "{spec} resolved to no addresses"
            )));
        }
        Ok(addrs)
    }
}

impl SpoolBackend for RawTcpSpool {
    fn open_queue(&self, target: &TargetName) -> Result<Box<dyn QueueConnection>> {
        let addrs = Self::resolve(target)?;

        let mut last_err = None;
        for addr in &addrs {
            match TcpStream::connect_timeout(addr, self.connect_timeout) {
                Ok(stream) => {
                    // A zero write timeout is invalid for the socket API and
                    // means "no timeout" in the config.
                    let write_timeout =
                        (self.write_timeout != Duration::ZERO).then_some(self.write_timeout);
                    stream.set_write_timeout(write_timeout)?;

                    info!(target = %target, peer = %addr, "raw TCP queue connected");
                    return Ok(Box::new(RawTcpConnection {
                        stream,
                        peer: *addr,
                        next_job_id: Arc::clone(&self.next_job_id),
                        job_id: 0,
                    }));
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(UmdruckError::TargetUnavailable(format!(
            "connect {target}: {}",
            last_err.map_or_else(|| "no address worked".into(), |e| e.to_string())
        )))
    }
}

#[derive(Debug)]
struct RawTcpConnection {
    stream: TcpStream,
    peer: SocketAddr,
    next_job_id: Arc<AtomicU32>,
    job_id: u32,
}

impl QueueConnection for RawTcpConnection {
    fn start_document(&mut self, doc: &DocumentInfo) -> Result<u32> {
        // The raw stream has no job framing; the id exists so the caller
        // can account for the session.
        self.job_id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            peer = %self.peer,
            job_id = self.job_id,
            doc = %doc.name,
            datatype = %doc.datatype,
            "raw TCP document started"
        );
        Ok(self.job_id)
    }

    fn start_page(&mut self) -> Result<()> {
        // No page framing on a raw stream.
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let accepted = self.stream.write(buf)?;
        debug!(peer = %self.peer, offered = buf.len(), accepted, "raw TCP write");
        Ok(accepted)
    }

    fn end_page(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.stream.flush()?;
        self.stream.shutdown(Shutdown::Write)?;
        info!(peer = %self.peer, job_id = self.job_id, "raw TCP document finished");
        Ok(())
    }

    fn control_job(&mut self, _job_id: u32, verb: JobControl) -> Result<()> {
        Err(UmdruckError::ControlUnsupported(format!(
            "raw TCP transport cannot {} a job",
            verb.verb()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    fn doc() -> DocumentInfo {
        DocumentInfo {
            name: "test".into(),
            datatype: "RAW".into(),
        }
    }

    #[test]
    fn forwards_bytes_verbatim_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = std::thread::spawn(move || {
            let (mut sock, _) = listener.accept().expect("accept");
            let mut received = Vec::new();
            sock.read_to_end(&mut received).expect("read");
            received
        });

        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let spool = RawTcpSpool::new(&MonitorConfig::default());
        let target = TargetName::new(addr.to_string()).expect("target");

        let mut conn = spool.open_queue(&target).expect("connect");
        let job_id = conn.start_document(&doc()).expect("start doc");
        assert!(job_id > 0);
        conn.start_page().expect("start page");

        let mut offset = 0;
        while offset < payload.len() {
            offset += conn.write(&payload[offset..]).expect("write");
        }

        conn.end_page().expect("end page");
        conn.end_document().expect("end doc");
        drop(conn);

        assert_eq!(server.join().expect("server thread"), payload);
    }

    #[test]
    fn refused_connection_is_target_unavailable() {
        // Grab a free port, then close the listener so connects are refused.
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let spool = RawTcpSpool::new(&MonitorConfig::default());
        let target = TargetName::new(addr.to_string()).expect("target");
        let err = spool.open_queue(&target).expect_err("must fail");
        assert!(matches!(err, UmdruckError::TargetUnavailable(_)));
    }

    #[test]
    fn job_control_is_unsupported() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let _server = std::thread::spawn(move || {
            let _ = listener.accept();
        });

        let spool = RawTcpSpool::new(&MonitorConfig::default());
        let target = TargetName::new(addr.to_string()).expect("target");
        let mut conn = spool.open_queue(&target).expect("connect");
        let job_id = conn.start_document(&doc()).expect("start doc");

        let err = conn
            .control_job(job_id, JobControl::Pause)
            .expect_err("no control on raw TCP");
        assert!(matches!(err, UmdruckError::ControlUnsupported(_)));
    }
}
