// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory spool backend for tests and host integration harnesses.
//
// Captures every job a forwarding session produces so tests can assert on
// byte content, page bracketing, control verbs, and connection leaks
// without a real queue subsystem.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use umdruck_core::error::{Result, UmdruckError};
use umdruck_core::types::{JobControl, TargetName};

use super::{DocumentInfo, QueueConnection, SpoolBackend};

/// Everything the mock remembers about one job.
#[derive(Debug, Clone)]
pub struct MockJob {
    pub queue: String,
    pub id: u32,
    pub document_name: String,
    pub datatype: String,
    /// Bytes the queue accepted, in arrival order.
    pub data: Vec<u8>,
    pub pages_started: u32,
    pub pages_ended: u32,
    /// Set once `end_document` ran — the job was handed over for processing.
    pub finalized: bool,
    /// Control verbs applied to this job, in order.
    pub controls: Vec<JobControl>,
}

#[derive(Debug, Default)]
struct MockState {
    known_queues: HashSet<String>,
    /// Cap on bytes accepted per write; `None` accepts everything.
    accept_limit: Option<usize>,
    /// Count accepted bytes without storing them (benchmark mode).
    discard_data: bool,
    fail_job_creation: bool,
    reject_control: bool,
    next_job_id: u32,
    jobs: Vec<MockJob>,
    open_connections: usize,
}

/// In-memory `SpoolBackend`.
///
/// Clones share state, so a test can keep one handle for inspection while
/// the monitor owns another.
#[derive(Clone, Default)]
pub struct MockSpool {
    state: Arc<Mutex<MockState>>,
}

impl MockSpool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock with the given queue names registered.
    pub fn with_queues(names: &[&str]) -> Self {
        let spool = Self::new();
        {
            let mut state = spool.state.lock().expect("lock poisoned");
            state.known_queues = names.iter().map(|n| n.to_string()).collect();
        }
        spool
    }

    /// Accept at most `limit` bytes per write, to exercise partial-write
    /// accounting in callers.
    pub fn set_accept_limit(&self, limit: usize) {
        self.state.lock().expect("lock poisoned").accept_limit = Some(limit);
    }

    /// Accept writes without storing their bytes, so long benchmark runs
    /// don't accumulate memory.
    pub fn set_discard_data(&self, discard: bool) {
        self.state.lock().expect("lock poisoned").discard_data = discard;
    }

    /// Make `start_document` fail on every connection.
    pub fn set_fail_job_creation(&self, fail: bool) {
        self.state.lock().expect("lock poisoned").fail_job_creation = fail;
    }

    /// Make `control_job` report `ControlUnsupported`, like a transport
    /// without job control.
    pub fn set_reject_control(&self, reject: bool) {
        self.state.lock().expect("lock poisoned").reject_control = reject;
    }

    /// Snapshot of all jobs seen so far.
    pub fn jobs(&self) -> Vec<MockJob> {
        self.state.lock().expect("lock poisoned").jobs.clone()
    }

    /// Number of queue connections currently open. Zero after every clean
    /// shutdown path — the leak detector for the lifecycle tests.
    pub fn open_connections(&self) -> usize {
        self.state.lock().expect("lock poisoned").open_connections
    }
}

impl SpoolBackend for MockSpool {
    fn open_queue(&self, target: &TargetName) -> Result<Box<dyn QueueConnection>> {
        let mut state = self.state.lock().expect("lock poisoned");
        if !state.known_queues.contains(target.as_str()) {
            return Err(UmdruckError::TargetUnavailable(format!(
                "no queue named {target}"
            )));
        }
        state.open_connections += 1;
        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
            queue: target.as_str().to_string(),
            job_id: None,
        }))
    }
}

#[derive(Debug)]
struct MockConnection {
    state: Arc<Mutex<MockState>>,
    queue: String,
    job_id: Option<u32>,
}

impl MockConnection {
    fn with_job<T>(&self, f: impl FnOnce(&mut MockJob) -> T) -> Result<T> {
        let job_id = self.job_id.ok_or_else(|| {
            UmdruckError::JobCreation("no job open on this connection".into())
        })?;
        let mut state = self.state.lock().expect("lock poisoned");
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| UmdruckError::JobCreation(format!("job {job_id} vanished")))?;
        Ok(f(job))
    }
}

impl QueueConnection for MockConnection {
    fn start_document(&mut self, doc: &DocumentInfo) -> Result<u32> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.fail_job_creation {
            return Err(UmdruckError::JobCreation(format!(
                "queue {} refused the job",
                self.queue
            )));
        }
        state.next_job_id += 1;
        let id = state.next_job_id;
        state.jobs.push(MockJob {
            queue: self.queue.clone(),
            id,
            document_name: doc.name.clone(),
            datatype: doc.datatype.clone(),
            data: Vec::new(),
            pages_started: 0,
            pages_ended: 0,
            finalized: false,
            controls: Vec::new(),
        });
        self.job_id = Some(id);
        Ok(id)
    }

    fn start_page(&mut self) -> Result<()> {
        self.with_job(|job| job.pages_started += 1)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let (limit, discard) = {
            let state = self.state.lock().expect("lock poisoned");
            (state.accept_limit, state.discard_data)
        };
        let accepted = limit.map_or(buf.len(), |l| buf.len().min(l));
        self.with_job(|job| {
            if !discard {
                job.data.extend_from_slice(&buf[..accepted]);
            }
        })?;
        Ok(accepted)
    }

    fn end_page(&mut self) -> Result<()> {
        self.with_job(|job| job.pages_ended += 1)
    }

    fn end_document(&mut self) -> Result<()> {
        self.with_job(|job| job.finalized = true)?;
        self.job_id = None;
        Ok(())
    }

    fn control_job(&mut self, job_id: u32, verb: JobControl) -> Result<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.reject_control {
            return Err(UmdruckError::ControlUnsupported(format!(
                "queue {} has no job control",
                self.queue
            )));
        }
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| UmdruckError::JobCreation(format!("job {job_id} not found")))?;
        job.controls.push(verb);
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.open_connections -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_queue_is_unavailable() {
        let spool = MockSpool::with_queues(&["Known"]);
        let target = TargetName::new("Unknown").expect("name");
        let err = spool.open_queue(&target).expect_err("must fail");
        assert!(matches!(err, UmdruckError::TargetUnavailable(_)));
        assert_eq!(spool.open_connections(), 0);
    }

    #[test]
    fn connection_count_tracks_drops() {
        let spool = MockSpool::with_queues(&["Q"]);
        let target = TargetName::new("Q").expect("name");
        let conn = spool.open_queue(&target).expect("open");
        assert_eq!(spool.open_connections(), 1);
        drop(conn);
        assert_eq!(spool.open_connections(), 0);
    }

    #[test]
    fn accept_limit_caps_each_write() {
        let spool = MockSpool::with_queues(&["Q"]);
        spool.set_accept_limit(3);
        let target = TargetName::new("Q").expect("name");
        let mut conn = spool.open_queue(&target).expect("open");
        conn.start_document(&DocumentInfo {
            name: "doc".into(),
            datatype: "RAW".into(),
        })
        .expect("start");

        assert_eq!(conn.write(b"abcdef").expect("write"), 3);
        assert_eq!(spool.jobs()[0].data, b"abc");
    }
}
