//! Fire-and-forget dispatch for backend sends.
//!
//! Callers hand over a job and return immediately. In background mode a
//! single named thread drains a crossbeam channel; in inline mode the job
//! runs on the caller's thread (tests, dry runs). Either way a failed job
//! is logged and counted, never retried and never reported back.
//!
//! No ordering across jobs is promised to the backend: each parameter
//! message carries the full state, so the latest received one wins.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Sender};
use log::{error, trace, warn};

type Job = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

#[derive(Debug, Default)]
struct Counters {
    pending: AtomicUsize,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    /// A panicking job counts as failed and does not take the worker down.
    fn run(&self, label: &str, job: Job) {
        match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(Ok(())) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Backend send '{}' failed: {:#}", label, e);
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!("Backend send '{}' panicked", label);
            }
        }
    }
}

pub struct Outbox {
    tx: Option<Sender<(String, Job)>>,
    handle: Option<thread::JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl Outbox {
    /// Run jobs on the submitting thread.
    pub fn inline() -> Self {
        Self {
            tx: None,
            handle: None,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Run jobs on a dedicated background thread.
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = unbounded::<(String, Job)>();
        let counters = Arc::new(Counters::default());
        let worker_counters = Arc::clone(&counters);

        let handle = thread::Builder::new()
            .name("wtl-outbox".to_string())
            .spawn(move || {
                trace!("Outbox worker started");
                for (label, job) in rx.iter() {
                    worker_counters.run(&label, job);
                    worker_counters.pending.fetch_sub(1, Ordering::SeqCst);
                }
                trace!("Outbox worker stopped");
            })
            .context("Failed to spawn outbox thread")?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            counters,
        })
    }

    /// Background when `background` is set, inline otherwise or if the
    /// thread cannot be started.
    pub fn new(background: bool) -> Self {
        if !background {
            return Self::inline();
        }
        Self::spawn().unwrap_or_else(|e| {
            warn!("{:#}; sending inline", e);
            Self::inline()
        })
    }

    pub fn is_background(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue a job. Never blocks on the job itself.
    pub fn submit<F>(&self, label: &str, job: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let Some(tx) = &self.tx else {
            self.counters.run(label, Box::new(job));
            return;
        };
        self.counters.pending.fetch_add(1, Ordering::SeqCst);
        if tx.send((label.to_string(), Box::new(job))).is_err() {
            self.counters.pending.fetch_sub(1, Ordering::SeqCst);
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            warn!("Outbox worker gone, dropped '{}'", label);
        }
    }

    /// Jobs queued but not finished.
    pub fn pending(&self) -> usize {
        self.counters.pending.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> u64 {
        self.counters.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Block until nothing is pending or `timeout` passes. Returns true if drained.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.pending() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }
}

impl Drop for Outbox {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the queue drains.
        self.tx = None;
        let Some(handle) = self.handle.take() else {
            return;
        };
        let deadline = Instant::now() + Duration::from_millis(500);
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                trace!("Outbox shutdown timeout, {} jobs left", self.pending());
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        let _ = handle.join();
    }
}
