// src/queue.rs

//! FIFO queue serializing [`GitJob`] execution.
//!
//! At most the head-of-queue job is ever running; everything behind it is
//! strictly pending. Advancing to the next job is driven exclusively by the
//! finished job's own completion signal, so job N+1 never starts before job
//! N's completion has been fully processed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::job::{Executed, GitJob};

/// Ordered collection of jobs with automatic chaining.
///
/// The queue is the sole authority over the jobs handed to it: callers must
/// not kill or restart an enqueued job behind the queue's back. Each job
/// should be enqueued at most once at a time.
///
/// Must be created inside a tokio runtime; the queue owns a background task
/// that processes completion signals.
#[derive(Debug)]
pub struct JobQueue {
    inner: Arc<Mutex<QueueInner>>,
    executed_tx: mpsc::UnboundedSender<Executed>,
    advance_handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct QueueInner {
    jobs: VecDeque<GitJob>,
}

impl JobQueue {
    pub fn new() -> Self {
        let inner = Arc::new(Mutex::new(QueueInner::default()));
        let (executed_tx, mut executed_rx) = mpsc::unbounded_channel::<Executed>();

        let advance_inner = Arc::clone(&inner);
        let advance_handle = tokio::spawn(async move {
            while let Some(signal) = executed_rx.recv().await {
                advance(&advance_inner, signal);
            }
            debug!("queue advance loop finished (channel closed)");
        });

        Self {
            inner,
            executed_tx,
            advance_handle,
        }
    }

    /// Append a job to the tail. If the queue was empty, the job is launched
    /// immediately; otherwise it runs once everything ahead of it has
    /// finished.
    ///
    /// Launching uses the job's preset arguments; a job that cannot launch
    /// when its turn comes is skipped (launch failure is the job's concern,
    /// the queue only guarantees progress).
    pub fn enqueue(&self, job: GitJob) {
        job.set_executed_hook(self.executed_tx.clone());

        let mut inner = lock(&self.inner);
        inner.jobs.push_back(job);
        debug!(queued = inner.jobs.len(), "job enqueued");
        if inner.jobs.len() == 1 {
            launch_head(&mut inner);
        }
    }

    /// Cancel the running head job and discard every queued job.
    ///
    /// Hooks are detached before anything is killed, so a kill-induced
    /// completion can never re-enter the advance path. Afterwards the queue
    /// is empty and observes nothing further from the discarded jobs.
    pub fn kill_all(&self) {
        let mut inner = lock(&self.inner);
        if inner.jobs.is_empty() {
            return;
        }
        info!(discarded = inner.jobs.len(), "killing all queued jobs");
        for job in &inner.jobs {
            job.clear_executed_hook();
        }
        for job in inner.jobs.drain(..) {
            job.kill();
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner).jobs.is_empty()
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.kill_all();
        self.advance_handle.abort();
    }
}

/// Handle one completion signal: drop the finished head and launch the next
/// pending job, if any.
///
/// Signals whose job id does not match the current head are stale (the job
/// was killed or already removed) and are ignored. Together with detaching
/// hooks before kills this makes double-advance unreachable, not merely
/// tolerated.
fn advance(inner: &Mutex<QueueInner>, signal: Executed) {
    let mut inner = lock(inner);

    let head_matches = inner
        .jobs
        .front()
        .is_some_and(|job| job.id() == signal.job_id);
    if !head_matches {
        debug!(
            job_id = signal.job_id,
            "stale completion signal; job no longer at the queue head"
        );
        return;
    }

    debug!(
        job_id = signal.job_id,
        exit_code = signal.exit_code,
        "queue head finished"
    );
    remove_current(&mut inner);
    launch_head(&mut inner);
}

/// Release the head job: detach its hook, kill it if it is somehow still
/// running, then remove it. The single place a head job leaves the queue.
fn remove_current(inner: &mut QueueInner) {
    let Some(head) = inner.jobs.front() else {
        return;
    };
    head.clear_executed_hook();
    if head.is_running() {
        head.kill();
    }
    inner.jobs.pop_front();
}

/// Launch the current head with its preset arguments, skipping over jobs
/// that fail to launch.
fn launch_head(inner: &mut QueueInner) {
    while let Some(head) = inner.jobs.front() {
        match head.run(None, false) {
            Ok(()) => {
                debug!(job_id = head.id(), "launched queue head");
                return;
            }
            Err(err) => {
                warn!(
                    job_id = head.id(),
                    error = %err,
                    "failed to launch queued job; skipping"
                );
                head.clear_executed_hook();
                inner.jobs.pop_front();
            }
        }
    }
}

fn lock(inner: &Mutex<QueueInner>) -> MutexGuard<'_, QueueInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
