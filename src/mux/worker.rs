//! Single-Thread Dispatch Worker
//!
//! Key and gesture fan-out runs on one dedicated thread so the platform's
//! delivery thread is never blocked by slow observers. Tasks execute in
//! FIFO order. Submission from the delivery thread is non-blocking: when
//! the queue is full the task is dropped and counted, never queued with
//! backpressure.
//!
//! Shutdown closes the queue, lets in-flight tasks finish, and waits a
//! bounded grace period for the thread to acknowledge before abandoning it.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default task queue capacity
pub const DEFAULT_QUEUE_SIZE: usize = 256;

/// Grace period granted to the worker thread on shutdown
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(1000);

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Worker statistics for monitoring
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Tasks accepted onto the queue
    pub tasks_submitted: AtomicU64,
    /// Tasks dropped because the queue was full or closed
    pub tasks_rejected: AtomicU64,
    /// Tasks that finished executing
    pub tasks_completed: AtomicU64,
}

/// FIFO executor backed by a single named thread.
pub struct DispatchWorker {
    tx: Mutex<Option<Sender<Task>>>,
    done_rx: Mutex<Option<Receiver<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<WorkerStats>,
}

impl DispatchWorker {
    /// Spawn the worker thread with the default queue capacity.
    pub fn new() -> Self {
        Self::with_queue_size(DEFAULT_QUEUE_SIZE)
    }

    /// Spawn the worker thread with an explicit queue capacity.
    pub fn with_queue_size(queue_size: usize) -> Self {
        let (tx, rx) = bounded::<Task>(queue_size.max(1));
        let (done_tx, done_rx) = bounded::<()>(1);
        let stats = Arc::new(WorkerStats::default());
        let worker_stats = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name("mux-dispatch".into())
            .spawn(move || {
                // done_tx is dropped when this closure returns, which is
                // the shutdown acknowledgement the other side waits on.
                let _done_tx = done_tx;
                for task in rx {
                    task();
                    worker_stats.tasks_completed.fetch_add(1, Ordering::Relaxed);
                }
                debug!("dispatch worker exiting");
            })
            .ok();

        if handle.is_none() {
            warn!("failed to spawn dispatch worker thread");
        }

        Self {
            tx: Mutex::new(handle.as_ref().map(|_| tx)),
            done_rx: Mutex::new(Some(done_rx)),
            handle: Mutex::new(handle),
            stats,
        }
    }

    /// Queue a task for FIFO execution on the worker thread.
    ///
    /// Never blocks. Returns `false` when the worker is shut down or the
    /// queue is full; the task is dropped in that case.
    pub fn execute(&self, task: Task) -> bool {
        let guard = self.tx.lock();
        let accepted = match guard.as_ref() {
            Some(tx) => tx.try_send(task).is_ok(),
            None => false,
        };
        if accepted {
            self.stats.tasks_submitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.tasks_rejected.fetch_add(1, Ordering::Relaxed);
            trace!("dispatch worker rejected task");
        }
        accepted
    }

    /// Whether the worker still accepts tasks.
    pub fn is_running(&self) -> bool {
        self.tx.lock().is_some()
    }

    /// Worker statistics.
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Shut the worker down, waiting up to `grace` for queued tasks to
    /// drain and the thread to exit.
    ///
    /// Idempotent: repeated calls after a successful shutdown return
    /// `true`. Returns `false` when the thread failed to acknowledge
    /// within the grace period and was abandoned.
    pub fn shutdown(&self, grace: Duration) -> bool {
        let closed = self.tx.lock().take();
        if closed.is_none() && self.done_rx.lock().is_none() {
            return true; // already shut down
        }
        drop(closed); // closing the channel ends the worker loop

        let done_rx = match self.done_rx.lock().take() {
            Some(rx) => rx,
            None => return true,
        };
        match done_rx.recv_timeout(grace) {
            // The worker never sends; disconnection means the thread
            // dropped its end and exited.
            Err(RecvTimeoutError::Disconnected) | Ok(()) => {
                if let Some(handle) = self.handle.lock().take() {
                    let _ = handle.join();
                }
                debug!("dispatch worker shut down");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(grace_ms = grace.as_millis() as u64, "dispatch worker did not stop in time, abandoning");
                false
            }
        }
    }
}

impl Default for DispatchWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DispatchWorker {
    fn drop(&mut self) {
        self.shutdown(SHUTDOWN_GRACE);
    }
}
