// LogSift - app/dispatch.rs
//
// The two execution contexts a session uses:
//   - `Worker`: a single background thread draining a FIFO job channel.
//     Every load/filter/search runs here, so jobs never overlap and always
//     run in submission order.
//   - `CompletionQueue`: owned by the presentation side. Jobs post their
//     completion callbacks into it; the presentation thread runs them by
//     draining the queue (same polling pattern as a UI frame loop).

use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Unit of work for either context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

// =============================================================================
// Worker
// =============================================================================

/// Serial background executor.
///
/// Dropping the worker closes its channel, lets already-queued jobs finish,
/// then joins the thread.
pub struct Worker {
    tx: Option<mpsc::Sender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let thread = std::thread::spawn(move || {
            tracing::debug!("Worker started");
            while let Ok(job) = rx.recv() {
                job();
            }
            tracing::debug!("Worker stopped");
        });

        Self {
            tx: Some(tx),
            thread: Some(thread),
        }
    }

    /// A cloneable submission handle, usable from other threads.
    pub fn handle(&self) -> WorkerHandle {
        WorkerHandle {
            tx: self.tx.clone(),
        }
    }

    /// Queue `job`. Returns false if the worker thread has exited.
    pub fn submit(&self, job: Job) -> bool {
        self.handle().submit(job)
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.tx = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }
    }
}

/// Submission side of a `Worker`.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: Option<mpsc::Sender<Job>>,
}

impl WorkerHandle {
    /// Queue `job`. Returns false if the worker thread has exited.
    pub fn submit(&self, job: Job) -> bool {
        let sent = self.tx.as_ref().is_some_and(|tx| tx.send(job).is_ok());
        if !sent {
            tracing::warn!("Worker is gone; job dropped");
        }
        sent
    }
}

// =============================================================================
// Completion queue (presentation context)
// =============================================================================

/// Completion callbacks waiting to run on the presentation thread.
pub struct CompletionQueue {
    tx: mpsc::Sender<Job>,
    rx: mpsc::Receiver<Job>,
}

impl CompletionQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Handle given to sessions so their jobs can post completions.
    pub fn sender(&self) -> CompletionSender {
        CompletionSender {
            tx: self.tx.clone(),
        }
    }

    /// Run every completion queued so far on the calling thread, without
    /// blocking. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(completion) = self.rx.try_recv() {
            completion();
            ran += 1;
        }
        ran
    }

    /// Block for up to `timeout` for the next completion and run it.
    /// Returns false if none arrived in time.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                completion();
                true
            }
            Err(_) => false,
        }
    }
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Posting side of a `CompletionQueue`.
#[derive(Clone)]
pub struct CompletionSender {
    tx: mpsc::Sender<Job>,
}

impl CompletionSender {
    /// Post `completion`. Silently dropped if the presentation side is gone.
    pub fn post(&self, completion: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(completion)).is_err() {
            tracing::debug!("Completion queue closed; callback dropped");
        }
    }
}
