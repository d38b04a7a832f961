//! Single-worker serialized task queue.
//!
//! # Responsibilities
//! - Own one dedicated worker thread and the context it runs tasks against
//! - Run submitted tasks one at a time in submission order
//! - Hand each task's result (or panic) back through its own handle
//!
//! # Design Decisions
//! - The context is built on the worker by an init closure and never leaves
//!   it, so it needs neither `Send` nor `Sync`
//! - Unbounded channel: submitting never blocks a request task
//! - Worker exits when every sender is dropped, after draining queued tasks

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::sync::{mpsc, oneshot};

use crate::dispatch::error::{panic_message, TaskError};
use crate::observability::metrics;

type Job<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

/// FIFO queue drained by exactly one worker thread.
///
/// `C` is the worker-owned context each task receives. Use `()` for plain
/// zero-argument work.
pub struct AffinityQueue<C> {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Job<C>>,
    depth: Arc<AtomicUsize>,
}

impl<C: 'static> AffinityQueue<C> {
    /// Spawn the worker thread. `init` runs on that thread to build the context.
    pub fn spawn<F>(name: impl Into<String>, init: F) -> std::io::Result<Self>
    where
        F: FnOnce() -> C + Send + 'static,
    {
        let name: Arc<str> = Arc::from(name.into());
        let (tx, mut rx) = mpsc::unbounded_channel::<Job<C>>();
        let depth = Arc::new(AtomicUsize::new(0));

        let worker_name = name.clone();
        let worker_depth = depth.clone();
        thread::Builder::new()
            .name(format!("affinity-{}", name))
            .spawn(move || {
                let mut context = init();
                tracing::debug!(queue = %worker_name, "Affinity worker started");

                while let Some(job) = rx.blocking_recv() {
                    job(&mut context);
                    let remaining = worker_depth.fetch_sub(1, Ordering::AcqRel) - 1;
                    metrics::set_queue_depth(&worker_name, remaining);
                }

                tracing::debug!(queue = %worker_name, "Affinity worker stopped");
            })?;

        Ok(Self { name, tx, depth })
    }

    /// Enqueue a task. The returned handle yields its result once it has run.
    pub fn submit<F, R>(&self, task: F) -> Result<TaskHandle<R>, TaskError>
    where
        F: FnOnce(&mut C) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job: Job<C> = Box::new(move |context: &mut C| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(context)))
                .map_err(|payload| TaskError::Panicked(panic_message(payload.as_ref())));
            // Handle dropped means nobody is waiting for the result.
            let _ = done_tx.send(outcome);
        });

        let pending = self.depth.fetch_add(1, Ordering::AcqRel) + 1;
        if self.tx.send(job).is_err() {
            self.depth.fetch_sub(1, Ordering::AcqRel);
            return Err(TaskError::Closed(self.name.to_string()));
        }
        metrics::set_queue_depth(&self.name, pending);

        Ok(TaskHandle {
            queue: self.name.clone(),
            rx: done_rx,
        })
    }

    /// Queue name, also the worker thread's suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tasks submitted but not yet finished, including the one running.
    pub fn pending(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }
}

impl<C> std::fmt::Debug for AffinityQueue<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffinityQueue")
            .field("name", &self.name)
            .field("pending", &self.depth.load(Ordering::Relaxed))
            .finish()
    }
}

/// Completion handle for one submitted task.
#[derive(Debug)]
pub struct TaskHandle<R> {
    queue: Arc<str>,
    rx: oneshot::Receiver<Result<R, TaskError>>,
}

impl<R> TaskHandle<R> {
    /// Wait for the task without blocking the runtime thread.
    pub async fn join(self) -> Result<R, TaskError> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(TaskError::Closed(self.queue.to_string())),
        }
    }

    /// Wait for the task from a plain thread.
    pub fn blocking_join(self) -> Result<R, TaskError> {
        match self.rx.blocking_recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(TaskError::Closed(self.queue.to_string())),
        }
    }
}
