//! Fixed-size pool of execution threads.
//!
//! Workers pull tasks off an unbounded request queue, execute them,
//! and post `(task, ok)` results to an unbounded results queue.
//! Shutdown is sentinel-based: `cleanup()` pushes one shutdown
//! sentinel per worker and joins them with a bounded timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::interrupt::InterruptFlag;
use crate::task::Task;

/// Per-worker join timeout used by `WorkerPool::cleanup`.
const JOIN_TIMEOUT: Duration = Duration::from_secs(1);
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

enum Request<T> {
    Run(T),
    Shutdown,
}

/// A fixed pool of worker threads executing `T: Task`.
pub struct WorkerPool<T: Task> {
    request_tx: Sender<Request<T>>,
    results_rx: Receiver<(T, bool)>,
    results_tx: Sender<(T, bool)>,
    workers: Vec<WorkerHandle>,
}

struct WorkerHandle {
    join: JoinHandle<()>,
    done: Arc<AtomicBool>,
}

impl<T: Task> WorkerPool<T> {
    /// Spawn `num_workers` threads, each with an advisory stack size
    /// in kilobytes (ignored if `None`).
    pub fn new(num_workers: usize, stack_size_kb: Option<usize>, interrupted: InterruptFlag) -> Self {
        let (request_tx, request_rx) = unbounded::<Request<T>>();
        let (results_tx, results_rx) = unbounded::<(T, bool)>();

        let mut workers = Vec::with_capacity(num_workers);
        for idx in 0..num_workers {
            let request_rx = request_rx.clone();
            let results_tx = results_tx.clone();
            let interrupted = interrupted.clone();
            let done = Arc::new(AtomicBool::new(false));
            let done_for_worker = done.clone();

            let mut builder = std::thread::Builder::new().name(format!("buildjobs-worker-{idx}"));
            if let Some(kb) = stack_size_kb {
                builder = builder.stack_size(kb * 1024);
            }

            let join = builder
                .spawn(move || {
                    worker_loop(request_rx, results_tx, interrupted);
                    done_for_worker.store(true, Ordering::SeqCst);
                })
                .expect("failed to spawn worker thread");

            workers.push(WorkerHandle { join, done });
        }

        tracing::debug!(num_workers, stack_size_kb = ?stack_size_kb, "worker pool started");

        Self {
            request_tx,
            results_rx,
            results_tx,
            workers,
        }
    }

    /// Enqueue a task for execution. Non-blocking.
    pub fn put(&self, task: T) {
        // An unbounded sender only errors if every receiver was
        // dropped, which cannot happen while `self.workers` is alive.
        let _ = self.request_tx.send(Request::Run(task));
    }

    /// Block until a result is available and return it.
    pub fn get(&self) -> (T, bool) {
        self.results_rx
            .recv()
            .expect("worker pool results channel closed unexpectedly")
    }

    /// Non-blocking: true if a result is immediately available.
    pub fn has_result(&self) -> bool {
        !self.results_rx.is_empty()
    }

    /// Enqueue a failure result directly, without routing the task
    /// through a worker — used when `prepare()` fails.
    pub fn preparation_failed(&self, task: T) {
        let _ = self.results_tx.send((task, false));
    }

    /// Shut every worker down: push one sentinel per worker, then join
    /// each with a bounded timeout.
    pub fn cleanup(mut self) {
        tracing::debug!(num_workers = self.workers.len(), "worker pool shutting down");
        for _ in &self.workers {
            let _ = self.request_tx.send(Request::Shutdown);
        }

        for worker in self.workers.drain(..) {
            let deadline = Instant::now() + JOIN_TIMEOUT;
            while !worker.done.load(Ordering::SeqCst) && Instant::now() < deadline {
                std::thread::sleep(JOIN_POLL_INTERVAL);
            }
            // Whether or not the flag was observed in time, attempt the
            // real join — if the worker is done this returns instantly;
            // if it's stuck we've already waited out our budget and a
            // blocking join here is the belt-and-braces fallback the
            // original design note calls for.
            if let Err(payload) = worker.join.join() {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::error!(panic = %message, "worker thread panicked during shutdown");
            }
        }
    }
}

fn worker_loop<T: Task>(
    request_rx: Receiver<Request<T>>,
    results_tx: Sender<(T, bool)>,
    interrupted: InterruptFlag,
) {
    loop {
        let request = match request_rx.recv() {
            Ok(req) => req,
            Err(_) => break,
        };

        let mut task = match request {
            Request::Run(task) => task,
            Request::Shutdown => break,
        };

        let ok = if interrupted.is_set() {
            task.exception_set(crate::interrupted_error(&task));
            false
        } else {
            match task.execute() {
                Ok(()) => true,
                Err(err) => {
                    task.exception_set(err);
                    false
                }
            }
        };

        if results_tx.send((task, ok)).is_err() {
            break;
        }
    }
}
