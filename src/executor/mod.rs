//! The three execution engines: [`serial`], [`parallel`], and
//! [`parallel_v2`].
//!
//! All three share the shape: drive a `Taskmaster` from a single
//! coordinator, dispatching tasks either inline (serial) or onto a
//! [`WorkerPool`](crate::worker_pool::WorkerPool) (parallel variants),
//! observing the shared [`InterruptFlag`](crate::interrupt::InterruptFlag).

pub mod parallel;
pub mod parallel_v2;
pub mod serial;

pub use parallel::ParallelExecutor;
pub use parallel_v2::ParallelV2Executor;
pub use serial::SerialExecutor;

use std::sync::{Arc, Mutex};

use crate::taskmaster::Taskmaster;

/// A `Taskmaster` shared between the coordinator loop and the signal
/// bridge (which calls `stop()` on interrupt delivery).
pub type SharedTaskmaster<TM> = Arc<Mutex<TM>>;

/// Common surface `JobsFacade` drives; each executor owns its own
/// worker pool (if any) for the lifetime of a single `start()` call.
pub trait Executor {
    /// Run until the taskmaster is drained and all in-flight work
    /// completes. Blocks the calling thread.
    fn start(&mut self);

    /// Whether the interrupt flag was observed set at any point during
    /// this run.
    fn interrupted(&self) -> bool;
}
