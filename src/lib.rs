//! `buildjobs` — the job execution core of a dependency-graph build
//! system.
//!
//! Pulls ready work units from a [`Taskmaster`](taskmaster::Taskmaster)
//! and executes them serially, in parallel across a
//! [`WorkerPool`](worker_pool::WorkerPool), or in parallel with a
//! speculative remote-cache overlay. See `SPEC_FULL.md` in the
//! repository root for the full design.
//!
//! ```rust,ignore
//! use buildjobs::{JobsConfig, JobsFacade};
//!
//! let facade = JobsFacade::new(JobsConfig::default());
//! facade.run(my_taskmaster, || {
//!     println!("build finished");
//! })?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod facade;
pub mod interrupt;
pub mod signals;
pub mod task;
pub mod taskmaster;
#[doc(hidden)]
pub mod test_support;
pub mod worker_pool;

pub use config::JobsConfig;
pub use error::JobsError;
pub use facade::JobsFacade;
pub use interrupt::InterruptFlag;
pub use task::{Task, TargetInfo, TargetKind, TargetNode};
pub use taskmaster::Taskmaster;

/// The message used for a build error synthesized when the interrupt
/// flag is observed set at a task-execution boundary.
pub const INTERRUPT_MESSAGE: &str = "Build interrupted.";

/// Synthesize the "build interrupted" error attributed to a task's
/// first target, mirroring the original build error raised when the
/// interrupt flag is observed mid-task.
pub fn interrupted_error<T: Task>(task: &T) -> anyhow::Error {
    let target = task
        .targets()
        .first()
        .map(|t| t.path.as_str())
        .unwrap_or("<unknown target>");
    anyhow::anyhow!("{INTERRUPT_MESSAGE} ({target})")
}
