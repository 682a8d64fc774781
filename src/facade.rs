//! Chooses which executor to instantiate and owns the signal-handler
//! lifecycle for one `run()` call.
//!
//! Translated from `Jobs.__init__`/`Jobs.run`/`_setup_sig_handler` in
//! the original SCons job engine. Unlike the original, Rust always has
//! `std::thread`, so the "parallel unavailable, fall back to serial"
//! branch never triggers here — see `DESIGN.md`.

use std::sync::{Arc, Mutex};

use crate::config::JobsConfig;
use crate::executor::{parallel_v2::CacheStats, Executor, ParallelExecutor, ParallelV2Executor, SerialExecutor};
use crate::interrupt::InterruptFlag;
use crate::signals::SignalBridge;
use crate::task::Task;
use crate::taskmaster::Taskmaster;

/// Which concrete engine a [`JobsConfig`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Serial,
    Parallel { num_workers: usize },
    ParallelV2 { num_workers: usize },
}

impl Selection {
    /// The effective parallelism a host should report to the user.
    pub fn effective_num_workers(self) -> usize {
        match self {
            Selection::Serial => 1,
            Selection::Parallel { num_workers } | Selection::ParallelV2 { num_workers } => num_workers,
        }
    }
}

/// Owns executor selection and the signal-handler install/restore
/// window around one build run.
pub struct JobsFacade<T: Task> {
    config: JobsConfig<T>,
}

impl<T: Task> JobsFacade<T> {
    pub fn new(config: JobsConfig<T>) -> Self {
        Self { config }
    }

    /// Selection rules (in order):
    /// 1. A fetch-enabled remote cache, or an explicit V2 request, wins:
    ///    ParallelV2 with `max(num_workers, 1)`.
    /// 2. Else `num_workers > 1` selects Parallel.
    /// 3. Else Serial, reported as 1 effective worker.
    pub fn selection(&self) -> Selection {
        let wants_v2 = self
            .config
            .remote_cache
            .as_ref()
            .map(|cache| cache.fetch_enabled())
            .unwrap_or(false)
            || self.config.use_scheduler_v2;

        if wants_v2 {
            Selection::ParallelV2 {
                num_workers: self.config.effective_num_workers(),
            }
        } else if self.config.num_workers > 1 {
            Selection::Parallel {
                num_workers: self.config.num_workers,
            }
        } else {
            Selection::Serial
        }
    }

    /// Run `taskmaster` to completion through the selected executor.
    ///
    /// Installs interrupt/terminate/hangup handling for the duration of
    /// the call; `post_fn` runs exactly once, after `start()` returns
    /// or panics, with signal delivery absorbed during that window; the
    /// previous signal disposition is always restored before `run`
    /// returns. A panic inside the executor resumes after `post_fn` and
    /// teardown complete.
    pub fn run<TM>(&self, taskmaster: TM, post_fn: impl FnOnce())
    where
        TM: Taskmaster<Task = T> + 'static,
    {
        let interrupted = InterruptFlag::new();
        let shared_tm = Arc::new(Mutex::new(taskmaster));

        let bridge = SignalBridge::install(interrupted.clone(), shared_tm.clone())
            .expect("failed to install signal handlers");

        let mut executor = self.build_executor(shared_tm, interrupted);

        tracing::info!(selection = ?self.selection(), "starting build");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            executor.start();
        }));

        post_fn();
        bridge.teardown();

        if let Err(payload) = result {
            std::panic::resume_unwind(payload);
        }
    }

    fn build_executor<TM>(
        &self,
        taskmaster: Arc<Mutex<TM>>,
        interrupted: InterruptFlag,
    ) -> Box<dyn Executor>
    where
        TM: Taskmaster<Task = T> + 'static,
    {
        match self.selection() {
            Selection::ParallelV2 { num_workers } => Box::new(ParallelV2Executor::new(
                taskmaster,
                num_workers,
                self.config.stack_size_kb,
                interrupted,
                self.config.remote_cache.clone(),
            )),
            Selection::Parallel { num_workers } => Box::new(ParallelExecutor::new(
                taskmaster,
                num_workers,
                self.config.stack_size_kb,
                interrupted,
            )),
            Selection::Serial => Box::new(SerialExecutor::new(taskmaster, interrupted)),
        }
    }
}

impl<T: Task> std::fmt::Debug for JobsFacade<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobsFacade")
            .field("num_workers", &self.config.num_workers)
            .field("use_scheduler_v2", &self.config.use_scheduler_v2)
            .field("has_remote_cache", &self.config.remote_cache.is_some())
            .finish()
    }
}

/// Re-exported so callers that only care about ParallelV2's cache
/// accounting don't need to reach into `executor::parallel_v2`.
pub type JobCacheStats = CacheStats;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTask;

    #[test]
    fn default_config_selects_serial() {
        let facade: JobsFacade<MockTask> = JobsFacade::new(JobsConfig::default());
        assert_eq!(facade.selection(), Selection::Serial);
        assert_eq!(facade.selection().effective_num_workers(), 1);
    }

    #[test]
    fn multiple_workers_selects_parallel() {
        let facade: JobsFacade<MockTask> = JobsFacade::new(JobsConfig::new(4));
        assert_eq!(facade.selection(), Selection::Parallel { num_workers: 4 });
    }

    #[test]
    fn explicit_v2_wins_even_with_one_worker() {
        let config: JobsConfig<MockTask> = JobsConfig::new(1).with_scheduler_v2(true);
        let facade = JobsFacade::new(config);
        assert_eq!(facade.selection(), Selection::ParallelV2 { num_workers: 1 });
    }
}
