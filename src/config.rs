//! Validated construction of the options `JobsFacade` uses to pick and
//! configure an executor.

use std::sync::Arc;

use clap::Args;

use crate::cache::RemoteCache;
use crate::task::Task;

/// Desired parallelism and cache configuration for a single build run.
///
/// Mirrors the `clap::Args` shape used across the teacher's CLIs
/// (short + long flags, sensible defaults) so a host binary can embed
/// `JobsConfigArgs` directly into its own `clap::Parser` struct.
pub struct JobsConfig<T: Task> {
    /// Desired worker-thread count. Values `<= 1` select the serial
    /// executor (unless a fetch-enabled cache or `use_scheduler_v2`
    /// forces ParallelV2).
    pub num_workers: usize,
    /// Advisory per-worker stack size, in kilobytes.
    pub stack_size_kb: Option<usize>,
    /// A configured remote cache, if any.
    pub remote_cache: Option<Arc<dyn RemoteCache<T>>>,
    /// Force the ParallelV2 scheduler even without a fetch-enabled cache.
    pub use_scheduler_v2: bool,
}

impl<T: Task> Default for JobsConfig<T> {
    fn default() -> Self {
        Self {
            num_workers: 1,
            stack_size_kb: None,
            remote_cache: None,
            use_scheduler_v2: false,
        }
    }
}

impl<T: Task> JobsConfig<T> {
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Self::default()
        }
    }

    pub fn with_stack_size_kb(mut self, stack_size_kb: usize) -> Self {
        self.stack_size_kb = Some(stack_size_kb);
        self
    }

    pub fn with_remote_cache(mut self, cache: Arc<dyn RemoteCache<T>>) -> Self {
        self.remote_cache = Some(cache);
        self
    }

    pub fn with_scheduler_v2(mut self, enabled: bool) -> Self {
        self.use_scheduler_v2 = enabled;
        self
    }

    /// `num_workers`, clamped to at least 1 — a misconfigured `-j 0`
    /// degrades to serial rather than panicking.
    pub fn effective_num_workers(&self) -> usize {
        self.num_workers.max(1)
    }
}

/// CLI flags for the job-execution options, embeddable into a host
/// binary's `clap::Parser` struct via `#[command(flatten)]`.
#[derive(Debug, Args)]
pub struct JobsConfigArgs {
    /// Number of worker threads to run tasks with.
    #[arg(long = "jobs", short = 'j', default_value_t = 1, global = true)]
    pub num_workers: usize,

    /// Advisory worker-thread stack size, in kilobytes.
    #[arg(long = "stack-size-kb", global = true)]
    pub stack_size_kb: Option<usize>,

    /// Force the cache-aware ParallelV2 scheduler even without a
    /// fetch-enabled remote cache configured.
    #[arg(long = "scheduler-v2", global = true)]
    pub use_scheduler_v2: bool,
}

impl JobsConfigArgs {
    /// Build a `JobsConfig` from parsed CLI flags; the caller attaches
    /// `remote_cache` separately since it is not representable as a
    /// plain CLI value.
    pub fn into_config<T: Task>(self) -> JobsConfig<T> {
        JobsConfig {
            num_workers: self.num_workers,
            stack_size_kb: self.stack_size_kb,
            remote_cache: None,
            use_scheduler_v2: self.use_scheduler_v2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTask;

    #[test]
    fn zero_workers_clamps_to_one() {
        let config: JobsConfig<MockTask> = JobsConfig::new(0);
        assert_eq!(config.effective_num_workers(), 1);
    }

    #[test]
    fn builder_methods_compose() {
        let config: JobsConfig<MockTask> = JobsConfig::new(4)
            .with_stack_size_kb(512)
            .with_scheduler_v2(true);
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.stack_size_kb, Some(512));
        assert!(config.use_scheduler_v2);
    }
}
