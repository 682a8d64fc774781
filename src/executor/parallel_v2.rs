//! Extends [`ParallelExecutor`] with a speculative remote-cache lookup
//! per task, multiplexing worker results and cache responses while
//! keeping the pool saturated.
//!
//! Translated statement-by-statement from `ParallelV2.start` /
//! `get_next_task_to_execute` in the original SCons job engine — see
//! `DESIGN.md` for the drain-priority and phantom-exclusion notes.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver};

use crate::cache::{CacheResponse, FetchOutcome, RemoteCache};
use crate::interrupt::InterruptFlag;
use crate::interrupted_error;
use crate::task::Task;
use crate::taskmaster::Taskmaster;
use crate::worker_pool::WorkerPool;

use super::{Executor, SharedTaskmaster};

/// End-of-run cache accounting, reported to the `RemoteCache`'s stats
/// sink and available to callers via [`ParallelV2Executor::stats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub suspended: u64,
    pub skips: u64,
}

impl CacheStats {
    fn cache_count(&self) -> u64 {
        self.hits + self.misses + self.suspended
    }

    fn task_count(&self) -> u64 {
        self.cache_count() + self.skips
    }

    fn hit_pct(&self) -> f64 {
        let count = self.cache_count();
        if count == 0 {
            0.0
        } else {
            100.0 * self.hits as f64 / count as f64
        }
    }

    fn cacheable_pct(&self) -> f64 {
        let total = self.task_count();
        if total == 0 {
            0.0
        } else {
            100.0 * self.cache_count() as f64 / total as f64
        }
    }
}

pub struct ParallelV2Executor<TM: Taskmaster> {
    taskmaster: SharedTaskmaster<TM>,
    interrupted: InterruptFlag,
    pool: Option<WorkerPool<TM::Task>>,
    maxjobs: usize,
    cache: Option<Arc<dyn RemoteCache<TM::Task>>>,
    stats: CacheStats,
}

impl<TM: Taskmaster> ParallelV2Executor<TM> {
    pub fn new(
        taskmaster: SharedTaskmaster<TM>,
        maxjobs: usize,
        stack_size_kb: Option<usize>,
        interrupted: InterruptFlag,
        cache: Option<Arc<dyn RemoteCache<TM::Task>>>,
    ) -> Self {
        let pool = WorkerPool::new(maxjobs, stack_size_kb, interrupted.clone());
        Self {
            taskmaster,
            interrupted,
            pool: Some(pool),
            maxjobs,
            cache,
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn pool(&self) -> &WorkerPool<TM::Task> {
        self.pool.as_ref().expect("pool dropped before start() returned")
    }

    /// Pull from the taskmaster, preparing and locally resolving every
    /// non-executable task, until either a real executable task
    /// appears or `limit` pulls have happened (`limit == 0` means "no
    /// limit — keep pulling until a real task appears or the producer
    /// drains").
    ///
    /// Returns `(task, producer_has_more)`.
    fn get_next_task_to_execute(&self, limit: usize) -> (Option<TM::Task>, bool) {
        let mut count = 0usize;
        loop {
            if limit != 0 && count >= limit {
                return (None, true);
            }

            let task = {
                let mut tm = self.taskmaster.lock().expect("taskmaster mutex poisoned");
                tm.next_task()
            };
            let Some(mut task) = task else {
                return (None, false);
            };

            match task.prepare() {
                Err(err) => {
                    task.exception_set(err);
                    task.failed();
                    task.postprocess();
                }
                Ok(()) => {
                    if task.needs_execute() {
                        return (Some(task), true);
                    }
                    task.executed(None);
                    task.postprocess();
                }
            }

            count += 1;
        }
    }

    /// Report one worker result, mirroring `ParallelExecutor::process_result`.
    fn process_worker_result(&self) {
        let (mut task, ok) = self.pool().get();
        if ok {
            task.executed(None);
        } else {
            if self.interrupted.is_set() {
                task.exception_set(interrupted_error(&task));
            }
            task.failed();
        }
        task.postprocess();
    }

    /// Dispatch a freshly-pulled, prepared, executable task: try the
    /// cache first (if configured), falling back to the worker pool.
    fn dispatch_fresh_task(&mut self, task: TM::Task, pending_fetches: &mut usize, jobs: &mut usize) {
        let Some(cache) = self.cache.clone() else {
            self.count_locally_dispatched(&task);
            self.pool().put(task);
            *jobs += 1;
            return;
        };

        match cache.fetch_task(task) {
            FetchOutcome::Pending => {
                *pending_fetches += 1;
            }
            FetchOutcome::NotPending { task, cacheable } => {
                if !task.is_phantom() {
                    if cacheable {
                        self.stats.suspended += 1;
                    } else {
                        self.stats.skips += 1;
                    }
                }
                self.pool().put(task);
                *jobs += 1;
            }
        }
    }

    /// No remote cache configured at all: still exclude phantom tasks
    /// from the skip tally, matching the original's accounting rule.
    fn count_locally_dispatched(&mut self, task: &TM::Task) {
        if !task.is_phantom() {
            self.stats.skips += 1;
        }
    }

    fn report_stats(&self) {
        let Some(cache) = &self.cache else { return };
        if self.stats.task_count() == 0 {
            return;
        }
        cache.log_stats(
            self.stats.hit_pct(),
            self.stats.cache_count(),
            self.stats.hits,
            self.stats.misses,
            self.stats.suspended,
            self.stats.cacheable_pct(),
            self.stats.skips,
            self.stats.task_count(),
            cache.total_failure_count(),
            cache.reset_count(),
        );
    }
}

impl<TM: Taskmaster> Executor for ParallelV2Executor<TM> {
    fn start(&mut self) {
        let (fetch_tx, fetch_rx): (_, Receiver<CacheResponse<TM::Task>>) = unbounded();
        if let Some(cache) = &self.cache {
            cache.set_fetch_response_queue(fetch_tx);
        }

        let mut jobs: usize = 0;
        let mut pending_fetches: usize = 0;
        let mut tasks_left = true;

        loop {
            let fetch_limit = if jobs == 0 && pending_fetches == 0 { 0 } else { 1 };
            let task = if tasks_left {
                let (task, has_more) = self.get_next_task_to_execute(fetch_limit);
                tasks_left = has_more;
                task
            } else {
                None
            };

            if task.is_none() && !tasks_left && jobs == 0 && pending_fetches == 0 {
                break;
            }

            // Drain worker results: keep draining while other
            // priorities (more producer work, or a free slot with a
            // fetch pending) don't have a strictly cheaper path and no
            // result is sitting in the queue already.
            while jobs > 0 {
                let other_work_pending =
                    tasks_left || (jobs < self.maxjobs && pending_fetches > 0);
                if other_work_pending && !self.pool().has_result() {
                    break;
                }
                self.process_worker_result();
                jobs -= 1;
                tasks_left = true;
            }

            // Drain cache responses: lowest priority, only block if
            // there is nothing else productive to do.
            while pending_fetches > 0 {
                let other_work_pending = tasks_left || jobs > 0;
                if other_work_pending && fetch_rx.is_empty() {
                    break;
                }
                let response = fetch_rx
                    .recv()
                    .expect("fetch response channel closed unexpectedly");
                pending_fetches -= 1;

                let mut task = response.task;
                if response.hit {
                    self.stats.hits += 1;
                    task.executed(response.target_infos);
                    task.postprocess();
                    tasks_left = true;
                } else {
                    self.stats.misses += 1;
                    self.pool().put(task);
                    jobs += 1;
                }
            }

            if let Some(task) = task {
                self.dispatch_fresh_task(task, &mut pending_fetches, &mut jobs);
            }
        }

        self.report_stats();

        let pool = self.pool.take().expect("pool already taken");
        pool.cleanup();
        self.taskmaster
            .lock()
            .expect("taskmaster mutex poisoned")
            .cleanup();
    }

    fn interrupted(&self) -> bool {
        self.interrupted.is_set()
    }
}
