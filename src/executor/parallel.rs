//! Worker-pool coordinator that keeps up to `maxjobs` tasks in flight.
//!
//! Translated from `Parallel.start`/`process_result` in the original
//! SCons job engine: a dispatch phase fills the worker pool up to
//! `maxjobs`, then a drain phase processes whatever results are
//! already available before dispatching again.

use crate::interrupt::InterruptFlag;
use crate::interrupted_error;
use crate::task::Task;
use crate::taskmaster::Taskmaster;
use crate::worker_pool::WorkerPool;

use super::{Executor, SharedTaskmaster};

/// Runs up to `maxjobs` tasks concurrently through a `WorkerPool`,
/// while `Taskmaster::next_task` remains serialized on the coordinator.
pub struct ParallelExecutor<TM: Taskmaster> {
    taskmaster: SharedTaskmaster<TM>,
    interrupted: InterruptFlag,
    pool: Option<WorkerPool<TM::Task>>,
    maxjobs: usize,
}

impl<TM: Taskmaster> ParallelExecutor<TM> {
    pub fn new(
        taskmaster: SharedTaskmaster<TM>,
        maxjobs: usize,
        stack_size_kb: Option<usize>,
        interrupted: InterruptFlag,
    ) -> Self {
        let pool = WorkerPool::new(maxjobs, stack_size_kb, interrupted.clone());
        Self {
            taskmaster,
            interrupted,
            pool: Some(pool),
            maxjobs,
        }
    }

    fn pool(&self) -> &WorkerPool<TM::Task> {
        self.pool.as_ref().expect("pool dropped before start() returned")
    }

    /// Block on one worker result, report it, and return.
    fn process_result(&self) {
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
}

impl<TM: Taskmaster> Executor for ParallelExecutor<TM> {
    fn start(&mut self) {
        let mut jobs: usize = 0;

        loop {
            // Dispatch phase: fill up to maxjobs. `last_pull_was_task`
            // mirrors the truthiness of the original's `task` variable
            // at loop exit: it reflects whether the *last* `next_task()`
            // call in this pass returned something, not whether any
            // call this pass did — dispatching a batch that ends in a
            // drained producer must still be recognized as "drained".
            let mut last_pull_was_task = jobs > 0;
            while jobs < self.maxjobs {
                let task = {
                    let mut tm = self.taskmaster.lock().expect("taskmaster mutex poisoned");
                    tm.next_task()
                };
                let Some(mut task) = task else {
                    last_pull_was_task = false;
                    break;
                };
                last_pull_was_task = true;

                match task.prepare() {
                    Err(err) => {
                        task.exception_set(err);
                        task.failed();
                        task.postprocess();
                    }
                    Ok(()) => {
                        if task.needs_execute() {
                            self.pool().put(task);
                            jobs += 1;
                        } else {
                            task.executed(None);
                            task.postprocess();
                        }
                    }
                }
            }

            if !last_pull_was_task && jobs == 0 {
                break;
            }

            // Drain phase: process at least one result, then keep
            // draining while more are immediately available.
            loop {
                self.process_result();
                jobs -= 1;
                if !self.pool().has_result() {
                    break;
                }
            }
        }

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
