//! Single-threaded pull/execute loop.
//!
//! Translated directly from `Serial.start` in the original SCons job
//! engine: pull, prepare, execute if needed, report, postprocess,
//! repeat until the taskmaster is drained.

use crate::interrupt::InterruptFlag;
use crate::interrupted_error;
use crate::task::Task;
use crate::taskmaster::Taskmaster;

use super::{Executor, SharedTaskmaster};

/// Runs tasks one at a time on the calling thread.
pub struct SerialExecutor<TM: Taskmaster> {
    taskmaster: SharedTaskmaster<TM>,
    interrupted: InterruptFlag,
}

impl<TM: Taskmaster> SerialExecutor<TM> {
    pub fn new(taskmaster: SharedTaskmaster<TM>, interrupted: InterruptFlag) -> Self {
        Self {
            taskmaster,
            interrupted,
        }
    }
}

impl<TM: Taskmaster> Executor for SerialExecutor<TM> {
    fn start(&mut self) {
        loop {
            let task = {
                let mut tm = self.taskmaster.lock().expect("taskmaster mutex poisoned");
                tm.next_task()
            };

            let Some(mut task) = task else {
                break;
            };

            match task.prepare() {
                Err(err) => {
                    if self.interrupted.is_set() {
                        task.exception_set(interrupted_error(&task));
                    } else {
                        task.exception_set(err);
                    }
                    task.failed();
                }
                Ok(()) => {
                    if task.needs_execute() {
                        run_and_report(&mut task, &self.interrupted);
                    } else {
                        task.executed(None);
                    }
                }
            }

            task.postprocess();
        }

        self.taskmaster
            .lock()
            .expect("taskmaster mutex poisoned")
            .cleanup();
    }

    fn interrupted(&self) -> bool {
        self.interrupted.is_set()
    }
}

/// Execute a prepared task inline, reporting success/failure the same
/// way a worker thread would, including the interrupt-synthesis rule:
/// an error raised during `execute()` while the interrupt flag is set
/// is replaced with a synthesized "build interrupted" error.
fn run_and_report<T: Task>(task: &mut T, interrupted: &InterruptFlag) {
    match task.execute() {
        Ok(()) => task.executed(None),
        Err(err) => {
            if interrupted.is_set() {
                task.exception_set(interrupted_error(task));
            } else {
                task.exception_set(err);
            }
            task.failed();
        }
    }
}
