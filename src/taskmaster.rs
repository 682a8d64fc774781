//! The producer contract consumed by every executor.

use crate::task::Task;

/// Walks a dependency graph and yields ready-to-run tasks.
///
/// `next_task()` is the serialization point for graph traversal: it
/// must only ever be called from the single coordinator thread.
pub trait Taskmaster: Send {
    type Task: Task;

    /// Return the next ready task, or `None` if none is currently
    /// available (which may become non-`None` again later, e.g. once
    /// an in-flight task's dependents unblock).
    fn next_task(&mut self) -> Option<Self::Task>;

    /// Stop yielding new tasks. Does not cancel tasks already in
    /// flight. Idempotent.
    fn stop(&mut self);

    /// Called exactly once, at executor termination.
    fn cleanup(&mut self);
}
