//! The `Task` capability set consumed by every executor.
//!
//! A `Task` is opaque to the execution core beyond the lifecycle
//! methods below and its ordered `targets()`. Hosts (the dependency
//! graph / taskmaster implementation) supply the concrete type.

use anyhow::Error;

/// Opaque blob returned by a cache hit and handed to `Task::executed`.
///
/// The core never interprets this — it only plumbs it from
/// `RemoteCache::fetch_task` responses through to the task.
pub type TargetInfo = Vec<u8>;

/// What kind of build product a `TargetNode` represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A real file on disk.
    File,
    /// A directory.
    Directory,
    /// A bookkeeping node ("alias") that groups other targets but does
    /// not itself correspond to a build product.
    Alias,
}

/// One node in a task's ordered target list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetNode {
    pub kind: TargetKind,
    pub path: String,
}

impl TargetNode {
    pub fn new(kind: TargetKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// The conventional current-directory placeholder path used by
    /// some build graphs for a node that carries no real artifact.
    const PHANTOM_PATH: &'static str = ".";

    fn is_phantom_node(&self) -> bool {
        self.kind == TargetKind::Alias || self.path == Self::PHANTOM_PATH
    }
}

/// An opaque unit of work pulled from a `Taskmaster`.
///
/// Lifecycle (always on the coordinator thread, except `execute`,
/// which runs on a worker):
///
/// 1. `prepare()` — may fail; on failure neither `execute` nor
///    `executed` is ever called for this task.
/// 2. `needs_execute()` — if false, `execute` is skipped and the task
///    is treated as immediately successful.
/// 3. `execute()` — runs on a worker thread (or inline for the serial
///    executor); may fail.
/// 4. `executed(target_infos)` on success, or `failed()` on failure.
/// 5. `postprocess()` — always last, always called exactly once.
pub trait Task: Send + 'static {
    /// Ordered target list for this task. Non-empty; `targets()[0]` is
    /// used for error attribution.
    fn targets(&self) -> &[TargetNode];

    /// Prepare the task for execution. May fail.
    fn prepare(&mut self) -> Result<(), Error>;

    /// Whether `execute()` needs to run at all.
    fn needs_execute(&self) -> bool;

    /// Perform the task's actual work. Runs on a worker thread for the
    /// parallel executors.
    fn execute(&mut self) -> Result<(), Error>;

    /// Called on success, optionally carrying cache-supplied target
    /// info (only ever `Some` for a ParallelV2 cache hit).
    fn executed(&mut self, target_infos: Option<TargetInfo>);

    /// Called on failure, after `exception_set` has recorded the
    /// error.
    fn failed(&mut self);

    /// Always called last, exactly once, regardless of outcome.
    fn postprocess(&mut self);

    /// Record the error that caused this task to fail.
    fn exception_set(&mut self, err: Error);

    /// Whether this task is a bookkeeping node excluded from cache
    /// accounting: exactly one target, and that target is an alias or
    /// the conventional `.` placeholder.
    fn is_phantom(&self) -> bool {
        matches!(self.targets(), [single] if single.is_phantom_node())
    }
}
