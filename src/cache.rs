//! The remote content-addressed cache contract consumed by
//! [`ParallelV2Executor`](crate::executor::ParallelV2Executor).
//!
//! The core never derives cache keys or speaks the cache's wire
//! protocol — it only submits tasks for lookup and reacts to
//! asynchronous `(task, hit, target_infos)` responses.

use crossbeam_channel::Sender;

use crate::task::{Task, TargetInfo};

/// One asynchronous response from the cache collaborator, posted to
/// the queue supplied via `RemoteCache::set_fetch_response_queue`.
pub struct CacheResponse<T: Task> {
    pub task: T,
    pub hit: bool,
    pub target_infos: Option<TargetInfo>,
}

/// Result of submitting a task to [`RemoteCache::fetch_task`].
pub enum FetchOutcome<T: Task> {
    /// The cache accepted the task; a `CacheResponse` will eventually
    /// arrive on the fetch response queue.
    Pending,
    /// The cache did not submit a lookup; `task` is handed back so the
    /// caller can dispatch it locally.
    NotPending { task: T, cacheable: bool },
}

/// A remote, content-addressed build cache.
///
/// Implementations run their own background worker(s) and communicate
/// lookup results solely through the queue handed to
/// `set_fetch_response_queue`; the core never blocks waiting on
/// `fetch_task` itself.
pub trait RemoteCache<T: Task>: Send + Sync {
    /// Whether this cache instance should be consulted at all; selects
    /// the ParallelV2 scheduler in `JobsFacade`.
    fn fetch_enabled(&self) -> bool;

    /// Called once, before dispatch begins, with the channel the cache
    /// should post responses to.
    fn set_fetch_response_queue(&self, response_tx: Sender<CacheResponse<T>>);

    /// Submit an asynchronous lookup for `task`.
    ///
    /// If the lookup is accepted, the cache takes ownership of `task`
    /// and hands it back via a `CacheResponse` on resolution
    /// (`FetchOutcome::Pending`). Otherwise — cache suspended or the
    /// task is not cacheable — `task` is handed straight back
    /// (`FetchOutcome::NotPending`) along with whether it was at least
    /// cacheable-in-principle, for statistics purposes.
    fn fetch_task(&self, task: T) -> FetchOutcome<T>;

    /// Self-reported count of cache resets since process start.
    fn reset_count(&self) -> u64;

    /// Self-reported count of cache failures since process start.
    fn total_failure_count(&self) -> u64;

    /// End-of-run summary sink.
    #[allow(clippy::too_many_arguments)]
    fn log_stats(
        &self,
        hit_pct: f64,
        cache_count: u64,
        hits: u64,
        misses: u64,
        suspended: u64,
        cacheable_pct: f64,
        skips: u64,
        task_count: u64,
        total_failures: u64,
        reset_count: u64,
    );
}
