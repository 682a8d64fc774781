//! In-memory `Task`/`Taskmaster`/`RemoteCache` fixtures shared by this
//! crate's unit tests and its `tests/` integration suite.
//!
//! Not part of the public contract beyond "useful for exercising the
//! executors" — kept unconditionally compiled (rather than behind
//! `#[cfg(test)]`) so integration tests, which build this crate as an
//! ordinary dependency, can reach it too.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::cache::{CacheResponse, FetchOutcome, RemoteCache};
use crate::task::{TargetInfo, TargetKind, TargetNode};
use crate::taskmaster::Taskmaster;
use crate::Task;

/// One entry in the ordered callback transcript recorded by
/// [`MockTask`]/[`MockTaskmaster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Prepare(String),
    Execute(String),
    Executed(String),
    Failed(String),
    Postprocess(String),
    Cleanup,
    Stop,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// A task identified by name, whose `execute()` can be made to fail
/// and whose behavior is fully recorded onto a shared [`EventLog`].
#[derive(Debug, Clone)]
pub struct MockTask {
    pub name: String,
    pub targets: Vec<TargetNode>,
    pub fail_prepare: bool,
    pub fail_execute: bool,
    pub needs_execute: bool,
    events: EventLog,
}

impl MockTask {
    pub fn new(name: impl Into<String>, events: EventLog) -> Self {
        let name = name.into();
        Self {
            targets: vec![TargetNode::new(TargetKind::File, name.clone())],
            name,
            fail_prepare: false,
            fail_execute: false,
            needs_execute: true,
            events,
        }
    }

    pub fn phantom(name: impl Into<String>, events: EventLog) -> Self {
        let mut task = Self::new(name, events);
        task.targets = vec![TargetNode::new(TargetKind::Alias, ".")];
        task
    }

    pub fn no_execute_needed(mut self) -> Self {
        self.needs_execute = false;
        self
    }
}

impl Task for MockTask {
    fn targets(&self) -> &[TargetNode] {
        &self.targets
    }

    fn prepare(&mut self) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(Event::Prepare(self.name.clone()));
        if self.fail_prepare {
            anyhow::bail!("prepare failed for {}", self.name);
        }
        Ok(())
    }

    fn needs_execute(&self) -> bool {
        self.needs_execute
    }

    fn execute(&mut self) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(Event::Execute(self.name.clone()));
        if self.fail_execute {
            anyhow::bail!("execute failed for {}", self.name);
        }
        Ok(())
    }

    fn executed(&mut self, _target_infos: Option<TargetInfo>) {
        self.events.lock().unwrap().push(Event::Executed(self.name.clone()));
    }

    fn failed(&mut self) {
        self.events.lock().unwrap().push(Event::Failed(self.name.clone()));
    }

    fn postprocess(&mut self) {
        self.events.lock().unwrap().push(Event::Postprocess(self.name.clone()));
    }

    fn exception_set(&mut self, _err: anyhow::Error) {
        // Recorded implicitly via `Failed`; the mock only needs to
        // observe that some error occurred, not inspect its message.
    }
}

/// Yields a fixed queue of [`MockTask`]s, then `None` forever (unless
/// `stop()` has been called, which also forces `None` immediately).
pub struct MockTaskmaster {
    pending: VecDeque<MockTask>,
    stopped: bool,
    events: EventLog,
}

impl MockTaskmaster {
    pub fn new(tasks: Vec<MockTask>, events: EventLog) -> Self {
        Self {
            pending: tasks.into(),
            stopped: false,
            events,
        }
    }
}

impl Taskmaster for MockTaskmaster {
    type Task = MockTask;

    fn next_task(&mut self) -> Option<MockTask> {
        if self.stopped {
            return None;
        }
        self.pending.pop_front()
    }

    fn stop(&mut self) {
        self.events.lock().unwrap().push(Event::Stop);
        self.stopped = true;
        self.pending.clear();
    }

    fn cleanup(&mut self) {
        self.events.lock().unwrap().push(Event::Cleanup);
    }
}

/// A `RemoteCache` whose verdict (hit/miss/suspended-not-fetched) is
/// pre-scripted per call, in submission order.
pub struct MockCache {
    pub fetch_enabled: bool,
    verdicts: Mutex<VecDeque<Verdict>>,
    response_tx: Mutex<Option<crossbeam_channel::Sender<CacheResponse<MockTask>>>>,
    pub reset_count: u64,
    pub total_failure_count: u64,
    pub stats: Arc<Mutex<Option<StatsSnapshot>>>,
}

#[derive(Debug, Clone, Copy)]
pub enum Verdict {
    Hit,
    Miss,
    Suspended,
    NotCacheable,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub hit_pct: f64,
    pub cache_count: u64,
    pub hits: u64,
    pub misses: u64,
    pub suspended: u64,
    pub cacheable_pct: f64,
    pub skips: u64,
    pub task_count: u64,
}

impl MockCache {
    pub fn new(verdicts: Vec<Verdict>) -> Self {
        Self {
            fetch_enabled: true,
            verdicts: Mutex::new(verdicts.into()),
            response_tx: Mutex::new(None),
            reset_count: 0,
            total_failure_count: 0,
            stats: Arc::new(Mutex::new(None)),
        }
    }
}

impl RemoteCache<MockTask> for MockCache {
    fn fetch_enabled(&self) -> bool {
        self.fetch_enabled
    }

    fn set_fetch_response_queue(&self, tx: crossbeam_channel::Sender<CacheResponse<MockTask>>) {
        *self.response_tx.lock().unwrap() = Some(tx);
    }

    fn fetch_task(&self, task: MockTask) -> FetchOutcome<MockTask> {
        let verdict = self
            .verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Verdict::NotCacheable);

        match verdict {
            Verdict::Hit => {
                let tx = self.response_tx.lock().unwrap().clone().expect("queue set");
                let _ = tx.send(CacheResponse {
                    task,
                    hit: true,
                    target_infos: Some(b"cached".to_vec()),
                });
                FetchOutcome::Pending
            }
            Verdict::Miss => {
                let tx = self.response_tx.lock().unwrap().clone().expect("queue set");
                let _ = tx.send(CacheResponse {
                    task,
                    hit: false,
                    target_infos: None,
                });
                FetchOutcome::Pending
            }
            Verdict::Suspended => FetchOutcome::NotPending {
                task,
                cacheable: true,
            },
            Verdict::NotCacheable => FetchOutcome::NotPending {
                task,
                cacheable: false,
            },
        }
    }

    fn reset_count(&self) -> u64 {
        self.reset_count
    }

    fn total_failure_count(&self) -> u64 {
        self.total_failure_count
    }

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
        _total_failures: u64,
        _reset_count: u64,
    ) {
        *self.stats.lock().unwrap() = Some(StatsSnapshot {
            hit_pct,
            cache_count,
            hits,
            misses,
            suspended,
            cacheable_pct,
            skips,
            task_count,
        });
    }
}
