//! Process-wide interrupt latch.
//!
//! Set by `SignalBridge` when a signal is delivered, read by every
//! executor loop and every worker before it begins a task. Monotonic:
//! once set, never reset for the lifetime of a run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply-cloneable, thread-safe "build was interrupted" flag.
///
/// Never waited on — only polled at safe points. Writers are signal
/// handlers (via `SignalBridge`); readers are the coordinator and
/// worker threads.
#[derive(Clone, Debug, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Mark the flag as set. Idempotent.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the flag has been set since construction.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
