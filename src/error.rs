//! Crate-level error types.
//!
//! Task failures are opaque (`anyhow::Error`, captured via
//! `Task::exception_set`) and never surface here — only failures that
//! belong to the executor/facade machinery itself do.

use thiserror::Error;

/// Errors raised by the job-execution core outside of individual tasks.
#[derive(Debug, Error)]
pub enum JobsError {
    #[error("failed to install signal handler for {signal}: {source}")]
    SignalInstall {
        signal: &'static str,
        #[source]
        source: std::io::Error,
    },
}
