//! Installs and restores interrupt/terminate/hangup handling for the
//! lifetime of one `JobsFacade::run()` call.
//!
//! Rust cannot safely call into `Taskmaster::stop()` or do anything
//! beyond the async-signal-safe subset from a true OS signal handler,
//! so unlike the single-threaded original this runs the handler logic
//! on a dedicated background thread fed by `signal_hook`'s self-pipe,
//! the standard idiomatic substitute (see
//! `other_examples/.../pelikan-io-pelikan__...process.rs`, which
//! spawns a named `_signal` thread reading a `signal_hook::iterator::Signals`
//! iterator). The cooperative-flag contract is otherwise identical.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use crate::interrupt::InterruptFlag;
use crate::taskmaster::Taskmaster;

/// Installed for the duration of one `run()`; dropping it (or calling
/// `teardown()` explicitly) restores the pre-existing disposition and
/// stops the background thread.
///
/// While `teardown` is in progress, further signal deliveries are
/// absorbed rather than acted on, so the caller's post-function always
/// runs to completion once teardown begins.
pub struct SignalBridge {
    handle: Option<JoinHandle<()>>,
    torn_down: Arc<AtomicBool>,
    signals_handle: signal_hook::iterator::Handle,
}

impl SignalBridge {
    /// Install handlers for SIGINT, SIGTERM, and (on unix) SIGHUP.
    ///
    /// On delivery: if the current process is still the process that
    /// installed the handler, sets `interrupted` and calls
    /// `taskmaster.stop()`. Otherwise (a forked child that has not yet
    /// replaced its image) the process exits immediately with status 2.
    pub fn install<TM>(
        interrupted: InterruptFlag,
        taskmaster: Arc<std::sync::Mutex<TM>>,
    ) -> Result<Self, crate::error::JobsError>
    where
        TM: Taskmaster + 'static,
    {
        let parent_pid = std::process::id();
        let mut signal_kinds = vec![SIGINT, SIGTERM];
        if cfg!(unix) {
            signal_kinds.push(SIGHUP);
        }

        let mut signals = Signals::new(&signal_kinds).map_err(|source| {
            crate::error::JobsError::SignalInstall {
                signal: "SIGINT/SIGTERM/SIGHUP",
                source,
            }
        })?;
        let signals_handle = signals.handle();

        let torn_down = Arc::new(AtomicBool::new(false));
        let torn_down_for_thread = torn_down.clone();

        let handle = std::thread::Builder::new()
            .name("buildjobs-signal".to_string())
            .spawn(move || {
                for _signal in signals.forever() {
                    if std::process::id() != parent_pid {
                        // Forked child that hasn't replaced its image yet.
                        std::process::exit(2);
                    }
                    if torn_down_for_thread.load(Ordering::SeqCst) {
                        // Teardown in progress: absorb the signal so the
                        // post-function window completes undisturbed.
                        continue;
                    }
                    interrupted.set();
                    if let Ok(mut tm) = taskmaster.lock() {
                        tm.stop();
                    }
                }
            })
            .expect("failed to spawn signal bridge thread");

        Ok(Self {
            handle: Some(handle),
            torn_down,
            signals_handle,
        })
    }

    /// Restore prior signal disposition and stop the background
    /// thread. Safe to call multiple times; idempotent.
    pub fn teardown(mut self) {
        self.torn_down.store(true, Ordering::SeqCst);
        self.signals_handle.close();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        self.torn_down.store(true, Ordering::SeqCst);
        self.signals_handle.close();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockTask, MockTaskmaster};
    use std::time::{Duration, Instant};

    #[test]
    fn install_and_teardown_is_clean() {
        let interrupted = InterruptFlag::new();
        let tm = Arc::new(std::sync::Mutex::new(MockTaskmaster::new(
            Vec::<MockTask>::new(),
            Arc::new(std::sync::Mutex::new(Vec::new())),
        )));

        let bridge = SignalBridge::install(interrupted.clone(), tm).expect("install failed");
        assert!(!interrupted.is_set());
        bridge.teardown();
    }

    #[test]
    fn sigint_sets_the_flag_and_stops_the_taskmaster() {
        let interrupted = InterruptFlag::new();
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let tm = Arc::new(std::sync::Mutex::new(MockTaskmaster::new(
            Vec::<MockTask>::new(),
            events.clone(),
        )));

        let bridge = SignalBridge::install(interrupted.clone(), tm.clone()).expect("install failed");

        unsafe {
            libc::raise(libc::SIGINT);
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        while !interrupted.is_set() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }

        assert!(interrupted.is_set(), "interrupt flag was not set after SIGINT");
        bridge.teardown();

        assert!(events
            .lock()
            .unwrap()
            .contains(&crate::test_support::Event::Stop));
    }
}
