//! Invariant 6 (post-function guarantee) and executor-selection
//! behavior observed end to end through `JobsFacade`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use buildjobs::config::JobsConfig;
use buildjobs::test_support::{MockTask, MockTaskmaster};
use buildjobs::JobsFacade;

#[test]
fn post_function_runs_on_normal_completion() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let taskmaster = MockTaskmaster::new(vec![MockTask::new("only", events.clone())], events);

    let facade: JobsFacade<MockTask> = JobsFacade::new(JobsConfig::default());
    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = ran.clone();
    facade.run(taskmaster, move || ran_clone.store(true, Ordering::SeqCst));

    assert!(ran.load(Ordering::SeqCst));
}

/// Even if the executor loop panics, the post-function must still run
/// before the panic is allowed to propagate.
#[test]
fn post_function_runs_even_if_executor_panics() {
    struct PanickingTaskmaster {
        pulled: bool,
    }

    impl buildjobs::Taskmaster for PanickingTaskmaster {
        type Task = MockTask;

        fn next_task(&mut self) -> Option<MockTask> {
            if !self.pulled {
                self.pulled = true;
                panic!("boom: simulated taskmaster failure");
            }
            None
        }

        fn stop(&mut self) {}
        fn cleanup(&mut self) {}
    }

    let facade: JobsFacade<MockTask> = JobsFacade::new(JobsConfig::default());
    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = ran.clone();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        facade.run(PanickingTaskmaster { pulled: false }, move || {
            ran_clone.store(true, Ordering::SeqCst);
        });
    }));

    assert!(result.is_err(), "the panic should propagate to the caller");
    assert!(
        ran.load(Ordering::SeqCst),
        "post-function must run even though the executor panicked"
    );
}
