//! Smoke-test CLI: wires a synthetic in-memory taskmaster through
//! `JobsFacade` so the three executors can be exercised and inspected
//! by hand.
//!
//! ```bash
//! jobs-demo --tasks 8 --jobs 4
//! jobs-demo --tasks 8 --jobs 4 --scheduler-v2 --fail-one
//! ```

use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;

use buildjobs::config::JobsConfigArgs;
use buildjobs::test_support::{Event, MockTask, MockTaskmaster, MockCache, Verdict};
use buildjobs::JobsFacade;

#[derive(Parser)]
#[command(name = "jobs-demo")]
#[command(about = "Exercise the serial/parallel/parallel-v2 job executors against a synthetic taskmaster")]
struct Cli {
    #[command(flatten)]
    jobs: JobsConfigArgs,

    /// Number of synthetic tasks to run.
    #[arg(long, default_value_t = 6)]
    tasks: usize,

    /// Make the last task's `execute()` fail, to exercise failure handling.
    #[arg(long)]
    fail_one: bool,

    /// Simulate a remote cache that reports every task a miss.
    #[arg(long)]
    simulate_cache_misses: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let events = Arc::new(Mutex::new(Vec::new()));
    let mut tasks: Vec<MockTask> = (0..cli.tasks)
        .map(|i| MockTask::new(format!("task-{i}"), events.clone()))
        .collect();

    if cli.fail_one {
        if let Some(last) = tasks.last_mut() {
            last.fail_execute = true;
        }
    }

    let taskmaster = MockTaskmaster::new(tasks, events.clone());

    let mut config = cli.jobs.into_config::<MockTask>();
    if cli.simulate_cache_misses {
        let verdicts = vec![Verdict::Miss; cli.tasks];
        config = config.with_remote_cache(Arc::new(MockCache::new(verdicts)));
    }

    let facade = JobsFacade::new(config);
    tracing::info!(selection = ?facade.selection(), "running synthetic build");

    facade.run(taskmaster, || {
        tracing::info!("post-function invoked");
    });

    let log = events.lock().expect("event log poisoned");
    let failures = log.iter().filter(|e| matches!(e, Event::Failed(_))).count();

    println!("ran {} events, {} task failure(s)", log.len(), failures);
    for event in log.iter() {
        println!("  {event:?}");
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
