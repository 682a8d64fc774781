//! S2: parallel execution with one failing task among several.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use buildjobs::config::JobsConfig;
use buildjobs::test_support::{Event, MockTask, MockTaskmaster};
use buildjobs::JobsFacade;

#[test]
fn s2_parallel_with_one_failure_isolates_it() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let names = ["A", "B", "C", "D", "E"];
    let mut tasks: Vec<MockTask> = names
        .iter()
        .map(|name| MockTask::new(*name, events.clone()))
        .collect();
    tasks[2].fail_execute = true; // "C"

    let taskmaster = MockTaskmaster::new(tasks, events.clone());
    let config: JobsConfig<MockTask> = JobsConfig::new(4);
    let facade = JobsFacade::new(config);

    facade.run(taskmaster, || {});

    let log = events.lock().unwrap().clone();

    // Every task postprocessed exactly once.
    for name in names {
        let count = log
            .iter()
            .filter(|e| **e == Event::Postprocess(name.to_string()))
            .count();
        assert_eq!(count, 1, "{name} postprocessed {count} times");
    }

    // C failed exactly once; everyone else executed successfully.
    let failed: HashSet<_> = log
        .iter()
        .filter_map(|e| match e {
            Event::Failed(name) => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(failed, HashSet::from(["C".to_string()]));

    for name in names.iter().filter(|&&n| n != "C") {
        assert!(log.contains(&Event::Executed(name.to_string())));
    }
}

/// Invariant 3 (no leaks): cleanup is observed exactly once and occurs
/// after every task has been postprocessed.
#[test]
fn cleanup_runs_once_after_all_postprocess() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let tasks: Vec<MockTask> = (0..8)
        .map(|i| MockTask::new(format!("t{i}"), events.clone()))
        .collect();
    let taskmaster = MockTaskmaster::new(tasks, events.clone());
    let config: JobsConfig<MockTask> = JobsConfig::new(3);
    let facade = JobsFacade::new(config);

    facade.run(taskmaster, || {});

    let log = events.lock().unwrap().clone();
    let cleanup_count = log.iter().filter(|e| **e == Event::Cleanup).count();
    assert_eq!(cleanup_count, 1);
    assert_eq!(log.last(), Some(&Event::Cleanup));
}
