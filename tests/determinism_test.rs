//! Integration tests for reproducibility across seeds and worker thread counts

use geodrift::prelude::*;
use geodrift::test_utils::random_gas_config;

fn trajectory(config: SimulationConfig) -> (Vec<Snapshot>, RunSummary) {
    let mut buffer = SnapshotBuffer::for_run(&config.integration);
    let summary = run_simulation(config, &mut buffer);
    (buffer.into_inner(), summary)
}

#[test]
fn test_same_seed_same_trajectory() {
    let config = random_gas_config(40, 42);

    let (first, first_summary) = trajectory(config.clone());
    let (second, second_summary) = trajectory(config);

    assert!(first_summary.termination.is_success());
    assert_eq!(first, second, "Identical seeds must give identical snapshots");
    assert_eq!(first_summary.counters, second_summary.counters);
}

#[test]
fn test_different_seeds_differ() {
    let (first, _) = trajectory(random_gas_config(40, 1));
    let (second, _) = trajectory(random_gas_config(40, 2));

    assert_ne!(
        first[0].particles, second[0].particles,
        "Different seeds should place particles differently"
    );
}

#[test]
fn test_thread_count_does_not_change_trajectory_all_pairs() {
    let mut config = random_gas_config(60, 7);
    config.collisions.pair_search = PairSearch::AllPairs;
    config.integration.max_time = 0.5;
    config.integration.snapshot_interval = 0.1;
    config.parallel.parallel_threshold = 1;

    let runs: Vec<_> = [1, 2, 4, 7]
        .into_iter()
        .map(|threads| {
            let mut config = config.clone();
            config.parallel.worker_threads = threads;
            trajectory(config)
        })
        .collect();

    let (reference, reference_summary) = &runs[0];
    assert!(reference_summary.counters.collisions > 0);
    for (threads, (snapshots, summary)) in [2, 4, 7].iter().zip(&runs[1..]) {
        assert_eq!(
            snapshots, reference,
            "Snapshots changed with {threads} worker threads"
        );
        assert_eq!(summary.counters, reference_summary.counters);
    }
}

#[test]
fn test_thread_count_does_not_change_trajectory_neighbors() {
    let mut config = random_gas_config(300, 11);
    config.integration.max_time = 0.2;
    config.integration.snapshot_interval = 0.05;
    config.parallel.parallel_threshold = 1;

    let mut serial = config.clone();
    serial.parallel.worker_threads = 1;
    let mut parallel = config;
    parallel.parallel.worker_threads = 4;

    let (serial_snapshots, serial_summary) = trajectory(serial);
    let (parallel_snapshots, parallel_summary) = trajectory(parallel);

    assert!(serial_summary.termination.is_success());
    assert_eq!(serial_snapshots, parallel_snapshots);
    assert_eq!(serial_summary.steps, parallel_summary.steps);
}
