use std::collections::HashMap;
use std::path::Path;
use std::thread;
use std::time::Duration;

use gridzero_coordinator::{
    collect_iteration, run_worker, spawn_local_workers, ChannelSource, Completion,
    CompletionSource, Coordinator, CoordinatorConfig, FsOutput, FsSource, GameKind, WorkerConfig,
};
use gridzero_mcts::MctsConfig;
use gridzero_selfplay::Artifact;
use ndarray::{Array1, Array2, Array4};

fn artifact(n: usize) -> Artifact {
    Artifact {
        states: Array4::zeros((n, 3, 4, 4)),
        distributions: Array2::from_elem((n, 4), 0.25),
        outcomes: Array1::zeros(n),
    }
}

/// What a scripted worker does in every iteration
#[derive(Clone, Copy)]
enum Script {
    /// Deliver `samples` after `polls` polls
    Deliver { polls: u32, samples: usize },
    Malformed,
    Hang,
}

struct ScriptedSource {
    scripts: HashMap<usize, Script>,
    polls: HashMap<(usize, u32), u32>,
    killed: Vec<(usize, u32)>,
}

impl ScriptedSource {
    fn new(scripts: impl IntoIterator<Item = (usize, Script)>) -> Self {
        Self {
            scripts: scripts.into_iter().collect(),
            polls: HashMap::new(),
            killed: Vec::new(),
        }
    }
}

impl CompletionSource for ScriptedSource {
    fn poll(&mut self, task_id: usize, iteration: u32) -> Completion {
        assert!(
            !self.killed.contains(&(task_id, iteration)),
            "killed task {task_id} polled again"
        );
        let count = self.polls.entry((task_id, iteration)).or_insert(0);
        *count += 1;
        match self.scripts[&task_id] {
            Script::Deliver { polls, samples } if *count >= polls => {
                Completion::Ready(artifact(samples))
            }
            Script::Malformed => Completion::Malformed("truncated file".to_string()),
            _ => Completion::Pending,
        }
    }

    fn on_killed(&mut self, task_id: usize, iteration: u32) {
        self.killed.push((task_id, iteration));
    }
}

fn fast_config(num_workers: usize) -> CoordinatorConfig {
    CoordinatorConfig {
        game: GameKind::ConnectK { rows: 4, cols: 4, k: 3 },
        num_workers,
        num_iterations: 3,
        poll_interval_ms: 1,
        straggler_timeout_ms: 30,
        export_training_data: false,
        ..Default::default()
    }
}

#[test]
fn all_workers_finishing_sums_their_samples() {
    let mut source = ScriptedSource::new([
        (0, Script::Deliver { polls: 1, samples: 3 }),
        (1, Script::Deliver { polls: 2, samples: 5 }),
        (2, Script::Deliver { polls: 4, samples: 7 }),
    ]);
    let config = fast_config(3);

    let report = collect_iteration(&mut source, &config, 2, &[0, 1, 2]);
    assert!(report.all_finished());
    assert_eq!(report.total_samples, 15);
    assert_eq!(report.examples.len(), 15);
    assert!(report.killed.is_empty());
    // Linear weighting tags iteration 2 with 3
    assert!(report.examples.iter().all(|e| e.recency == 3));
}

#[test]
fn stragglers_are_killed_after_the_timeout() {
    let mut source = ScriptedSource::new([
        (0, Script::Deliver { polls: 1, samples: 2 }),
        (1, Script::Deliver { polls: 1, samples: 2 }),
        (2, Script::Deliver { polls: 3, samples: 2 }),
        (3, Script::Hang),
        (4, Script::Hang),
    ]);
    let config = fast_config(5);

    let report = collect_iteration(&mut source, &config, 0, &[0, 1, 2, 3, 4]);
    let mut finished = report.finished.clone();
    finished.sort_unstable();
    assert_eq!(finished, vec![0, 1, 2]);
    assert_eq!(report.killed, vec![3, 4]);
    assert_eq!(report.total_samples, 6);
    assert_eq!(source.killed, vec![(3, 0), (4, 0)]);
}

#[test]
fn no_cutoff_until_more_than_half_finish() {
    // 1 of 2 finished is not a majority, so the hanging worker is waited for
    let mut source = ScriptedSource::new([
        (0, Script::Deliver { polls: 1, samples: 1 }),
        (1, Script::Deliver { polls: 80, samples: 1 }),
    ]);
    let config = fast_config(2);

    let report = collect_iteration(&mut source, &config, 0, &[0, 1]);
    assert!(report.all_finished());
    assert_eq!(report.total_samples, 2);
}

#[test]
fn malformed_artifact_counts_as_failed() {
    let mut source = ScriptedSource::new([
        (0, Script::Deliver { polls: 1, samples: 4 }),
        (1, Script::Malformed),
    ]);
    let mut config = fast_config(2);
    config.linear_weighting = false;

    let report = collect_iteration(&mut source, &config, 5, &[0, 1]);
    assert_eq!(report.finished.len(), 2);
    assert_eq!(report.failed, vec![1]);
    assert_eq!(report.total_samples, 4);
    assert!(report.examples.iter().all(|e| e.recency == 1));
}

#[test]
fn half_written_artifact_is_collected_once_complete() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoordinatorConfig {
        data_root: dir.path().to_path_buf(),
        straggler_timeout_ms: 60_000,
        ..fast_config(1)
    };
    let prefix = config.artifact_paths().prefix(0, 0);
    artifact(4).save(&prefix).unwrap();

    let outcomes = gridzero_selfplay::storage::artifact_file(&prefix, "outcomes");
    let bytes = std::fs::read(&outcomes).unwrap();
    std::fs::write(&outcomes, &bytes[..bytes.len() / 2]).unwrap();

    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(40));
        std::fs::write(&outcomes, &bytes).unwrap();
    });

    let mut source = config.fs_source();
    let report = collect_iteration(&mut source, &config, 0, &[0]);
    writer.join().unwrap();

    assert_eq!(report.finished, vec![0]);
    assert!(report.failed.is_empty());
    assert_eq!(report.total_samples, 4);
}

#[test]
fn coordinator_drops_killed_workers_and_rebases_tags() {
    let source = ScriptedSource::new([
        (0, Script::Deliver { polls: 1, samples: 1 }),
        (1, Script::Deliver { polls: 1, samples: 1 }),
        (2, Script::Hang),
    ]);
    let config = CoordinatorConfig {
        replay_window: 2,
        ..fast_config(3)
    };

    let mut coordinator = Coordinator::new(config, source).unwrap();
    let reports = coordinator.run().unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].killed, vec![2]);
    assert_eq!(coordinator.roster(), &[0, 1]);
    assert!(reports[1].all_finished());

    // Iterations 1 and 2 remain, tagged 2 and 3 before rebasing
    let mut tags: Vec<u32> = coordinator.replay().examples().iter().map(|e| e.recency).collect();
    tags.sort_unstable();
    assert_eq!(tags, vec![1, 1, 2, 2]);
}

#[test]
fn coordinator_exports_training_window() {
    let dir = tempfile::tempdir().unwrap();
    let source = ScriptedSource::new([(0, Script::Deliver { polls: 1, samples: 2 })]);
    let config = CoordinatorConfig {
        run_name: "t".to_string(),
        data_root: dir.path().to_path_buf(),
        export_training_data: true,
        num_iterations: 1,
        ..fast_config(1)
    };

    let mut coordinator = Coordinator::new(config.clone(), source).unwrap();
    coordinator.run().unwrap();

    let prefix = config.training_prefix(0);
    assert!(gridzero_selfplay::storage::artifact_exists(&prefix));
    assert!(gridzero_selfplay::storage::artifact_file(&prefix, "recency").is_file());
}

fn tiny_workers(data_root: &Path, num_workers: usize) -> WorkerConfig {
    WorkerConfig {
        run_name: "tiny".to_string(),
        data_root: data_root.to_path_buf(),
        game: GameKind::ConnectK { rows: 4, cols: 4, k: 3 },
        num_iterations: 2,
        num_workers,
        games_per_iteration: 1,
        initial_games_per_iteration: 1,
        search_iterations: 8,
        initial_search_iterations: 8,
        mcts: MctsConfig::default().with_dirichlet_noise(0.5, 0.25),
        fixed_model: Some("uniform".to_string()),
        ..Default::default()
    }
}

#[test]
fn local_workers_feed_the_coordinator_over_a_channel() {
    let dir = tempfile::tempdir().unwrap();
    let workers = tiny_workers(dir.path(), 3);
    let config = CoordinatorConfig {
        num_iterations: 2,
        straggler_timeout_ms: 60_000,
        ..fast_config(3)
    };

    let (sender, source) = ChannelSource::unbounded();
    let handles = spawn_local_workers(&workers, &[0, 1, 2], &sender).unwrap();
    drop(sender);

    let mut coordinator = Coordinator::new(config, source).unwrap();
    let reports = coordinator.run().unwrap();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(reports.len(), 2);
    for report in &reports {
        assert!(report.all_finished(), "{report:?}");
        assert!(report.total_samples > 0);
        // Every example is a legal distribution for a 4-column board
        for example in &report.examples {
            assert_eq!(example.policy.len(), 4);
            assert!((example.policy.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        }
    }
}

#[test]
fn filesystem_worker_and_source_agree_on_layout() {
    let dir = tempfile::tempdir().unwrap();
    let workers = WorkerConfig {
        num_iterations: 1,
        num_groups: 2,
        ..tiny_workers(dir.path(), 4)
    };
    run_worker(&workers, 3, &mut FsOutput::new(workers.artifact_paths())).unwrap();

    let mut source = FsSource::new(workers.artifact_paths());
    assert!(matches!(source.poll(3, 0), Completion::Ready(_)));
    assert!(matches!(source.poll(2, 0), Completion::Pending));
    assert!(dir.path().join("games/tiny/1/3").is_dir());
}

#[test]
fn worker_reports_missing_model_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    let workers = WorkerConfig {
        fixed_model: None,
        model_poll_interval_ms: 1,
        model_timeout_ms: Some(5),
        ..tiny_workers(dir.path(), 1)
    };

    // Iteration 0 runs on the uniform sentinel, iteration 1 waits for a model
    // that never appears
    let (sender, mut source) = ChannelSource::unbounded();
    let mut worker_sender = sender.clone();
    assert!(run_worker(&workers, 0, &mut worker_sender).is_err());

    assert!(matches!(source.poll(0, 0), Completion::Ready(_)));
    assert!(matches!(source.poll(0, 1), Completion::Malformed(_)));
}
