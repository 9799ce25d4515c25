use std::thread;
use std::time::Instant;

use gridzero_selfplay::TrainingExample;

use crate::config::CoordinatorConfig;
use crate::record::{WorkerRecord, WorkerStatus};
use crate::source::{Completion, CompletionSource};

/// What one collection round produced
#[derive(Debug, Clone, Default)]
pub struct IterationReport {
    pub iteration: u32,
    pub expected_workers: usize,
    pub finished: Vec<usize>,
    pub killed: Vec<usize>,
    /// Finished workers whose data was unusable
    pub failed: Vec<usize>,
    pub total_samples: usize,
    pub examples: Vec<TrainingExample>,
}

impl IterationReport {
    pub fn all_finished(&self) -> bool {
        self.killed.is_empty() && self.finished.len() == self.expected_workers
    }
}

/// Collect one iteration's data from `task_ids`.
///
/// Polls every live worker once per round and sleeps `poll_interval` between
/// rounds. Once more than half the workers have finished, the remaining ones
/// get `straggler_timeout` before they are killed. Always returns whatever
/// was collected.
pub fn collect_iteration<S: CompletionSource + ?Sized>(
    source: &mut S,
    config: &CoordinatorConfig,
    iteration: u32,
    task_ids: &[usize],
) -> IterationReport {
    let expected = task_ids.len();
    let recency = config.recency_tag(iteration);
    let mut records: Vec<WorkerRecord> = task_ids.iter().map(|&id| WorkerRecord::new(id)).collect();
    let mut finished = 0usize;
    let mut straggler_clock: Option<Instant> = None;

    log::info!(
        "Collecting iteration {} from {} workers",
        iteration,
        expected
    );

    while finished < expected {
        for record in records.iter_mut().filter(|r| r.is_live()) {
            match source.poll(record.task_id, iteration) {
                Completion::Pending => {}
                Completion::Ready(artifact) => {
                    let n = artifact.len();
                    if record.finish(artifact.into_examples(recency)) {
                        finished += 1;
                        log::debug!(
                            "Task {} finished iteration {} with {} samples",
                            record.task_id,
                            iteration,
                            n
                        );
                    }
                }
                Completion::Malformed(reason) => {
                    log::warn!(
                        "Task {} delivered unusable data for iteration {}: {}",
                        record.task_id,
                        iteration,
                        reason
                    );
                    if record.fail() {
                        finished += 1;
                    }
                }
            }
        }

        if finished == expected {
            break;
        }

        if finished * 2 > expected {
            let started = *straggler_clock.get_or_insert_with(|| {
                log::info!(
                    "{}/{} workers done with iteration {}, waiting for stragglers",
                    finished,
                    expected,
                    iteration
                );
                Instant::now()
            });
            if started.elapsed() > config.straggler_timeout() {
                for record in records.iter_mut().filter(|r| r.is_live()) {
                    record.kill();
                    source.on_killed(record.task_id, iteration);
                    log::warn!(
                        "Killed straggler task {} in iteration {}",
                        record.task_id,
                        iteration
                    );
                }
                break;
            }
        }

        log::debug!(
            "Iteration {}: {}/{} workers finished, sleeping",
            iteration,
            finished,
            expected
        );
        thread::sleep(config.poll_interval());
    }

    let mut report = IterationReport {
        iteration,
        expected_workers: expected,
        ..Default::default()
    };
    for mut record in records {
        match record.status() {
            WorkerStatus::Finished => {
                report.finished.push(record.task_id);
                if record.failed() {
                    report.failed.push(record.task_id);
                }
                report.examples.append(&mut record.take_examples());
            }
            WorkerStatus::Killed => report.killed.push(record.task_id),
            WorkerStatus::Live => {}
        }
    }
    report.total_samples = report.examples.len();

    log::info!(
        "Iteration {} collected {} samples from {}/{} workers ({} killed, {} failed)",
        iteration,
        report.total_samples,
        report.finished.len(),
        expected,
        report.killed.len(),
        report.failed.len()
    );

    report
}
