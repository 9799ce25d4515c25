use gridzero_selfplay::TrainingExample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Live,
    Finished,
    Killed,
}

/// Per-iteration bookkeeping for one worker task.
///
/// A record leaves `Live` exactly once, either to `Finished` or `Killed`.
#[derive(Debug, Clone)]
pub struct WorkerRecord {
    pub task_id: usize,
    status: WorkerStatus,
    examples: Vec<TrainingExample>,
    failed: bool,
}

impl WorkerRecord {
    pub fn new(task_id: usize) -> Self {
        Self {
            task_id,
            status: WorkerStatus::Live,
            examples: Vec::new(),
            failed: false,
        }
    }

    pub fn status(&self) -> WorkerStatus {
        self.status
    }

    pub fn is_live(&self) -> bool {
        self.status == WorkerStatus::Live
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    pub fn take_examples(&mut self) -> Vec<TrainingExample> {
        std::mem::take(&mut self.examples)
    }

    /// Live -> Finished with the worker's data. Returns false if the record
    /// had already left `Live`.
    pub fn finish(&mut self, examples: Vec<TrainingExample>) -> bool {
        if !self.is_live() {
            return false;
        }
        self.status = WorkerStatus::Finished;
        self.examples = examples;
        true
    }

    /// Live -> Finished without data, after a malformed artifact
    pub fn fail(&mut self) -> bool {
        if !self.finish(Vec::new()) {
            return false;
        }
        self.failed = true;
        true
    }

    /// Live -> Killed
    pub fn kill(&mut self) -> bool {
        if !self.is_live() {
            return false;
        }
        self.status = WorkerStatus::Killed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_happen_once() {
        let mut record = WorkerRecord::new(3);
        assert!(record.is_live());
        assert!(record.finish(vec![TrainingExample::new(vec![], vec![], 1.0, 1)]));
        assert_eq!(record.status(), WorkerStatus::Finished);

        assert!(!record.kill());
        assert!(!record.finish(Vec::new()));
        assert_eq!(record.status(), WorkerStatus::Finished);
        assert_eq!(record.examples().len(), 1);
    }

    #[test]
    fn test_killed_record_stays_killed() {
        let mut record = WorkerRecord::new(0);
        assert!(record.kill());
        assert!(!record.finish(Vec::new()));
        assert!(!record.fail());
        assert_eq!(record.status(), WorkerStatus::Killed);
        assert!(!record.failed());
    }

    #[test]
    fn test_failed_record_is_finished_without_data() {
        let mut record = WorkerRecord::new(1);
        assert!(record.fail());
        assert_eq!(record.status(), WorkerStatus::Finished);
        assert!(record.failed());
        assert!(record.examples().is_empty());
    }
}
