use std::collections::VecDeque;

use gridzero_selfplay::TrainingExample;

/// The last `window` iterations of collected examples
#[derive(Debug, Clone)]
pub struct ReplayWindow {
    window: usize,
    iterations: VecDeque<(u32, Vec<TrainingExample>)>,
}

impl ReplayWindow {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            iterations: VecDeque::new(),
        }
    }

    /// Add an iteration's examples, evicting the oldest beyond the window
    pub fn push(&mut self, iteration: u32, examples: Vec<TrainingExample>) {
        self.iterations.push_back((iteration, examples));
        while self.iterations.len() > self.window {
            if let Some((evicted, _)) = self.iterations.pop_front() {
                log::debug!("Replay window dropped iteration {}", evicted);
            }
        }
    }

    pub fn num_iterations(&self) -> usize {
        self.iterations.len()
    }

    pub fn len(&self) -> usize {
        self.iterations.iter().map(|(_, e)| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iterations(&self) -> impl Iterator<Item = u32> + '_ {
        self.iterations.iter().map(|&(i, _)| i)
    }

    /// All retained examples, with recency tags shifted so the smallest is 1
    pub fn examples(&self) -> Vec<TrainingExample> {
        let min_tag = self
            .iterations
            .iter()
            .flat_map(|(_, e)| e.iter().map(|x| x.recency))
            .min()
            .unwrap_or(1);
        let shift = min_tag.saturating_sub(1);

        self.iterations
            .iter()
            .flat_map(|(_, e)| e.iter())
            .map(|example| TrainingExample {
                recency: example.recency - shift,
                ..example.clone()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examples(n: usize, recency: u32) -> Vec<TrainingExample> {
        (0..n)
            .map(|_| TrainingExample::new(vec![0.0], vec![1.0], 0.0, recency))
            .collect()
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut replay = ReplayWindow::new(2);
        replay.push(0, examples(3, 1));
        replay.push(1, examples(2, 2));
        replay.push(2, examples(4, 3));

        assert_eq!(replay.num_iterations(), 2);
        assert_eq!(replay.len(), 6);
        assert_eq!(replay.iterations().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_tags_rebased_to_one() {
        let mut replay = ReplayWindow::new(3);
        for i in 0..5u32 {
            replay.push(i, examples(1, i + 1));
        }
        let tags: Vec<u32> = replay.examples().iter().map(|e| e.recency).collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn test_constant_tags_stay_at_one() {
        let mut replay = ReplayWindow::new(2);
        for i in 0..4u32 {
            replay.push(i, examples(2, 1));
        }
        assert!(replay.examples().iter().all(|e| e.recency == 1));
    }

    #[test]
    fn test_empty_window() {
        let replay = ReplayWindow::new(0);
        assert!(replay.is_empty());
        assert!(replay.examples().is_empty());
    }
}
