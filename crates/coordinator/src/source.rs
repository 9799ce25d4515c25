use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use gridzero_selfplay::storage::{artifact_exists, artifact_file, ARTIFACT_KINDS};
use gridzero_selfplay::{load_artifact, Artifact, ArtifactPaths};

/// Outcome of polling one worker
#[derive(Debug)]
pub enum Completion {
    /// Nothing delivered yet
    Pending,
    /// The worker's artifact for the iteration
    Ready(Artifact),
    /// The worker delivered something unusable
    Malformed(String),
}

/// Where the coordinator learns that a worker has finished an iteration
pub trait CompletionSource {
    /// Check once, without blocking, whether `task_id` has delivered
    /// `iteration`. Data is handed out at most once.
    fn poll(&mut self, task_id: usize, iteration: u32) -> Completion;

    /// `task_id` was cut off for `iteration`; anything it delivers later for
    /// that iteration must be dropped.
    fn on_killed(&mut self, _task_id: usize, _iteration: u32) {}
}

impl<S: CompletionSource + ?Sized> CompletionSource for &mut S {
    fn poll(&mut self, task_id: usize, iteration: u32) -> Completion {
        (**self).poll(task_id, iteration)
    }

    fn on_killed(&mut self, task_id: usize, iteration: u32) {
        (**self).on_killed(task_id, iteration)
    }
}

impl<S: CompletionSource + ?Sized> CompletionSource for Box<S> {
    fn poll(&mut self, task_id: usize, iteration: u32) -> Completion {
        (**self).poll(task_id, iteration)
    }

    fn on_killed(&mut self, task_id: usize, iteration: u32) {
        (**self).on_killed(task_id, iteration)
    }
}

/// Size and modification time of each artifact file
type Fingerprint = Vec<Option<(u64, Option<SystemTime>)>>;

/// An artifact that exists but failed to load
struct Unreadable {
    fingerprint: Fingerprint,
    since: Instant,
}

/// Polls npy artifact triples written by worker processes.
///
/// An artifact that fails to load stays `Pending` while its files keep
/// changing, and is reported malformed only once they have been unchanged
/// for `settle_time`.
pub struct FsSource {
    paths: ArtifactPaths,
    settle_time: Duration,
    unreadable: HashMap<(usize, u32), Unreadable>,
}

impl FsSource {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            settle_time: Duration::from_secs(30),
            unreadable: HashMap::new(),
        }
    }

    pub fn with_settle_time(mut self, settle_time: Duration) -> Self {
        self.settle_time = settle_time;
        self
    }
}

fn fingerprint(prefix: &Path) -> Fingerprint {
    ARTIFACT_KINDS
        .iter()
        .map(|kind| {
            fs::metadata(artifact_file(prefix, kind))
                .ok()
                .map(|m| (m.len(), m.modified().ok()))
        })
        .collect()
}

impl CompletionSource for FsSource {
    fn poll(&mut self, task_id: usize, iteration: u32) -> Completion {
        let prefix = self.paths.prefix(task_id, iteration);
        if !artifact_exists(&prefix) {
            return Completion::Pending;
        }
        let key = (task_id, iteration);
        let error = match load_artifact(&prefix) {
            Ok(artifact) => {
                self.unreadable.remove(&key);
                return Completion::Ready(artifact);
            }
            Err(e) => e,
        };

        let current = fingerprint(&prefix);
        let settled = match self.unreadable.get(&key) {
            Some(seen) if seen.fingerprint == current => {
                Some(seen.since.elapsed() >= self.settle_time)
            }
            _ => None,
        };
        match settled {
            Some(true) => {
                self.unreadable.remove(&key);
                Completion::Malformed(format!("{}: {error:#}", prefix.display()))
            }
            Some(false) => Completion::Pending,
            None => {
                log::debug!(
                    "Artifact {} not readable yet: {:#}",
                    prefix.display(),
                    error
                );
                self.unreadable.insert(
                    key,
                    Unreadable {
                        fingerprint: current,
                        since: Instant::now(),
                    },
                );
                Completion::Pending
            }
        }
    }
}

/// A worker's delivery for one iteration
#[derive(Debug)]
pub struct WorkerMessage {
    pub task_id: usize,
    pub iteration: u32,
    pub payload: std::result::Result<Artifact, String>,
}

/// Receives deliveries from in-process workers over a channel
pub struct ChannelSource {
    receiver: Receiver<WorkerMessage>,
    buffered: HashMap<(usize, u32), std::result::Result<Artifact, String>>,
    killed: HashSet<(usize, u32)>,
    current_iteration: u32,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<WorkerMessage>) -> Self {
        Self {
            receiver,
            buffered: HashMap::new(),
            killed: HashSet::new(),
            current_iteration: 0,
        }
    }

    /// Source plus the sender that workers report through
    pub fn unbounded() -> (Sender<WorkerMessage>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (tx, Self::new(rx))
    }

    fn drain(&mut self) {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => self.accept(message),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn accept(&mut self, message: WorkerMessage) {
        let key = (message.task_id, message.iteration);
        if self.killed.contains(&key) {
            log::debug!(
                "Dropping late data from killed task {} for iteration {}",
                message.task_id,
                message.iteration
            );
            return;
        }
        if message.iteration < self.current_iteration {
            log::debug!(
                "Dropping stale data from task {} for iteration {}",
                message.task_id,
                message.iteration
            );
            return;
        }
        self.buffered.insert(key, message.payload);
    }
}

impl CompletionSource for ChannelSource {
    fn poll(&mut self, task_id: usize, iteration: u32) -> Completion {
        if iteration > self.current_iteration {
            self.current_iteration = iteration;
            self.buffered.retain(|&(_, i), _| i >= iteration);
        }
        self.drain();

        match self.buffered.remove(&(task_id, iteration)) {
            None => Completion::Pending,
            Some(Ok(artifact)) => Completion::Ready(artifact),
            Some(Err(reason)) => Completion::Malformed(reason),
        }
    }

    fn on_killed(&mut self, task_id: usize, iteration: u32) {
        self.killed.insert((task_id, iteration));
        self.buffered.remove(&(task_id, iteration));
    }
}
