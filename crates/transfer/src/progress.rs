use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::{FileRecord, TaskId};

/// Receives cumulative byte counts from a transport for one file.
///
/// Transports call [`update`](Self::update) at chunk boundaries with the
/// total number of bytes sent so far for the current attempt.
pub trait ProgressSink: Send + Sync {
    fn update(&self, bytes_so_far: u64);
}

/// Per-task progress display.
///
/// Called concurrently from every running task. Implementations keep one
/// counter per [`TaskId`] and never mix counts across tasks.
pub trait ProgressReporter: Send + Sync {
    /// A task was admitted and is about to start transferring.
    fn task_started(&self, id: TaskId, file: &FileRecord);

    /// `delta` more bytes of task `id` reached the destination.
    fn on_bytes(&self, id: TaskId, delta: u64);

    /// The task reached a terminal state.
    fn task_finished(&self, id: TaskId, success: bool);
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn task_started(&self, _id: TaskId, _file: &FileRecord) {}
    fn on_bytes(&self, _id: TaskId, _delta: u64) {}
    fn task_finished(&self, _id: TaskId, _success: bool) {}
}

// ---------------------------------------------------------------------------
// TaskProgress
// ---------------------------------------------------------------------------

/// Adapts a transport's cumulative updates into reporter deltas for one task.
///
/// Only bytes past the high-water mark are forwarded, so an attempt that
/// restarts from zero after a retry does not count the same bytes twice.
pub struct TaskProgress {
    id: TaskId,
    reporter: Arc<dyn ProgressReporter>,
    high_water: AtomicU64,
}

impl TaskProgress {
    pub fn new(id: TaskId, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            id,
            reporter,
            high_water: AtomicU64::new(0),
        }
    }

    /// Highest cumulative byte count seen so far.
    pub fn transferred(&self) -> u64 {
        self.high_water.load(Ordering::Acquire)
    }
}

impl ProgressSink for TaskProgress {
    fn update(&self, bytes_so_far: u64) {
        let prev = self.high_water.fetch_max(bytes_so_far, Ordering::AcqRel);
        if bytes_so_far > prev {
            self.reporter.on_bytes(self.id, bytes_so_far - prev);
        }
    }
}
