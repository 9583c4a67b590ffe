// Job queue
//
// Two independently locked halves: a pending FIFO drained by the single
// engine loop, and a completed list whose aggregate counters back any
// concurrent status display. All counter updates go through queue methods
// so readers never see a torn count.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use serde::Serialize;

use crate::job::{FileRecord, Job};

/// Aggregate progress counters over every submitted job.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Counters {
    /// Files known to the queue (submitted minus cancelled).
    pub total_files: u64,
    /// Files that reached a terminal state.
    pub done_files: u64,
    /// Files that ended with an OS error.
    pub error_files: u64,
}

#[derive(Default)]
struct Completed {
    jobs: Vec<Job>,
    counters: Counters,
}

struct Pending {
    jobs: VecDeque<Job>,
    closed: bool,
}

pub struct JobQueue {
    pending: Mutex<Pending>,
    available: Condvar,
    completed: Mutex<Completed>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Pending {
                jobs: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
            completed: Mutex::new(Completed::default()),
        }
    }

    /// Enqueue a freshly prepared job. Safe from any thread, counts the
    /// job's files into the aggregate total.
    pub fn submit(&self, job: Job) {
        {
            let mut completed = self.completed.lock().unwrap();
            completed.counters.total_files += job.files.len() as u64;
        }
        let mut pending = self.pending.lock().unwrap();
        pending.jobs.push_back(job);
        self.available.notify_one();
    }

    /// Return a cancellation residue to the queue. Its files were counted
    /// at submission, so the total is left alone.
    pub fn requeue(&self, job: Job) {
        let mut pending = self.pending.lock().unwrap();
        pending.jobs.push_back(job);
        self.available.notify_one();
    }

    /// Mark the producer side finished: once the pending list runs dry,
    /// `pop` returns `None` and the consumer loop can exit.
    pub fn close(&self) {
        let mut pending = self.pending.lock().unwrap();
        pending.closed = true;
        self.available.notify_all();
    }

    /// Blocking dequeue for the single consumer loop.
    pub fn pop(&self) -> Option<Job> {
        let mut pending = self.pending.lock().unwrap();
        loop {
            if let Some(job) = pending.jobs.pop_front() {
                return Some(job);
            }
            if pending.closed {
                return None;
            }
            pending = self.available.wait(pending).unwrap();
        }
    }

    /// Atomically empty the pending list (full cancellation), discounting
    /// the drained files from the aggregate total.
    pub fn drain_all(&self) -> Vec<Job> {
        let drained: Vec<Job> = {
            let mut pending = self.pending.lock().unwrap();
            pending.jobs.drain(..).collect()
        };
        let removed: u64 = drained.iter().map(|j| j.files.len() as u64).sum();
        if removed > 0 {
            let mut completed = self.completed.lock().unwrap();
            completed.counters.total_files -= removed.min(completed.counters.total_files);
        }
        drained
    }

    /// Record one file's terminal outcome. Done/error counts move together
    /// under the completed-list lock.
    pub fn record_file(&self, record: &FileRecord) {
        let mut completed = self.completed.lock().unwrap();
        completed.counters.done_files += 1;
        if record.error.is_some() {
            completed.counters.error_files += 1;
        }
    }

    /// Remove files that will never be processed (cancellation trim).
    pub fn discount_files(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut completed = self.completed.lock().unwrap();
        let count = count as u64;
        completed.counters.total_files -= count.min(completed.counters.total_files);
    }

    /// Move a finished job onto the completed list.
    pub fn finish_job(&self, job: Job) {
        let mut completed = self.completed.lock().unwrap();
        completed.jobs.push(job);
    }

    /// Snapshot of the aggregate counters for a status reader.
    pub fn counts(&self) -> Counters {
        self.completed.lock().unwrap().counters
    }

    /// Number of jobs on the completed list.
    pub fn completed_jobs(&self) -> usize {
        self.completed.lock().unwrap().jobs.len()
    }

    /// Drain the completed list (the UI takes ownership of finished jobs).
    pub fn take_completed(&self) -> Vec<Job> {
        let mut completed = self.completed.lock().unwrap();
        std::mem::take(&mut completed.jobs)
    }

    /// Number of jobs waiting to be processed.
    pub fn pending_jobs(&self) -> usize {
        self.pending.lock().unwrap().jobs.len()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
