// Hashing engine
//
// The single consumer loop over the job queue. Each file is read through a
// pair of buffers: while the digest workers consume the freshly filled
// buffer, the engine reads the next stretch into the other one, then the
// roles swap. The round barrier is carried by Arc uniqueness — workers
// drop their shared view before acknowledging, so the engine regains
// exclusive access to a buffer before it reuses it.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{unbounded, Sender};
use tracing::{debug, error, info};

use crate::config::Options;
use crate::digest::worker::{spawn_worker, Handoff};
use crate::digest::HashKind;
use crate::job::{FileRecord, Job, JobMode};
use crate::queue::JobQueue;

/// Fired for every file that reaches a terminal state.
pub type FileCallback = Box<dyn Fn(&FileRecord) + Send + Sync>;
/// Fired when a job's file loop finishes.
pub type JobCallback = Box<dyn Fn(&Job) + Send + Sync>;
/// Receives the final sorted records of an action-mode job; the writing
/// collaborator (filename/stream/checksum-file) lives behind this.
pub type ActionCallback = Box<dyn Fn(&Job, &[&FileRecord]) + Send + Sync>;

enum FileOutcome {
    Completed,
    Errored,
    Stopped,
}

pub struct HashingEngine {
    queue: Arc<JobQueue>,
    options: Options,
    stop: Arc<AtomicBool>,
    file_callback: Option<FileCallback>,
    job_callback: Option<JobCallback>,
    action_callback: Option<ActionCallback>,
}

impl HashingEngine {
    pub fn new(queue: Arc<JobQueue>, options: Options) -> Self {
        Self {
            queue,
            options,
            stop: Arc::new(AtomicBool::new(false)),
            file_callback: None,
            job_callback: None,
            action_callback: None,
        }
    }

    /// Set a callback fired per finished file.
    pub fn with_file_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FileRecord) + Send + Sync + 'static,
    {
        self.file_callback = Some(Box::new(callback));
        self
    }

    /// Set a callback fired per finished job.
    pub fn with_job_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Job) + Send + Sync + 'static,
    {
        self.job_callback = Some(Box::new(callback));
        self
    }

    /// Set the collaborator receiving action-mode results.
    pub fn with_action_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Job, &[&FileRecord]) + Send + Sync + 'static,
    {
        self.action_callback = Some(Box::new(callback));
        self
    }

    /// Cooperative stop flag, checked once per buffer round.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Drain the queue until it is closed and empty, or until stopped.
    pub fn run(&self) {
        while let Some(mut job) = self.queue.pop() {
            let active = job.active_kinds();
            for &kind in &active {
                job.calculated[kind.index()] = true;
            }
            info!(
                files = job.files.len(),
                algorithms = active.len(),
                "processing job"
            );

            let mut idx = 0;
            let mut stopped = false;
            while idx < job.files.len() {
                let rec = &mut job.files[idx];
                let mut file_done = true;
                if rec.error.is_none() && !active.is_empty() {
                    file_done = self.hash_file(rec, &active);
                }
                if file_done {
                    let rec = &mut job.files[idx];
                    if !rec.reported {
                        rec.reported = true;
                        self.queue.record_file(rec);
                        if let Some(callback) = &self.file_callback {
                            callback(rec);
                        }
                    }
                    idx += 1;
                }
                if self.stop.load(Ordering::SeqCst) {
                    // The in-flight round already finished; everything not
                    // yet terminal leaves the job and the pending total.
                    let removed = job.files.len() - idx;
                    job.files.truncate(idx);
                    self.queue.discount_files(removed);
                    stopped = true;
                    break;
                }
            }

            if stopped {
                self.queue.drain_all();
                if !job.files.is_empty() {
                    debug!(kept = job.files.len(), "requeueing cancellation residue");
                    self.queue.requeue(job);
                }
                return;
            }

            let writes_results = matches!(
                job.mode,
                JobMode::WriteFilename(_) | JobMode::WriteStream | JobMode::WriteHashFile(_)
            );
            if writes_results {
                if let Some(action) = &self.action_callback {
                    let mut final_list: Vec<&FileRecord> = job.files.iter().collect();
                    // Pointer-stable, content-free ordering; for records in
                    // one Vec this is list order.
                    final_list.sort_by_key(|r| *r as *const FileRecord as usize);
                    action(&job, &final_list);
                }
            }

            if let Some(callback) = &self.job_callback {
                callback(&job);
            }
            if !job.files.is_empty() {
                self.queue.finish_job(job);
            }
        }
    }

    /// Hash one file with the active algorithms. Returns false only when a
    /// stop request left the file unfinished.
    fn hash_file(&self, rec: &mut FileRecord, active: &[HashKind]) -> bool {
        let started = Instant::now();
        let mut file = match File::open(&rec.path) {
            Ok(file) => file,
            Err(err) => {
                rec.set_error(&err);
                return true;
            }
        };

        let buf_size = self.options.buffer_bytes();
        let mut front: Arc<Vec<u8>> = Arc::new(vec![0u8; buf_size]);
        let mut back: Arc<Vec<u8>> = Arc::new(vec![0u8; buf_size]);

        let (ready_tx, ready_rx) = unbounded();
        let mut feeds: Vec<Sender<Handoff>> = Vec::with_capacity(active.len());
        let mut workers = Vec::with_capacity(active.len());
        for &kind in active {
            let (feed_tx, feed_rx) = unbounded();
            match spawn_worker(kind, feed_rx, ready_tx.clone()) {
                Ok(handle) => {
                    feeds.push(feed_tx);
                    workers.push((kind, handle));
                }
                Err(err) => {
                    // Without its worker threads the engine cannot uphold
                    // its invariants; resource exhaustion ends the process.
                    error!(%err, "failed to spawn digest worker");
                    std::process::exit(1);
                }
            }
        }
        drop(ready_tx);

        let mut front_len = match fill_buffer(&mut file, buffer_mut(&mut front)) {
            Ok(len) => len,
            Err(err) => {
                rec.set_error(&err);
                drop(feeds);
                discard_workers(workers);
                rec.elapsed_seconds = started.elapsed().as_secs_f32();
                return true;
            }
        };

        let mut outcome = FileOutcome::Completed;
        loop {
            let last = front_len < buf_size;
            for feed in &feeds {
                let _ = feed.send(Handoff {
                    data: Arc::clone(&front),
                    len: front_len,
                });
            }

            // Overlap: pull the next stretch off the disk while the
            // workers are consuming the current one.
            let mut next_read = None;
            if !last {
                next_read = Some(fill_buffer(&mut file, buffer_mut(&mut back)));
            }

            for _ in 0..feeds.len() {
                let _ = ready_rx.recv();
            }

            match next_read {
                None => break,
                Some(Err(err)) => {
                    rec.set_error(&err);
                    outcome = FileOutcome::Errored;
                    break;
                }
                Some(Ok(len)) => {
                    if self.stop.load(Ordering::SeqCst) {
                        outcome = FileOutcome::Stopped;
                        break;
                    }
                    mem::swap(&mut front, &mut back);
                    front_len = len;
                }
            }
        }

        // Disconnecting the feeds releases the workers to finalize.
        drop(feeds);
        let digests = join_workers(workers);
        if matches!(outcome, FileOutcome::Completed) {
            for (kind, digest) in digests {
                let slot = rec.result_mut(kind);
                slot.digest = Some(digest);
                slot.computed = true;
            }
        }
        rec.elapsed_seconds = started.elapsed().as_secs_f32();

        !matches!(outcome, FileOutcome::Stopped)
    }
}

/// Exclusive buffer access at the round barrier. Workers drop their view
/// before acknowledging, so no clone can survive to this point.
fn buffer_mut(buf: &mut Arc<Vec<u8>>) -> &mut [u8] {
    Arc::get_mut(buf).expect("buffer shared past the round barrier")
}

/// Read until the buffer is full or the stream ends. A return shorter than
/// the buffer means end of file.
fn fill_buffer(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn join_workers(workers: Vec<(HashKind, JoinHandle<Vec<u8>>)>) -> Vec<(HashKind, Vec<u8>)> {
    workers
        .into_iter()
        .map(|(kind, handle)| {
            let digest = handle.join().expect("digest worker panicked");
            (kind, digest)
        })
        .collect()
}

fn discard_workers(workers: Vec<(HashKind, JoinHandle<Vec<u8>>)>) {
    let _ = join_workers(workers);
}
