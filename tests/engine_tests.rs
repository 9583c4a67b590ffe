// End-to-end tests for the hashing engine

use std::fs;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use hashmill::{
    hasher_for, prepare_job, FileStatus, HashKind, HashingEngine, Job, JobMode, JobQueue, Options,
};

fn reference_hex(kind: HashKind, data: &[u8]) -> String {
    let mut hasher = hasher_for(kind);
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn run_job(mut job: Job, options: Options) -> (Arc<JobQueue>, Vec<Job>) {
    prepare_job(&mut job, &options).unwrap();
    let queue = Arc::new(JobQueue::new());
    queue.submit(job);
    queue.close();

    let engine = HashingEngine::new(Arc::clone(&queue), options);
    engine.run();

    let done = queue.take_completed();
    (queue, done)
}

#[test]
fn hashes_a_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greeting.txt");
    fs::write(&path, b"hello world").unwrap();

    let mut job = Job::new(vec![path], JobMode::Normal);
    job.request(HashKind::Sha256);
    let (queue, done) = run_job(job, Options::default());

    assert_eq!(done.len(), 1);
    let rec = &done[0].files[0];
    let slot = rec.result(HashKind::Sha256);
    assert!(slot.computed);
    assert_eq!(
        slot.digest.as_deref().map(hex::encode),
        Some("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9".to_string())
    );
    assert_eq!(rec.status(), FileStatus::Done);

    let counts = queue.counts();
    assert_eq!(counts.done_files, 1);
    assert_eq!(counts.error_files, 0);
}

#[test]
fn fans_out_to_every_algorithm() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("all.bin");
    let data: Vec<u8> = (0..40_000u32).map(|i| (i % 253) as u8).collect();
    fs::write(&path, &data).unwrap();

    let mut job = Job::new(vec![path], JobMode::Normal);
    for kind in HashKind::ALL {
        job.request(kind);
    }
    let options = Options {
        buffer_kb: 16,
        ..Options::default()
    };
    let (_queue, done) = run_job(job, options);

    let rec = &done[0].files[0];
    for kind in HashKind::ALL {
        let slot = rec.result(kind);
        assert!(slot.computed, "{} not computed", kind.name());
        assert_eq!(
            slot.digest.as_deref().map(hex::encode),
            Some(reference_hex(kind, &data)),
            "{} digest mismatch",
            kind.name()
        );
    }
}

#[test]
fn final_round_covers_the_remainder() {
    // 2500 bytes with a 1 KiB buffer: two full rounds plus a 452-byte tail
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("odd-size.bin");
    let data: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
    fs::write(&path, &data).unwrap();

    let mut job = Job::new(vec![path], JobMode::Normal);
    job.request(HashKind::Sha256);
    job.request(HashKind::Crc32);
    let options = Options {
        buffer_kb: 1,
        ..Options::default()
    };
    let (_queue, done) = run_job(job, options);

    let rec = &done[0].files[0];
    assert_eq!(
        rec.result(HashKind::Sha256).digest.as_deref().map(hex::encode),
        Some(reference_hex(HashKind::Sha256, &data))
    );
    assert_eq!(
        rec.result(HashKind::Crc32).digest.as_deref().map(hex::encode),
        Some(reference_hex(HashKind::Crc32, &data))
    );
}

#[test]
fn exact_buffer_multiple_terminates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exact.bin");
    let data = vec![0xa5u8; 2048];
    fs::write(&path, &data).unwrap();

    let mut job = Job::new(vec![path], JobMode::Normal);
    job.request(HashKind::Md5);
    let options = Options {
        buffer_kb: 1,
        ..Options::default()
    };
    let (_queue, done) = run_job(job, options);

    assert_eq!(
        done[0].files[0]
            .result(HashKind::Md5)
            .digest
            .as_deref()
            .map(hex::encode),
        Some(reference_hex(HashKind::Md5, &data))
    );
}

#[test]
fn empty_file_yields_empty_input_digest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    fs::write(&path, b"").unwrap();

    let mut job = Job::new(vec![path], JobMode::Normal);
    job.request(HashKind::Md5);
    let (_queue, done) = run_job(job, Options::default());

    assert_eq!(
        done[0].files[0]
            .result(HashKind::Md5)
            .digest
            .as_deref()
            .map(hex::encode),
        Some("d41d8cd98f00b204e9800998ecf8427e".to_string())
    );
}

#[test]
fn open_failure_skips_only_that_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("first.bin"), b"first").unwrap();
    fs::write(dir.path().join("third.bin"), b"third").unwrap();

    let mut job = Job::new(
        vec![
            dir.path().join("first.bin"),
            dir.path().join("missing.bin"),
            dir.path().join("third.bin"),
        ],
        JobMode::Normal,
    );
    job.request(HashKind::Sha1);
    let (queue, done) = run_job(job, Options::default());

    let files = &done[0].files;
    assert!(files[0].result(HashKind::Sha1).computed);
    assert!(files[1].error.is_some());
    assert!(!files[1].result(HashKind::Sha1).computed);
    assert_eq!(files[1].status(), FileStatus::Error);
    assert!(files[2].result(HashKind::Sha1).computed);

    let counts = queue.counts();
    assert_eq!(counts.done_files, 3);
    assert_eq!(counts.error_files, 1);
}

#[test]
fn filename_claim_verifies() {
    let dir = tempfile::tempdir().unwrap();
    // md5("x") embedded in the name
    let good = dir.path().join("ok_[9dd4e461268c8034f5c8564e155c67a6].txt");
    fs::write(&good, b"x").unwrap();
    let bad = dir.path().join("bad_[ffffffffffffffffffffffffffffffff].txt");
    fs::write(&bad, b"x").unwrap();

    let mut job = Job::new(vec![good, bad], JobMode::Normal);
    job.request(HashKind::Md5);
    let (_queue, done) = run_job(job, Options::default());

    assert_eq!(done[0].files[0].status(), FileStatus::Verified);
    assert_eq!(done[0].files[1].status(), FileStatus::Mismatch);
}

#[test]
fn cancellation_requeues_the_finished_remainder() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = Vec::new();
    for i in 0..3 {
        let path = dir.path().join(format!("part-{i}.bin"));
        fs::write(&path, vec![i as u8; 64]).unwrap();
        paths.push(path);
    }

    let mut job = Job::new(paths, JobMode::Normal);
    job.request(HashKind::Sha256);
    let options = Options::default();
    prepare_job(&mut job, &options).unwrap();

    let queue = Arc::new(JobQueue::new());
    queue.submit(job);
    queue.close();
    assert_eq!(queue.counts().total_files, 3);

    let engine = HashingEngine::new(Arc::clone(&queue), options.clone());
    let stop = engine.stop_handle();
    let engine = engine.with_file_callback(move |_| {
        // request cancellation as soon as the first file lands
        stop.store(true, Ordering::SeqCst);
    });
    engine.run();

    // the two unfinished files left the job and the totals
    let counts = queue.counts();
    assert_eq!(counts.total_files, 1);
    assert_eq!(counts.done_files, 1);
    assert_eq!(queue.pending_jobs(), 1);

    // the residue keeps its finished result and is not recounted on resume
    let resumed = HashingEngine::new(Arc::clone(&queue), options);
    resumed.run();
    let done = queue.take_completed();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].files.len(), 1);
    let slot = done[0].files[0].result(HashKind::Sha256);
    assert!(slot.computed);
    let counts = queue.counts();
    assert_eq!(counts.done_files, 1, "file must not be double-counted");
}

#[test]
fn requested_twice_is_computed_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("once.bin");
    fs::write(&path, b"once").unwrap();

    let mut job = Job::new(vec![path], JobMode::Normal);
    job.request(HashKind::Sha256);
    let options = Options::default();
    prepare_job(&mut job, &options).unwrap();
    job.calculated[HashKind::Sha256.index()] = true;

    let queue = Arc::new(JobQueue::new());
    queue.submit(job);
    queue.close();
    HashingEngine::new(Arc::clone(&queue), options).run();

    let done = queue.take_completed();
    // already calculated: the engine never ran a worker for it
    assert!(!done[0].files[0].result(HashKind::Sha256).computed);
}

#[test]
fn action_mode_hands_over_sorted_results() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), b"a").unwrap();
    fs::write(dir.path().join("b.bin"), b"b").unwrap();

    let mut job = Job::new(
        vec![dir.path().join("a.bin"), dir.path().join("b.bin")],
        JobMode::WriteHashFile(HashKind::Md5),
    );
    let options = Options::default();
    prepare_job(&mut job, &options).unwrap();

    let queue = Arc::new(JobQueue::new());
    queue.submit(job);
    queue.close();

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let engine =
        HashingEngine::new(Arc::clone(&queue), options).with_action_callback(move |job, files| {
            assert_eq!(job.mode, JobMode::WriteHashFile(HashKind::Md5));
            let mut names = sink.lock().unwrap();
            for rec in files {
                assert!(rec.result(HashKind::Md5).computed);
                names.push(rec.display_name.clone());
            }
        });
    engine.run();

    assert_eq!(*seen.lock().unwrap(), vec!["a.bin", "b.bin"]);
}

#[test]
fn job_callback_fires_once_per_job() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("f.bin"), b"f").unwrap();

    let mut job = Job::new(vec![dir.path().join("f.bin")], JobMode::Normal);
    job.request(HashKind::Crc32);
    let options = Options::default();
    prepare_job(&mut job, &options).unwrap();

    let queue = Arc::new(JobQueue::new());
    queue.submit(job);
    queue.close();

    let finished = Arc::new(Mutex::new(0usize));
    let count = Arc::clone(&finished);
    let engine = HashingEngine::new(Arc::clone(&queue), options).with_job_callback(move |job| {
        assert_eq!(job.files.len(), 1);
        *count.lock().unwrap() += 1;
    });
    engine.run();

    assert_eq!(*finished.lock().unwrap(), 1);
}
