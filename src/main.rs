// hashmill CLI
//
// The reference submission/completion collaborator around the hashing
// core: builds one job from the command line, prepares and submits it,
// then drives the engine on the main thread and renders per-file results.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use hashmill::config::DEFAULT_BUFFER_KB;
use hashmill::{
    list_algorithms, prepare_job, FileRecord, FileStatus, HashKind, HashingEngine, Job, JobMode,
    JobQueue, Options,
};

/// Compute and verify file digests with overlapped reads
#[derive(Parser)]
#[command(name = "hashmill")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Files and directories to hash
    #[arg(required_unless_present = "list")]
    paths: Vec<PathBuf>,

    /// Digest algorithm to run (repeatable); defaults to crc32
    #[arg(short, long = "algo")]
    algos: Vec<String>,

    /// Read buffer size in KiB
    #[arg(long, default_value_t = DEFAULT_BUFFER_KB)]
    buffer_kb: usize,

    /// File-name glob to skip while expanding directories (repeatable)
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// Accept an embedded hex hash anywhere in a filename, not only
    /// between delimiters
    #[arg(long)]
    hex_anywhere: bool,

    /// Do not infer checksum-list file types from stems like MD5SUMS
    #[arg(long)]
    no_stem_inference: bool,

    /// Row-grouping id passed through to the output
    #[arg(long, default_value_t = 0)]
    group: u64,

    /// Emit one JSON object per file instead of text lines
    #[arg(long)]
    json: bool,

    /// List supported algorithms and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hashmill=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list {
        for info in list_algorithms() {
            println!("{:<10} {:>4} bits", info.name, info.output_bits);
        }
        return Ok(());
    }

    let options = Options {
        buffer_kb: cli.buffer_kb,
        hex_anywhere: cli.hex_anywhere,
        infer_type_from_stem: !cli.no_stem_inference,
        exclude_patterns: cli.excludes.clone(),
        ..Options::default()
    };

    let mut job = Job::new(cli.paths.clone(), JobMode::Normal);
    job.group_id = cli.group;
    for name in &cli.algos {
        match HashKind::from_name(name) {
            Some(kind) => job.request(kind),
            None => bail!("unknown algorithm: {name} (see --list)"),
        }
    }

    prepare_job(&mut job, &options)?;
    if job.files.is_empty() {
        bail!("nothing to hash");
    }
    let total_files = job.files.len() as u64;
    let total_bytes = job.total_size;

    let queue = Arc::new(JobQueue::new());
    queue.submit(job);
    queue.close();

    let progress = if cli.json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(total_files);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%)")
                .unwrap()
                .progress_chars("=>-"),
        );
        pb
    };

    let mismatches = Arc::new(AtomicU64::new(0));
    let json = cli.json;
    let pb = progress.clone();
    let mismatch_count = Arc::clone(&mismatches);

    let engine = HashingEngine::new(Arc::clone(&queue), options).with_file_callback(move |rec| {
        if rec.status() == FileStatus::Mismatch {
            mismatch_count.fetch_add(1, Ordering::Relaxed);
        }
        if json {
            println!("{}", render_json(rec));
        } else {
            println!("{}", render_line(rec));
        }
        pb.inc(1);
    });
    engine.run();
    progress.finish_and_clear();

    let counts = queue.counts();
    if !cli.json {
        println!(
            "{} file(s), {} hashed, {} error(s), {}",
            counts.total_files,
            counts.done_files,
            counts.error_files,
            format_size(total_bytes, BINARY)
        );
    }

    if counts.error_files > 0 || mismatches.load(Ordering::Relaxed) > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn render_line(rec: &FileRecord) -> String {
    let verdict = match rec.status() {
        FileStatus::Verified => "OK ".green().bold().to_string(),
        FileStatus::Mismatch => "BAD".red().bold().to_string(),
        FileStatus::Error => "ERR".red().bold().to_string(),
        FileStatus::Done | FileStatus::Pending => "   ".to_string(),
    };

    let mut tail = String::new();
    for kind in HashKind::ALL {
        let slot = rec.result(kind);
        if slot.computed {
            if let Some(digest) = &slot.digest {
                tail.push_str(&format!("  {}:{}", kind.name(), hex::encode(digest)));
            }
        }
    }
    if let Some(code) = rec.error {
        tail.push_str(&format!("  os error {code}"));
    }

    format!("{verdict} {}{tail}", rec.display_name)
}

fn render_json(rec: &FileRecord) -> String {
    let mut digests = serde_json::Map::new();
    for kind in HashKind::ALL {
        let slot = rec.result(kind);
        if slot.computed {
            if let Some(digest) = &slot.digest {
                digests.insert(
                    kind.name().to_string(),
                    serde_json::Value::String(hex::encode(digest)),
                );
            }
        }
    }
    let value = serde_json::json!({
        "name": rec.display_name,
        "path": rec.path.to_string_lossy(),
        "size": rec.size,
        "modified": rec.modified.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        "status": rec.status(),
        "error": rec.error,
        "elapsed_seconds": rec.elapsed_seconds,
        "digests": digests,
    });
    value.to_string()
}
