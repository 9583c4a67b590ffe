// Directory expansion and job preparation
//
// The producer-side pipeline: canonicalize submitted paths, establish the
// display base, expand directories into their files, stat everything and
// discover pre-existing hash claims. Runs on the submitting thread; the
// engine loop only ever sees jobs whose file list is flat.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::config::Options;
use crate::digest::HashKind;
use crate::job::{FoundFrom, FileRecord, Job, JobMode};
use crate::paths;

/// File-name glob filtering for expansion.
#[derive(Debug, Clone)]
pub struct NameFilter {
    glob_set: GlobSet,
    patterns: Vec<String>,
}

impl NameFilter {
    /// A filter that matches nothing.
    pub fn empty() -> Self {
        Self {
            glob_set: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    /// Compile a filter from glob patterns.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
            kept.push(pattern.as_ref().to_string());
        }
        Ok(Self {
            glob_set: builder.build()?,
            patterns: kept,
        })
    }

    /// The filter recognizing checksum-list files by extension.
    pub fn hash_files() -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::new();
        for kind in HashKind::ALL {
            let pattern = format!("*.{}", kind.list_extension());
            if let Ok(glob) = Glob::new(&pattern) {
                builder.add(glob);
                patterns.push(pattern);
            }
        }
        if let Ok(glob) = Glob::new("*.bsdhash") {
            builder.add(glob);
            patterns.push("*.bsdhash".to_string());
        }
        Self {
            glob_set: builder.build().unwrap_or_else(|_| GlobSet::empty()),
            patterns,
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.glob_set.is_match(name)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Replace every directory entry by its children until none remain.
///
/// Each pass builds a fresh sequence: children take their directory's
/// position in stable name-sorted order, subdirectories are expanded on a
/// later pass. Normal mode drops files matching `exclude`; hash-files-only
/// mode keeps only files matching `hash_filter` (directories always
/// survive for recursion). Unreadable directories are skipped.
pub fn expand_directories(
    mut files: Vec<FileRecord>,
    exclude: &NameFilter,
    hash_files_only: bool,
    hash_filter: &NameFilter,
) -> Vec<FileRecord> {
    let keep_file = |name: &str| {
        if hash_files_only {
            hash_filter.is_match(name)
        } else {
            !exclude.is_match(name)
        }
    };

    loop {
        let mut next = Vec::with_capacity(files.len());
        let mut expanded = false;

        for rec in files {
            if rec.path.is_dir() {
                expanded = true;
                let entries = match fs::read_dir(&rec.path) {
                    Ok(entries) => entries,
                    Err(err) => {
                        debug!(path = %rec.path.display(), %err, "skipping unreadable directory");
                        continue;
                    }
                };
                let mut children: Vec<PathBuf> =
                    entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
                children.sort();
                for child in children {
                    let name = child
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    if child.is_dir() || keep_file(&name) {
                        next.push(FileRecord::new(child));
                    }
                }
            } else {
                let full = rec.path.to_string_lossy().into_owned();
                if keep_file(paths::file_name_of(&full)) {
                    next.push(rec);
                }
            }
        }

        files = next;
        if !expanded {
            return files;
        }
    }
}

/// Run the full producer pipeline over a freshly built job.
pub fn prepare_job(job: &mut Job, opts: &Options) -> Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    for rec in job.files.iter_mut() {
        let (canonical, _) = paths::canonicalize(&cwd, &rec.path);
        rec.path = canonical;
    }

    // The base must exist before stat so display names are available early.
    job.base_path = paths::compute_base_path(&job.files);

    let exclude = NameFilter::from_patterns(&opts.exclude_patterns)?;
    let taken = std::mem::take(&mut job.files);
    job.files = expand_directories(taken, &exclude, false, &NameFilter::empty());

    job.total_size = 0;
    for rec in job.files.iter_mut() {
        rec.display_name = paths::display_name(&rec.path, job.base_path.as_deref());
        match fs::metadata(&rec.path) {
            Ok(meta) => {
                rec.size = meta.len();
                rec.modified = meta.modified().ok().map(DateTime::<Local>::from);
                job.total_size += meta.len();

                if job.mode == JobMode::Normal {
                    discover_claims(rec, opts);
                }
            }
            Err(err) => rec.set_error(&err),
        }
    }

    match job.mode {
        JobMode::Verify(kind) | JobMode::WriteFilename(kind) | JobMode::WriteHashFile(kind) => {
            job.request(kind)
        }
        JobMode::WriteStream => job.request(HashKind::Crc32),
        JobMode::Normal => {
            if !job.requested.iter().any(|&r| r) {
                for &kind in &opts.default_algos {
                    job.request(kind);
                }
            }
        }
    }

    Ok(())
}

/// Pre-existing hash claims: an embedded filename hash wins, the `:CRC32`
/// sidecar stream is the fallback.
fn discover_claims(rec: &mut FileRecord, opts: &Options) {
    let full = rec.path.to_string_lossy().into_owned();
    let name = paths::file_name_of(&full);
    if let Some((kind, bytes)) =
        paths::find_embedded_hash(name, opts.hex_anywhere, &opts.hex_delimiters)
    {
        let slot = rec.result_mut(kind);
        slot.found = FoundFrom::Filename;
        slot.found_value = Some(bytes);
    } else if let Some(crc) = paths::find_sidecar_hash(&rec.path) {
        let slot = rec.result_mut(HashKind::Crc32);
        slot.found = FoundFrom::Stream;
        slot.found_value = Some(crc.to_be_bytes().to_vec());
    }
}
