// Job and per-file data model
//
// A Job is one batch of files submitted together (one drag-and-drop, one
// command line). The engine mutates it in place: the expander replaces
// directory entries, the resolver canonicalizes paths and sets the base,
// and the hashing loop fills in digests.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::digest::HashKind;

/// Where a pre-existing hash claim for a file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FoundFrom {
    None,
    Filename,
    Stream,
}

/// Per-algorithm state of one file: the claimed value discovered up front
/// (filename or sidecar stream) and the digest actually computed.
#[derive(Debug, Clone)]
pub struct AlgoResult {
    pub found: FoundFrom,
    pub found_value: Option<Vec<u8>>,
    pub digest: Option<Vec<u8>>,
    /// True only if the digest worker ran to completion for this file.
    pub computed: bool,
}

impl Default for AlgoResult {
    fn default() -> Self {
        Self {
            found: FoundFrom::None,
            found_value: None,
            digest: None,
            computed: false,
        }
    }
}

/// Terminal presentation state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileStatus {
    /// Every computed digest matched its pre-existing claim.
    Verified,
    /// At least one computed digest contradicted a claim.
    Mismatch,
    /// An OS error prevented hashing.
    Error,
    /// Hashed, nothing to verify against.
    Done,
    /// Not processed yet.
    Pending,
}

/// One file under consideration. Owned exclusively by its parent Job.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Canonical absolute path (extended-length form on Windows).
    pub path: PathBuf,
    /// Path relative to the job base, for presentation.
    pub display_name: String,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
    /// Raw OS error code; `None` means no error.
    pub error: Option<i32>,
    pub results: [AlgoResult; HashKind::COUNT],
    /// Wall-clock seconds spent hashing, file-open to final barrier.
    pub elapsed_seconds: f32,
    /// Whether the aggregate counters already saw this file's outcome.
    /// Keeps a requeued job from double-counting across a cancel split.
    pub reported: bool,
}

impl FileRecord {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            display_name: String::new(),
            size: 0,
            modified: None,
            error: None,
            results: std::array::from_fn(|_| AlgoResult::default()),
            elapsed_seconds: 0.0,
            reported: false,
        }
    }

    pub fn result(&self, kind: HashKind) -> &AlgoResult {
        &self.results[kind.index()]
    }

    pub fn result_mut(&mut self, kind: HashKind) -> &mut AlgoResult {
        &mut self.results[kind.index()]
    }

    pub fn set_error(&mut self, err: &std::io::Error) {
        self.error = Some(err.raw_os_error().unwrap_or(-1));
    }

    /// Collapse the per-algorithm results into one presentation status.
    pub fn status(&self) -> FileStatus {
        if self.error.is_some() {
            return FileStatus::Error;
        }
        let mut any_computed = false;
        let mut any_claim = false;
        let mut any_mismatch = false;
        for slot in &self.results {
            if !slot.computed {
                continue;
            }
            any_computed = true;
            if let Some(claim) = &slot.found_value {
                any_claim = true;
                if slot.digest.as_deref() != Some(claim.as_slice()) {
                    any_mismatch = true;
                }
            }
        }
        match (any_computed, any_claim, any_mismatch) {
            (false, _, _) => FileStatus::Pending,
            (true, false, _) => FileStatus::Done,
            (true, true, false) => FileStatus::Verified,
            (true, true, true) => FileStatus::Mismatch,
        }
    }
}

/// What should happen with a job's results beyond filling in digests.
/// The writing half of the action modes is delegated to an external
/// collaborator via the engine's action callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    Normal,
    /// Verify files against an existing checksum-list file of this kind.
    Verify(HashKind),
    /// Rewrite each filename to embed the computed digest.
    WriteFilename(HashKind),
    /// Store the CRC32 in the `:CRC32` sidecar stream.
    WriteStream,
    /// Emit a checksum-list file of this kind.
    WriteHashFile(HashKind),
}

/// A batch of files hashed under one set of options.
#[derive(Debug)]
pub struct Job {
    /// Common ancestor used to shorten display names; `None` means no
    /// shortening is possible.
    pub base_path: Option<PathBuf>,
    pub mode: JobMode,
    /// Ordered; drives display order and common-prefix computation.
    pub files: Vec<FileRecord>,
    pub requested: [bool; HashKind::COUNT],
    pub calculated: [bool; HashKind::COUNT],
    /// Sum of all file sizes, for aggregate progress.
    pub total_size: u64,
    /// Opaque row-grouping id owned by the UI layer, carried through.
    pub group_id: u64,
}

impl Job {
    pub fn new(paths: Vec<PathBuf>, mode: JobMode) -> Self {
        Self {
            base_path: None,
            mode,
            files: paths.into_iter().map(FileRecord::new).collect(),
            requested: [false; HashKind::COUNT],
            calculated: [false; HashKind::COUNT],
            total_size: 0,
            group_id: 0,
        }
    }

    pub fn request(&mut self, kind: HashKind) {
        self.requested[kind.index()] = true;
    }

    /// Algorithms still to be run: requested and not yet calculated.
    pub fn active_kinds(&self) -> Vec<HashKind> {
        HashKind::ALL
            .iter()
            .copied()
            .filter(|k| self.requested[k.index()] && !self.calculated[k.index()])
            .collect()
    }
}
