// Runtime options consumed by the hashing core.
//
// This is the configuration *surface* only; loading these values from a
// file or the command line is the caller's business.

use crate::digest::HashKind;

/// Delimiters accepted around an embedded hex hash when
/// `hex_anywhere` is off.
pub const DEFAULT_HEX_DELIMITERS: &str = "[](){} _-.";

/// Default read buffer size in KiB.
pub const DEFAULT_BUFFER_KB: usize = 1024;

#[derive(Debug, Clone)]
pub struct Options {
    /// Read buffer size in KiB (two buffers of this size are allocated).
    pub buffer_kb: usize,
    /// Advisory hint to bypass the OS file cache where the platform
    /// supports it. The engine semantics do not depend on it.
    pub unbuffered_reads: bool,
    /// Accept an embedded hex hash anywhere in the filename instead of
    /// requiring delimiters on both sides.
    pub hex_anywhere: bool,
    /// Delimiter characters recognized around an embedded hash.
    pub hex_delimiters: String,
    /// Infer checksum-list file types from stems like "MD5SUMS" in
    /// addition to the extension table.
    pub infer_type_from_stem: bool,
    /// Algorithms computed for a Normal job that requests nothing else.
    pub default_algos: Vec<HashKind>,
    /// File-name globs excluded during directory expansion.
    pub exclude_patterns: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            buffer_kb: DEFAULT_BUFFER_KB,
            unbuffered_reads: false,
            hex_anywhere: false,
            hex_delimiters: DEFAULT_HEX_DELIMITERS.to_string(),
            infer_type_from_stem: true,
            default_algos: vec![HashKind::Crc32],
            exclude_patterns: Vec::new(),
        }
    }
}

impl Options {
    pub fn buffer_bytes(&self) -> usize {
        self.buffer_kb.max(1) * 1024
    }
}
