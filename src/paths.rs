// Path resolution and hash discovery
//
// Canonical form: absolute, lexically cleaned of `.`/`..` segments; on
// Windows additionally the extended-length `\\?\` (or `\\?\UNC\`) form so
// path-length limits do not apply. The pure string operations below accept
// both separator styles so checksum-file entries written on either
// platform resolve the same way.

use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::digest::HashKind;

fn is_sep(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Remove `.` segments and resolve `..` against preceding components
/// without touching the filesystem.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                    continue;
                }
                components.push(component);
            }
            _ => components.push(component),
        }
    }

    let mut result = PathBuf::new();
    for component in components {
        result.push(component);
    }

    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Turn a raw submitted path into canonical form.
///
/// Inputs already in extended form pass through unchanged; relative inputs
/// are joined to `base` first. The returned flag reports whether the base
/// was actually used (the input was relative).
pub fn canonicalize(base: &Path, raw: &Path) -> (PathBuf, bool) {
    #[cfg(windows)]
    {
        let raw_str = raw.to_string_lossy();
        if raw_str.starts_with(r"\\?") {
            return (clean_path(raw), false);
        }
    }

    let mut was_relative = false;
    let joined = if raw.is_relative() {
        was_relative = true;
        base.join(raw)
    } else {
        raw.to_path_buf()
    };
    let cleaned = clean_path(&joined);

    #[cfg(windows)]
    let cleaned = to_extended(cleaned);

    (cleaned, was_relative)
}

/// Extended-length form: `\\server\share` becomes `\\?\UNC\server\share`,
/// `C:\dir` becomes `\\?\C:\dir`.
#[cfg(windows)]
fn to_extended(path: PathBuf) -> PathBuf {
    let s = path.to_string_lossy().replace('/', "\\");
    if s.starts_with(r"\\?") {
        return PathBuf::from(s);
    }
    if let Some(rest) = s.strip_prefix(r"\\") {
        PathBuf::from(format!(r"\\?\UNC\{rest}"))
    } else {
        PathBuf::from(format!(r"\\?\{s}"))
    }
}

/// Common base directory for a set of records: the first file's directory,
/// provided it is a literal prefix of every path and a real directory.
/// `None` means display names cannot be shortened.
pub fn compute_base_path(files: &[crate::job::FileRecord]) -> Option<PathBuf> {
    let first = files.first()?;
    let mut base = first.path.to_string_lossy().into_owned();
    let cut = base.rfind(is_sep)?;
    base.truncate(cut + 1);

    if !files
        .iter()
        .all(|f| f.path.to_string_lossy().starts_with(&base))
    {
        return None;
    }
    if !Path::new(&base).is_dir() {
        return None;
    }
    Some(PathBuf::from(base))
}

/// Presentation name: relative to the base when one exists, otherwise the
/// full path minus the extended-length prefix.
pub fn display_name(path: &Path, base: Option<&Path>) -> String {
    let full = path.to_string_lossy();
    if let Some(base) = base {
        let base = base.to_string_lossy();
        if let Some(stripped) = full.strip_prefix(base.as_ref()) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    full.strip_prefix(r"\\?\").unwrap_or(&full).to_string()
}

/// Everything after the last separator; the whole string if there is none.
pub fn file_name_of(full: &str) -> &str {
    match full.rfind(is_sep) {
        Some(pos) => &full[pos + 1..],
        None => full,
    }
}

/// Scan a file name (not its directory) from the end for an embedded hex
/// digest. The run length must equal exactly one filename-detectable
/// digest's encoded length; ties resolve by table order (MD5 beats ED2K).
///
/// Two policies: `anywhere` accepts a maximal hex run terminated by any
/// non-hex character; otherwise the run must sit between recognized
/// delimiter characters on both sides.
pub fn find_embedded_hash(
    file_name: &str,
    anywhere: bool,
    delimiters: &str,
) -> Option<(HashKind, Vec<u8>)> {
    let chars: Vec<char> = file_name.chars().collect();
    if chars.is_empty() {
        return None;
    }
    let is_hex = |c: char| c.is_ascii_hexdigit();
    let is_delim = |c: char| delimiters.contains(c);

    let mut i = chars.len() as isize;
    loop {
        i -= 1;
        if i < 0 {
            break;
        }
        let mut run = 0usize;
        if anywhere {
            if is_hex(chars[i as usize]) {
                if i - 7 < 0 {
                    break;
                }
                let mut j = 0isize;
                while i - j >= 0 && is_hex(chars[(i - j) as usize]) {
                    run += 1;
                    j += 1;
                }
                i -= j - 1;
            }
        } else if is_delim(chars[i as usize]) {
            if i - 9 < 0 {
                break;
            }
            let mut valid = false;
            let mut j = 1isize;
            while i - j >= 0 {
                let c = chars[(i - j) as usize];
                if is_hex(c) {
                    run += 1;
                } else {
                    valid = is_delim(c);
                    break;
                }
                j += 1;
            }
            if !valid {
                run = 0;
            } else {
                // leave the delimiter; it may close the next candidate
                j -= 1;
            }
            i -= j;
        }
        if run > 0 {
            for kind in HashKind::FILENAME_DETECTABLE {
                if run == kind.hex_len() {
                    let start = i as usize;
                    let hex_run: String = chars[start..start + run].iter().collect();
                    let bytes = hex::decode(hex_run).ok()?;
                    return Some((kind, bytes));
                }
            }
        }
        if i <= 0 {
            break;
        }
    }
    None
}

/// Probe the `:CRC32` alternate data stream beside a file: exactly 8 hex
/// characters, decoded big-endian. Any failure reads as "not found".
pub fn find_sidecar_hash(path: &Path) -> Option<u32> {
    let mut stream = path.as_os_str().to_os_string();
    stream.push(":CRC32");
    let mut file = File::open(&stream).ok()?;
    let mut buf = [0u8; 8];
    file.read_exact(&mut buf).ok()?;
    let text = std::str::from_utf8(&buf).ok()?;
    if !text.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(text, 16).ok()
}

/// Classification of a path by name alone: a checksum-list file of one
/// algorithm, a BSD-style multi-algorithm file, or a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFileType {
    Normal,
    HashList(HashKind),
    Bsd,
}

const STEM_SUFFIXES: [&str; 6] = ["SUM", "SUMS", "CHECKSUM", "CHECKSUMS", "HASH", "HASHES"];

/// Guess whether a path names a checksum-list file, without reading it.
pub fn detect_hash_file_type(path: &Path, infer_from_stem: bool) -> HashFileType {
    let full = path.to_string_lossy();
    let name = file_name_of(&full);
    let (stem, ext) = match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (name, ""),
    };

    for kind in HashKind::ALL {
        if ext.eq_ignore_ascii_case(kind.list_extension()) {
            return HashFileType::HashList(kind);
        }
    }
    if ext.eq_ignore_ascii_case("bsdhash") {
        return HashFileType::Bsd;
    }
    if !infer_from_stem {
        return HashFileType::Normal;
    }

    let plain_ext = ext.is_empty() || ext.eq_ignore_ascii_case("txt");
    for kind in HashKind::ALL {
        if plain_ext {
            for suffix in STEM_SUFFIXES {
                let candidate = format!("{}{}", kind.name(), suffix);
                if stem.eq_ignore_ascii_case(&candidate) {
                    return HashFileType::HashList(kind);
                }
            }
            if stem.eq_ignore_ascii_case(kind.name()) {
                return HashFileType::Bsd;
            }
        }
    }
    if stem.contains("_hashes") {
        return HashFileType::Bsd;
    }
    HashFileType::Normal
}

/// Split a full path into directory (no trailing separator), stem, and
/// extension (no dot). The extension is the part after the first `.` found
/// scanning backwards before any separator.
pub fn split_path_stem_ext(full: &str) -> (String, String, String) {
    let chars: Vec<char> = full.chars().collect();
    let mut ext = String::new();
    let mut ext_found = false;
    let mut end = chars.len();

    for idx in (0..chars.len()).rev() {
        let c = chars[idx];
        if !ext_found && c == '.' {
            ext = chars[idx + 1..end].iter().collect();
            end = idx;
            ext_found = true;
        }
        if is_sep(c) {
            let stem: String = chars[idx + 1..end].iter().collect();
            let dir: String = chars[..idx].iter().collect();
            return (dir, stem, ext);
        }
    }
    let stem: String = chars[..end].iter().collect();
    (String::new(), stem, ext)
}

/// Rewrite `pattern` into a new filename next to `old_path`, substituting
/// the literal tokens `%FILENAME`, `%FILEEXT` and `%CRC`. All other
/// characters copy verbatim; a trailing dot left by an empty extension is
/// suppressed.
pub fn build_renamed_filename(old_path: &str, hash_hex: &str, pattern: &str) -> String {
    let (dir, stem, ext) = split_path_stem_ext(old_path);
    let sep = if old_path.contains('\\') { '\\' } else { '/' };

    let mut out = dir;
    if !out.is_empty() {
        out.push(sep);
    }

    let mut rest = pattern;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("%FILENAME") {
            out.push_str(&stem);
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("%FILEEXT") {
            out.push_str(&ext);
            if ext.is_empty() && out.ends_with('.') {
                out.pop();
            }
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("%CRC") {
            out.push_str(hash_hex);
            rest = tail;
        } else {
            let mut it = rest.chars();
            if let Some(c) = it.next() {
                out.push(c);
            }
            rest = it.as_str();
        }
    }
    out
}
