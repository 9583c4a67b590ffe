// Hash algorithm table
//
// The declaration order below is load-bearing: embedded-hash detection in
// filenames resolves digest-length collisions by table order (MD5 and ED2K
// share 16 bytes, MD5 wins), and only the kinds before SHA3-224 take part
// in filename detection at all.

use serde::Serialize;

/// All digest algorithms the engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HashKind {
    Crc32,
    Md5,
    Ed2k,
    Sha1,
    Sha256,
    Sha512,
    Sha3_224,
    Sha3_256,
    Sha3_512,
    Crc32c,
    Blake2sp,
    Blake3,
}

impl HashKind {
    pub const COUNT: usize = 12;

    /// Every kind in table order.
    pub const ALL: [HashKind; Self::COUNT] = [
        HashKind::Crc32,
        HashKind::Md5,
        HashKind::Ed2k,
        HashKind::Sha1,
        HashKind::Sha256,
        HashKind::Sha512,
        HashKind::Sha3_224,
        HashKind::Sha3_256,
        HashKind::Sha3_512,
        HashKind::Crc32c,
        HashKind::Blake2sp,
        HashKind::Blake3,
    ];

    /// Kinds that embedded-hash detection may report, in tie-break order.
    pub const FILENAME_DETECTABLE: [HashKind; 6] = [
        HashKind::Crc32,
        HashKind::Md5,
        HashKind::Ed2k,
        HashKind::Sha1,
        HashKind::Sha256,
        HashKind::Sha512,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Digest size in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            HashKind::Crc32 | HashKind::Crc32c => 4,
            HashKind::Md5 | HashKind::Ed2k => 16,
            HashKind::Sha1 => 20,
            HashKind::Sha256 | HashKind::Sha3_256 | HashKind::Blake2sp | HashKind::Blake3 => 32,
            HashKind::Sha512 | HashKind::Sha3_512 => 64,
            HashKind::Sha3_224 => 28,
        }
    }

    /// Digest size as hex characters.
    pub fn hex_len(self) -> usize {
        self.digest_len() * 2
    }

    /// Canonical display name.
    pub fn name(self) -> &'static str {
        match self {
            HashKind::Crc32 => "CRC32",
            HashKind::Md5 => "MD5",
            HashKind::Ed2k => "ED2K",
            HashKind::Sha1 => "SHA1",
            HashKind::Sha256 => "SHA256",
            HashKind::Sha512 => "SHA512",
            HashKind::Sha3_224 => "SHA3-224",
            HashKind::Sha3_256 => "SHA3-256",
            HashKind::Sha3_512 => "SHA3-512",
            HashKind::Crc32c => "CRC32C",
            HashKind::Blake2sp => "BLAKE2SP",
            HashKind::Blake3 => "BLAKE3",
        }
    }

    /// Extension used by this kind's checksum-list files ("sfv" for CRC32).
    pub fn list_extension(self) -> &'static str {
        match self {
            HashKind::Crc32 => "sfv",
            HashKind::Md5 => "md5",
            HashKind::Ed2k => "ed2k",
            HashKind::Sha1 => "sha1",
            HashKind::Sha256 => "sha256",
            HashKind::Sha512 => "sha512",
            HashKind::Sha3_224 => "sha3-224",
            HashKind::Sha3_256 => "sha3-256",
            HashKind::Sha3_512 => "sha3-512",
            HashKind::Crc32c => "crc32c",
            HashKind::Blake2sp => "blake2sp",
            HashKind::Blake3 => "blake3",
        }
    }

    /// Parse an algorithm name (case-insensitive).
    pub fn from_name(name: &str) -> Option<HashKind> {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "crc32" | "crc-32" | "crc" => Some(HashKind::Crc32),
            "md5" => Some(HashKind::Md5),
            "ed2k" => Some(HashKind::Ed2k),
            "sha1" | "sha-1" => Some(HashKind::Sha1),
            "sha256" | "sha-256" => Some(HashKind::Sha256),
            "sha512" | "sha-512" => Some(HashKind::Sha512),
            "sha3-224" | "sha3_224" => Some(HashKind::Sha3_224),
            "sha3-256" | "sha3_256" => Some(HashKind::Sha3_256),
            "sha3-512" | "sha3_512" => Some(HashKind::Sha3_512),
            "crc32c" | "crc-32c" => Some(HashKind::Crc32c),
            "blake2sp" => Some(HashKind::Blake2sp),
            "blake3" => Some(HashKind::Blake3),
            _ => None,
        }
    }
}
