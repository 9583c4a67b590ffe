// Digest module
// Algorithm table, hasher registry, and the per-algorithm worker protocol

pub mod algo;
pub mod ed2k;
pub mod worker;

pub use algo::HashKind;
pub use ed2k::{Ed2k, ED2K_CHUNK_SIZE};
pub use worker::{spawn_worker, Handoff};

use md5::{Digest as Md5Digest, Md5};
use sha1::{Digest as Sha1Digest, Sha1};
use sha2::{Digest as Sha2Digest, Sha256, Sha512};
use sha3::{Digest as Sha3Digest, Sha3_224, Sha3_256, Sha3_512};

/// Trait for streaming hash implementations
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the result
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Get the output size in bytes
    fn output_size(&self) -> usize;
}

/// Information about a hash algorithm
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlgorithmInfo {
    pub name: &'static str,
    pub output_bits: usize,
    pub cryptographic: bool,
}

// CRC32 wrapper (big-endian byte order, SFV convention)
pub struct Crc32Wrapper(crc32fast::Hasher);

impl Hasher for Crc32Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_be_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        4
    }
}

// CRC32C (Castagnoli) wrapper
pub struct Crc32cWrapper(u32);

impl Hasher for Crc32cWrapper {
    fn update(&mut self, data: &[u8]) {
        self.0 = crc32c::crc32c_append(self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        4
    }
}

// MD5 wrapper
pub struct Md5Wrapper(Md5);

impl Hasher for Md5Wrapper {
    fn update(&mut self, data: &[u8]) {
        Md5Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Md5Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        16
    }
}

// ED2K wrapper
pub struct Ed2kWrapper(Ed2k);

impl Hasher for Ed2kWrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize()
    }

    fn output_size(&self) -> usize {
        16
    }
}

// SHA1 wrapper
pub struct Sha1Wrapper(Sha1);

impl Hasher for Sha1Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha1Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha1Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        20
    }
}

// SHA-256 wrapper
pub struct Sha256Wrapper(Sha256);

impl Hasher for Sha256Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha2Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha2Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        32
    }
}

// SHA-512 wrapper
pub struct Sha512Wrapper(Sha512);

impl Hasher for Sha512Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha2Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha2Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        64
    }
}

// SHA3-224 wrapper
pub struct Sha3_224Wrapper(Sha3_224);

impl Hasher for Sha3_224Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha3Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha3Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        28
    }
}

// SHA3-256 wrapper
pub struct Sha3_256Wrapper(Sha3_256);

impl Hasher for Sha3_256Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha3Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha3Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        32
    }
}

// SHA3-512 wrapper
pub struct Sha3_512Wrapper(Sha3_512);

impl Hasher for Sha3_512Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha3Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha3Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        64
    }
}

// BLAKE2sp wrapper
pub struct Blake2spWrapper(blake2s_simd::blake2sp::State);

impl Hasher for Blake2spWrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        32
    }
}

// BLAKE3 wrapper
//
// With the rayon feature enabled, update_rayon() parallelizes hashing of
// large inputs across CPU cores.
pub struct Blake3Wrapper(blake3::Hasher);

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update_rayon(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        32
    }
}

/// Get a fresh hasher instance for the given algorithm
pub fn hasher_for(kind: HashKind) -> Box<dyn Hasher> {
    match kind {
        HashKind::Crc32 => Box::new(Crc32Wrapper(crc32fast::Hasher::new())),
        HashKind::Crc32c => Box::new(Crc32cWrapper(0)),
        HashKind::Md5 => Box::new(Md5Wrapper(Md5Digest::new())),
        HashKind::Ed2k => Box::new(Ed2kWrapper(Ed2k::new())),
        HashKind::Sha1 => Box::new(Sha1Wrapper(Sha1Digest::new())),
        HashKind::Sha256 => Box::new(Sha256Wrapper(Sha2Digest::new())),
        HashKind::Sha512 => Box::new(Sha512Wrapper(Sha2Digest::new())),
        HashKind::Sha3_224 => Box::new(Sha3_224Wrapper(Sha3Digest::new())),
        HashKind::Sha3_256 => Box::new(Sha3_256Wrapper(Sha3Digest::new())),
        HashKind::Sha3_512 => Box::new(Sha3_512Wrapper(Sha3Digest::new())),
        HashKind::Blake2sp => Box::new(Blake2spWrapper(blake2s_simd::blake2sp::State::new())),
        HashKind::Blake3 => Box::new(Blake3Wrapper(blake3::Hasher::new())),
    }
}

/// List all supported algorithms
pub fn list_algorithms() -> Vec<AlgorithmInfo> {
    HashKind::ALL
        .iter()
        .map(|&kind| AlgorithmInfo {
            name: kind.name(),
            output_bits: kind.digest_len() * 8,
            cryptographic: !matches!(kind, HashKind::Crc32 | HashKind::Crc32c),
        })
        .collect()
}
