// ED2K chunked hashing
//
// The eDonkey2000 hash splits the stream into 9,728,000-byte chunks and
// hashes each with MD4. A stream shorter than one chunk is hashed directly;
// anything longer is the MD4 of the concatenated chunk digests, and a
// stream that ends exactly on a chunk boundary still contributes the empty
// trailing chunk.

use md4::{Digest, Md4};

/// ED2K chunk size in bytes.
pub const ED2K_CHUNK_SIZE: usize = 9_728_000;

pub struct Ed2k {
    chunk: Md4,
    chunk_filled: usize,
    chunk_digests: Vec<u8>,
    chunks_completed: u64,
}

impl Ed2k {
    pub fn new() -> Self {
        Self {
            chunk: Md4::new(),
            chunk_filled: 0,
            chunk_digests: Vec::new(),
            chunks_completed: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let room = ED2K_CHUNK_SIZE - self.chunk_filled;
            let take = room.min(data.len());
            self.chunk.update(&data[..take]);
            self.chunk_filled += take;
            data = &data[take..];

            if self.chunk_filled == ED2K_CHUNK_SIZE {
                let done = std::mem::replace(&mut self.chunk, Md4::new());
                self.chunk_digests.extend_from_slice(&done.finalize());
                self.chunk_filled = 0;
                self.chunks_completed += 1;
            }
        }
    }

    pub fn finalize(mut self) -> Vec<u8> {
        let last = self.chunk.finalize();
        if self.chunks_completed == 0 {
            // Single-chunk stream: the chunk digest is the hash itself.
            return last.to_vec();
        }
        // The trailing chunk digest is appended even when it covers zero
        // bytes (stream length an exact chunk multiple).
        self.chunk_digests.extend_from_slice(&last);
        Md4::digest(&self.chunk_digests).to_vec()
    }
}

impl Default for Ed2k {
    fn default() -> Self {
        Self::new()
    }
}
