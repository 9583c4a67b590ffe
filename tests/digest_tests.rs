// Tests for the digest registry and worker protocol

use std::sync::Arc;

use hashmill::digest::{hasher_for, list_algorithms, spawn_worker, Handoff};
use hashmill::digest::{Ed2k, ED2K_CHUNK_SIZE};
use hashmill::HashKind;

use md4::{Digest as Md4Digest, Md4};

fn digest_hex(kind: HashKind, data: &[u8]) -> String {
    let mut hasher = hasher_for(kind);
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[test]
fn empty_input_known_digests() {
    assert_eq!(digest_hex(HashKind::Crc32, b""), "00000000");
    assert_eq!(digest_hex(HashKind::Crc32c, b""), "00000000");
    assert_eq!(
        digest_hex(HashKind::Md5, b""),
        "d41d8cd98f00b204e9800998ecf8427e"
    );
    // single-chunk ED2K is plain MD4
    assert_eq!(
        digest_hex(HashKind::Ed2k, b""),
        "31d6cfe0d16ae931b73c59d7e0c089c0"
    );
    assert_eq!(
        digest_hex(HashKind::Sha1, b""),
        "da39a3ee5e6b4b0d3255bfef95601890afd80709"
    );
    assert_eq!(
        digest_hex(HashKind::Sha256, b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(
        digest_hex(HashKind::Sha512, b""),
        "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
         47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
    );
    assert_eq!(
        digest_hex(HashKind::Sha3_256, b""),
        "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
    );
    assert_eq!(
        digest_hex(HashKind::Blake3, b""),
        "af1349b9f5f9a1a6a0404dee36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
    );
}

#[test]
fn known_check_values() {
    // standard CRC check inputs
    assert_eq!(digest_hex(HashKind::Crc32, b"123456789"), "cbf43926");
    assert_eq!(digest_hex(HashKind::Crc32c, b"123456789"), "e3069283");
    assert_eq!(
        digest_hex(HashKind::Md5, b"abc"),
        "900150983cd24fb0d6963f7d28e17f72"
    );
    assert_eq!(
        digest_hex(HashKind::Sha256, b"hello world"),
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
}

#[test]
fn streaming_matches_one_shot() {
    // streaming wrappers must agree with the underlying one-shot digests,
    // regardless of how the input is split
    let data = b"the quick brown fox jumps over the lazy dog".repeat(37);

    let split_hex = |kind: HashKind| {
        let mut hasher = hasher_for(kind);
        for chunk in data.chunks(7) {
            hasher.update(chunk);
        }
        hex::encode(hasher.finalize())
    };

    assert_eq!(
        split_hex(HashKind::Sha3_224),
        hex::encode(sha3::Sha3_224::digest(&data))
    );
    assert_eq!(
        split_hex(HashKind::Sha3_512),
        hex::encode(sha3::Sha3_512::digest(&data))
    );
    assert_eq!(
        split_hex(HashKind::Blake2sp),
        blake2s_simd::blake2sp::blake2sp(&data).to_hex().to_string()
    );
    assert_eq!(
        split_hex(HashKind::Blake3),
        blake3::hash(&data).to_hex().to_string()
    );
}

#[test]
fn ed2k_small_input_is_md4() {
    let data = b"some unremarkable bytes";
    let mut ed2k = Ed2k::new();
    ed2k.update(data);
    assert_eq!(ed2k.finalize(), Md4::digest(data).to_vec());
}

#[test]
fn ed2k_chunked_input() {
    // one full chunk plus a short tail: the hash is the MD4 of the
    // concatenated chunk digests
    let mut data = vec![0x5au8; ED2K_CHUNK_SIZE];
    data.extend_from_slice(b"tail");

    let mut ed2k = Ed2k::new();
    for part in data.chunks(1 << 16) {
        ed2k.update(part);
    }

    let mut digests = Vec::new();
    digests.extend_from_slice(&Md4::digest(&data[..ED2K_CHUNK_SIZE]));
    digests.extend_from_slice(&Md4::digest(&data[ED2K_CHUNK_SIZE..]));
    assert_eq!(ed2k.finalize(), Md4::digest(&digests).to_vec());
}

#[test]
fn ed2k_exact_chunk_multiple_appends_empty_chunk() {
    let data = vec![0x11u8; ED2K_CHUNK_SIZE];

    let mut ed2k = Ed2k::new();
    ed2k.update(&data);

    let mut digests = Vec::new();
    digests.extend_from_slice(&Md4::digest(&data));
    digests.extend_from_slice(&Md4::digest(b""));
    assert_eq!(ed2k.finalize(), Md4::digest(&digests).to_vec());
}

#[test]
fn digest_lengths_match_table() {
    for kind in HashKind::ALL {
        let mut hasher = hasher_for(kind);
        assert_eq!(hasher.output_size(), kind.digest_len());
        hasher.update(b"xyz");
        assert_eq!(hasher.finalize().len(), kind.digest_len());
    }
}

#[test]
fn algorithm_listing_is_complete() {
    let infos = list_algorithms();
    assert_eq!(infos.len(), HashKind::COUNT);
    assert!(infos.iter().any(|i| i.name == "CRC32" && !i.cryptographic));
    assert!(infos.iter().any(|i| i.name == "SHA256" && i.output_bits == 256));
}

#[test]
fn kind_from_name_round_trips() {
    for kind in HashKind::ALL {
        assert_eq!(HashKind::from_name(kind.name()), Some(kind));
    }
    assert_eq!(HashKind::from_name("sha-256"), Some(HashKind::Sha256));
    assert_eq!(HashKind::from_name("whirlpool"), None);
}

#[test]
fn worker_releases_buffer_before_ack() {
    let (feed_tx, feed_rx) = crossbeam_channel::unbounded();
    let (ready_tx, ready_rx) = crossbeam_channel::unbounded();
    let handle = spawn_worker(HashKind::Sha256, feed_rx, ready_tx).unwrap();

    let data = Arc::new(b"hello ".to_vec());
    feed_tx
        .send(Handoff {
            data: Arc::clone(&data),
            len: 6,
        })
        .unwrap();
    ready_rx.recv().unwrap();
    // the ack means the worker dropped its view: the engine may reuse it
    assert_eq!(Arc::strong_count(&data), 1);

    feed_tx
        .send(Handoff {
            data: Arc::new(b"world".to_vec()),
            len: 5,
        })
        .unwrap();
    ready_rx.recv().unwrap();

    // disconnect finalizes
    drop(feed_tx);
    let digest = handle.join().unwrap();
    assert_eq!(
        hex::encode(digest),
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
}

#[test]
fn worker_handles_zero_length_round() {
    let (feed_tx, feed_rx) = crossbeam_channel::unbounded();
    let (ready_tx, ready_rx) = crossbeam_channel::unbounded();
    let handle = spawn_worker(HashKind::Md5, feed_rx, ready_tx).unwrap();

    feed_tx
        .send(Handoff {
            data: Arc::new(vec![0u8; 16]),
            len: 0,
        })
        .unwrap();
    ready_rx.recv().unwrap();
    drop(feed_tx);

    let digest = handle.join().unwrap();
    assert_eq!(hex::encode(digest), "d41d8cd98f00b204e9800998ecf8427e");
}
