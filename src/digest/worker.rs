// Digest worker handoff protocol
//
// One worker thread per active algorithm per file. The engine passes a
// shared read-only view of the freshly filled buffer to every worker and
// collects one ready token per worker before it reuses the buffer. The
// worker never learns which file it is hashing; it is a pure stream
// consumer. Disconnecting the handoff channel tells the worker the stream
// ended; the finalized digest travels back through the join handle.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use super::algo::HashKind;
use super::hasher_for;

/// One buffer round handed to a worker: a shared view plus the number of
/// valid bytes in it.
pub struct Handoff {
    pub data: Arc<Vec<u8>>,
    pub len: usize,
}

/// Spawn a digest worker thread for one algorithm.
///
/// The worker consumes `Handoff` rounds until the sender side disconnects,
/// acknowledging each round on `ready`, then finalizes and returns the
/// digest bytes.
pub fn spawn_worker(
    kind: HashKind,
    rounds: Receiver<Handoff>,
    ready: Sender<()>,
) -> std::io::Result<JoinHandle<Vec<u8>>> {
    thread::Builder::new()
        .name(format!("digest-{}", kind.name().to_lowercase()))
        .spawn(move || {
            let mut hasher = hasher_for(kind);
            while let Ok(round) = rounds.recv() {
                hasher.update(&round.data[..round.len]);
                // The shared view must be released before the ack: the
                // engine regains exclusive buffer access at the barrier.
                drop(round);
                if ready.send(()).is_err() {
                    break;
                }
            }
            hasher.finalize()
        })
}
