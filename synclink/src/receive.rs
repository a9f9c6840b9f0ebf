//! Deadline-bounded receive on top of a blocking decode.
//!
//! [`synclink_proto::decode`] parks in a transport read for as long as the
//! peer stays silent. [`receive`] moves that read onto a worker thread and
//! waits on a single-slot handoff for at most the caller's timeout.
//!
//! A worker that misses the deadline is cancelled cooperatively and then
//! abandoned: it cannot be pulled out of a blocking read, so it keeps the
//! reader locked until the peer sends something or closes the stream. Its
//! result is dropped since nobody holds the other end of its handoff. The
//! next worker queues on the reader lock behind it, so two decodes never
//! interleave on the same stream.

use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};
use parking_lot::Mutex;
use synclink_proto::{ByteReader, Message, MessageKind};

use crate::error::{Error, Result};

/// Decoder half of a connection, shared with reader workers.
pub(crate) type SharedReader<R> = Arc<Mutex<ByteReader<R>>>;

/// What a worker hands back: a message, `None` on disconnect, or a failure.
type Outcome = synclink_proto::Result<Option<Message>>;

/// Receives one message, returning control within `timeout`.
pub(crate) fn receive<R>(reader: &SharedReader<R>, peer: &str, timeout: Duration) -> Result<Message>
where
    R: Read + Send + 'static,
{
    let start = Instant::now();
    let (tx, rx) = channel::bounded::<Outcome>(1);
    let cancelled = Arc::new(AtomicBool::new(false));

    let worker = {
        let reader = Arc::clone(reader);
        let cancelled = Arc::clone(&cancelled);
        let name = peer.to_owned();
        thread::Builder::new()
            .name("synclink-reader".to_owned())
            .spawn(move || {
                let mut guard = reader.lock();
                // Gave up on us while an abandoned worker held the lock.
                if cancelled.load(Ordering::Acquire) {
                    return;
                }
                let outcome = synclink_proto::decode(&mut *guard);
                drop(guard);
                if cancelled.load(Ordering::Acquire) {
                    tracing::warn!(peer = %name, "discarding message received after timeout");
                    return;
                }
                // The caller may time out between the check and here.
                let _ = tx.send(outcome);
            })
            .map_err(|source| Error::Worker {
                peer: peer.to_owned(),
                source,
            })?
    };

    match rx.recv_timeout(timeout) {
        Ok(outcome) => {
            // The worker has already sent, so this returns promptly.
            let _ = worker.join();
            match outcome {
                Ok(Some(msg)) => {
                    tracing::debug!(peer, kind = %msg.kind(), "received message");
                    Ok(msg)
                }
                Ok(None) => Err(Error::Closed {
                    peer: peer.to_owned(),
                }),
                Err(e) => Err(e.into()),
            }
        }
        Err(RecvTimeoutError::Timeout) => {
            cancelled.store(true, Ordering::Release);
            let elapsed = start.elapsed();
            tracing::debug!(peer, ?elapsed, "receive timed out, abandoning reader");
            Err(Error::Timeout {
                peer: peer.to_owned(),
                elapsed,
            })
        }
        Err(RecvTimeoutError::Disconnected) => {
            // Only reachable if the worker panicked before sending.
            let _ = worker.join();
            Err(Error::Worker {
                peer: peer.to_owned(),
                source: io::Error::other("reader thread panicked"),
            })
        }
    }
}

/// Checks that `msg` is the variant the exchange is waiting for.
pub(crate) fn expect_kind(peer: &str, expected: MessageKind, msg: Message) -> Result<Message> {
    if msg.kind() == expected {
        Ok(msg)
    } else {
        Err(Error::UnexpectedMessage {
            peer: peer.to_owned(),
            expected,
            actual: msg.kind(),
        })
    }
}
