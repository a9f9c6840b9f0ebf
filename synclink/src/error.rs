//! Error types for synclink sessions.

use std::time::Duration;

use synclink_proto::MessageKind;

/// Alias for `Result<T, synclink::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by session operations.
///
/// Every variant names the peer so operators can tell which side of the
/// link stalled or closed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Reading or writing the wire failed, or the peer broke the protocol.
    #[error(transparent)]
    Proto(#[from] synclink_proto::Error),

    /// The peer closed the connection at a message boundary.
    #[error("connection to {peer} has closed")]
    Closed {
        /// Remote peer name.
        peer: String,
    },

    /// No message arrived before the receive deadline.
    #[error("timeout waiting to receive message from {peer} after {elapsed:?}")]
    Timeout {
        /// Remote peer name.
        peer: String,
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// A message arrived, but not the one the exchange called for.
    #[error("expected {expected} from {peer}, received {actual}")]
    UnexpectedMessage {
        /// Remote peer name.
        peer: String,
        /// Variant the caller was waiting for.
        expected: MessageKind,
        /// Variant that arrived.
        actual: MessageKind,
    },

    /// A reply answered a different request than the one outstanding.
    #[error("expected reply to request {expected} from {peer}, received reply to {actual}")]
    IdMismatch {
        /// Remote peer name.
        peer: String,
        /// Id of the outstanding request.
        expected: i32,
        /// Id carried by the reply.
        actual: i32,
    },

    /// Another `receive` on the same session has not returned yet.
    #[error("a receive from {peer} is already in progress")]
    ReceiveInProgress {
        /// Remote peer name.
        peer: String,
    },

    /// Establishing the connection failed.
    #[error("could not connect to {peer} at {target}")]
    Connect {
        /// Remote peer name.
        peer: String,
        /// Address that was dialled or bound.
        target: String,
        /// The transport error.
        #[source]
        source: std::io::Error,
    },

    /// The reader thread could not be started.
    #[error("could not start reader for {peer}")]
    Worker {
        /// Remote peer name.
        peer: String,
        /// The spawn error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if this is a receive deadline expiry.
    ///
    /// The connection may still be usable afterwards.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the peer closed the connection cleanly.
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// Returns `true` for framing and exchange violations. The connection
    /// must not be used after one of these.
    pub const fn is_protocol(&self) -> bool {
        match self {
            Self::Proto(e) => e.is_protocol(),
            Self::UnexpectedMessage { .. } | Self::IdMismatch { .. } => true,
            _ => false,
        }
    }
}
