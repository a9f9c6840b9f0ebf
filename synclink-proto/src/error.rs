//! Error types for the wire protocol.

use std::io;

/// Alias for `Result<T, synclink_proto::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading or writing protocol bytes.
///
/// Every variant names the peer on the other end of the stream so that
/// operators can tell which side of the link failed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying stream failed for a reason other than an orderly close.
    #[error("could not {op} {peer}")]
    Io {
        /// Remote peer name.
        peer: String,
        /// `"read from"` or `"write to"`.
        op: &'static str,
        /// The transport error.
        #[source]
        source: io::Error,
    },

    /// The peer closed the stream at a message boundary.
    #[error("{peer} closed the stream")]
    EndOfStream {
        /// Remote peer name.
        peer: String,
    },

    /// A message started with a tag byte outside the tag table.
    #[error("received unexpected message tag {tag} from {peer}")]
    UnknownTag {
        /// Remote peer name.
        peer: String,
        /// The offending tag byte.
        tag: u8,
    },

    /// An enum field carried a symbolic name this build does not know.
    #[error("received unknown {kind} `{name}` from {peer}")]
    UnknownSymbol {
        /// Remote peer name.
        peer: String,
        /// The enum being decoded.
        kind: &'static str,
        /// The symbol as received.
        name: String,
    },

    /// A length or count prefix was negative or over the allowed maximum.
    #[error("received invalid length prefix {len} from {peer}")]
    InvalidLength {
        /// Remote peer name.
        peer: String,
        /// The prefix as received.
        len: i32,
    },

    /// String bytes were not valid UTF-8.
    #[error("received malformed UTF-8 string from {peer}")]
    InvalidUtf8 {
        /// Remote peer name.
        peer: String,
    },

    /// An outgoing string's byte length or list's element count is over the
    /// prefix limit.
    #[error("cannot send to {peer}: length {len} exceeds the prefix limit")]
    TooLong {
        /// Remote peer name.
        peer: String,
        /// The rejected length.
        len: usize,
    },
}

impl Error {
    /// Returns `true` for errors that leave the stream at an unknown
    /// framing position. The connection must be closed after one of these.
    pub const fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::UnknownTag { .. }
                | Self::UnknownSymbol { .. }
                | Self::InvalidLength { .. }
                | Self::InvalidUtf8 { .. }
        )
    }
}
