//! Wire protocol for synclink driver↔agent communication.
//!
//! Messages are a single tag byte followed by fixed-width big-endian
//! integers and length-prefixed UTF-8 strings, suitable for any reliable
//! byte stream (TCP, Unix socket).

mod channel;
mod codec;
mod error;
mod message;

pub use channel::{ByteReader, ByteWriter, MAX_LIST_LEN, MAX_STRING_LEN};
pub use codec::{decode, encode};
pub use error::{Error, Result};
pub use message::{
    ConnectionParameters, Message, MessageKind, PORT_ENV, Symbol, SyncCompleted, SyncParameters,
    SyncRequest, SyncRequestCompleted, SyncRequestType, SyncResult, SyncStarted, Variant,
};
