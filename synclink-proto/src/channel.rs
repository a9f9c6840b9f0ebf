//! Framed read/write primitives over a duplex byte stream.
//!
//! Integers are fixed width in network byte order. Strings are UTF-8 bytes
//! behind an `i32` length prefix; string lists are an `i32` count followed
//! by that many strings.
//!
//! The stream is used through two halves, [`ByteReader`] and
//! [`ByteWriter`], so that one thread can block on a read while another
//! writes.

use std::io::{self, BufReader, Read, Write};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Largest string payload accepted in either direction (16 MiB).
pub const MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Largest string list accepted in either direction.
pub const MAX_LIST_LEN: usize = 64 * 1024;

/// Reading half of a byte channel.
#[derive(Debug)]
pub struct ByteReader<R> {
    /// Remote peer name, used in every error.
    peer: Arc<str>,
    /// Buffered stream.
    inner: BufReader<R>,
}

impl<R: Read> ByteReader<R> {
    /// Wraps the reading side of a stream connected to `peer`.
    pub fn new(peer: impl Into<Arc<str>>, inner: R) -> Self {
        Self {
            peer: peer.into(),
            inner: BufReader::new(inner),
        }
    }

    /// Name of the remote peer.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Reads one byte.
    ///
    /// Returns [`Error::EndOfStream`] if the peer has closed the stream,
    /// which is how a clean disconnect at a message boundary shows up.
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => {
                    return Err(Error::EndOfStream {
                        peer: self.peer.to_string(),
                    });
                }
                Ok(_) => return Ok(buf[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.io(e)),
            }
        }
    }

    /// Reads a big-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_be_bytes)
    }

    /// Reads a big-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_array().map(i64::from_be_bytes)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_len(MAX_STRING_LEN)?;
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf).map_err(|e| self.io(e))?;
        String::from_utf8(buf).map_err(|_| Error::InvalidUtf8 {
            peer: self.peer.to_string(),
        })
    }

    /// Reads a count-prefixed list of strings, preserving order.
    pub fn read_strings(&mut self) -> Result<Vec<String>> {
        let count = self.read_len(MAX_LIST_LEN)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.read_string()?);
        }
        Ok(items)
    }

    /// Reads exactly `N` bytes. EOF here is mid-message and thus an I/O error.
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(|e| self.io(e))?;
        Ok(buf)
    }

    /// Reads an `i32` prefix and checks it against `0..=max`.
    fn read_len(&mut self, max: usize) -> Result<usize> {
        let len = self.read_i32()?;
        usize::try_from(len)
            .ok()
            .filter(|n| *n <= max)
            .ok_or_else(|| Error::InvalidLength {
                peer: self.peer.to_string(),
                len,
            })
    }

    /// Wraps a transport failure as a read error naming the peer.
    fn io(&self, source: io::Error) -> Error {
        Error::Io {
            peer: self.peer.to_string(),
            op: "read from",
            source,
        }
    }
}

/// Writing half of a byte channel.
///
/// Writes accumulate in memory until [`ByteWriter::flush`]; nothing reaches
/// the peer before that.
#[derive(Debug)]
pub struct ByteWriter<W> {
    /// Remote peer name, used in every error.
    peer: Arc<str>,
    /// Underlying stream.
    inner: W,
    /// Bytes written since the last flush.
    buf: Vec<u8>,
}

impl<W: Write> ByteWriter<W> {
    /// Wraps the writing side of a stream connected to `peer`.
    pub fn new(peer: impl Into<Arc<str>>, inner: W) -> Self {
        Self {
            peer: peer.into(),
            inner,
            buf: Vec::new(),
        }
    }

    /// Name of the remote peer.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Number of bytes buffered and not yet flushed.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Appends one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Appends a big-endian `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian `i64`.
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        let len = self.len_prefix(value.len(), MAX_STRING_LEN)?;
        self.write_i32(len);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Appends a count-prefixed list of strings.
    ///
    /// Every element is checked before anything is buffered, so a rejected
    /// list leaves the buffer untouched.
    pub fn write_strings(&mut self, items: &[String]) -> Result<()> {
        let count = self.len_prefix(items.len(), MAX_LIST_LEN)?;
        for item in items {
            self.len_prefix(item.len(), MAX_STRING_LEN)?;
        }
        self.write_i32(count);
        for item in items {
            self.write_str(item)?;
        }
        Ok(())
    }

    /// Writes all buffered bytes to the stream and flushes it.
    ///
    /// The buffer is cleared whether or not the write succeeds; a failed
    /// flush is never retried from here.
    pub fn flush(&mut self) -> Result<()> {
        let res = self
            .inner
            .write_all(&self.buf)
            .and_then(|()| self.inner.flush());
        self.buf.clear();
        res.map_err(|source| Error::Io {
            peer: self.peer.to_string(),
            op: "write to",
            source,
        })
    }

    /// Drops buffered bytes without sending them.
    pub fn discard(&mut self) {
        self.buf.clear();
    }

    /// Returns the underlying stream. Unflushed bytes are dropped.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Converts an outgoing length to its prefix, rejecting anything over `max`.
    fn len_prefix(&self, len: usize, max: usize) -> Result<i32> {
        i32::try_from(len)
            .ok()
            .filter(|_| len <= max)
            .ok_or_else(|| Error::TooLong {
                peer: self.peer.to_string(),
                len,
            })
    }
}
