//! A connection to one remote peer.
//!
//! The driver listens and [`Session::accept`]s the agent; the agent
//! [`Session::connect`]s to the port the driver published. After that both
//! sides are symmetric.

use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use synclink_proto::{ByteReader, ByteWriter, Message, MessageKind, Variant};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::receive::{self, SharedReader};

/// An open connection to a peer.
///
/// `send` and `receive` take `&self` and lock independent halves, so one
/// thread may send while another waits to receive. At most one receive
/// runs at a time; an overlapping call fails with
/// [`Error::ReceiveInProgress`].
///
/// The socket is shut down when the session is closed or dropped.
#[derive(Debug)]
pub struct Session {
    /// Remote peer name.
    peer: String,
    /// Handle used to shut the socket down.
    stream: TcpStream,
    /// Encoder half.
    writer: Mutex<ByteWriter<TcpStream>>,
    /// Decoder half, shared with reader workers.
    reader: SharedReader<TcpStream>,
    /// Held for the duration of a receive.
    receiving: Mutex<()>,
}

impl Session {
    /// Connects to a peer listening on `addr`.
    pub fn connect(addr: SocketAddr, config: &SessionConfig) -> Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, config.connect_timeout).map_err(|source| {
            Error::Connect {
                peer: config.peer.clone(),
                target: addr.to_string(),
                source,
            }
        })?;
        tracing::info!(peer = %config.peer, %addr, "connected");
        Self::from_stream(stream, config)
    }

    /// Waits for a peer to connect to `listener`.
    pub fn accept(listener: &TcpListener, config: &SessionConfig) -> Result<Self> {
        let (stream, addr) = listener.accept().map_err(|source| Error::Connect {
            peer: config.peer.clone(),
            target: listener
                .local_addr()
                .map_or_else(|_| "listener".to_owned(), |a| a.to_string()),
            source,
        })?;
        tracing::info!(peer = %config.peer, %addr, "accepted connection");
        Self::from_stream(stream, config)
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream, config: &SessionConfig) -> Result<Self> {
        let peer = config.peer.clone();
        let setup = |e| Error::Connect {
            peer: peer.clone(),
            target: stream
                .peer_addr()
                .map_or_else(|_| "stream".to_owned(), |a| a.to_string()),
            source: e,
        };

        stream.set_nodelay(config.nodelay).map_err(setup)?;
        let read_half = stream.try_clone().map_err(setup)?;
        let write_half = stream.try_clone().map_err(setup)?;

        let name: Arc<str> = Arc::from(peer.as_str());
        Ok(Self {
            writer: Mutex::new(ByteWriter::new(Arc::clone(&name), write_half)),
            reader: Arc::new(Mutex::new(ByteReader::new(name, read_half))),
            receiving: Mutex::new(()),
            stream,
            peer,
        })
    }

    /// Name of the remote peer.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Local address of the underlying socket.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    /// Sends one message and flushes it.
    ///
    /// Failures are not retried.
    pub fn send(&self, msg: impl Into<Message>) -> Result<()> {
        let msg = msg.into();
        tracing::debug!(peer = %self.peer, kind = %msg.kind(), "sending message");
        synclink_proto::encode(&mut *self.writer.lock(), &msg)?;
        Ok(())
    }

    /// Receives a message of type `T`, waiting at most `timeout`.
    ///
    /// Any other variant is reported as [`Error::UnexpectedMessage`].
    pub fn receive<T: Variant>(&self, timeout: Duration) -> Result<T> {
        let msg = self.receive_kind(T::KIND, timeout)?;
        T::from_message(msg).map_err(|other| Error::UnexpectedMessage {
            peer: self.peer.clone(),
            expected: T::KIND,
            actual: other.kind(),
        })
    }

    /// Receives a message of variant `kind`, waiting at most `timeout`.
    pub fn receive_kind(&self, kind: MessageKind, timeout: Duration) -> Result<Message> {
        let msg = self.receive_any(timeout)?;
        receive::expect_kind(&self.peer, kind, msg)
    }

    /// Receives whatever message comes next, waiting at most `timeout`.
    ///
    /// After a timeout the read that was in flight keeps running in the
    /// background and swallows the next message the peer sends.
    pub fn receive_any(&self, timeout: Duration) -> Result<Message> {
        let Some(_guard) = self.receiving.try_lock() else {
            return Err(Error::ReceiveInProgress {
                peer: self.peer.clone(),
            });
        };
        receive::receive(&self.reader, &self.peer, timeout)
    }

    /// Shuts the connection down in both directions.
    ///
    /// Readers still blocked on the socket observe end-of-stream.
    pub fn close(self) -> Result<()> {
        tracing::info!(peer = %self.peer, "closing session");
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != std::io::ErrorKind::NotConnected => {
                Err(synclink_proto::Error::Io {
                    peer: self.peer.clone(),
                    op: "close connection to",
                    source: e,
                }
                .into())
            }
            _ => Ok(()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Instant;

    use synclink_proto::{
        ConnectionParameters, SyncCompleted, SyncParameters, SyncRequest, SyncRequestType,
        SyncStarted,
    };

    use super::*;

    /// Returns `(driver side, agent side)`.
    fn pair() -> (Session, Session) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let agent =
            thread::spawn(move || Session::connect(addr, &SessionConfig::new("driver")).unwrap());
        let driver = Session::accept(&listener, &SessionConfig::new("agent")).unwrap();
        (driver, agent.join().unwrap())
    }

    #[test]
    fn typed_exchange_in_both_directions() {
        let (driver, agent) = pair();

        driver.send(ConnectionParameters::new("/opt/gradle")).unwrap();
        driver
            .send(SyncParameters {
                gradle_args: vec!["--offline".into()],
                jvm_args: vec![],
            })
            .unwrap();

        let conn: ConnectionParameters = agent.receive(Duration::from_secs(5)).unwrap();
        assert_eq!(conn.installation(), std::path::Path::new("/opt/gradle"));
        let params: SyncParameters = agent.receive(Duration::from_secs(5)).unwrap();
        assert_eq!(params.gradle_args, ["--offline"]);
        assert!(params.jvm_args.is_empty());

        agent.send(SyncStarted { id: 1 }).unwrap();
        agent
            .send(SyncCompleted {
                id: 1,
                duration_millis: 1500,
            })
            .unwrap();
        assert_eq!(
            driver.receive::<SyncStarted>(Duration::from_secs(5)).unwrap(),
            SyncStarted { id: 1 }
        );
        let done: SyncCompleted = driver.receive(Duration::from_secs(5)).unwrap();
        assert_eq!(done.duration_millis, 1500);
    }

    #[test]
    fn wrong_variant_is_reported() {
        let (driver, agent) = pair();
        agent.send(SyncStarted { id: 4 }).unwrap();

        let err = driver
            .receive::<SyncCompleted>(Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedMessage {
                expected: MessageKind::SyncCompleted,
                actual: MessageKind::SyncStarted,
                ..
            }
        ));
    }

    #[test]
    fn timeout_then_fresh_receive() {
        let (driver, agent) = pair();

        let start = Instant::now();
        let err = driver
            .receive::<SyncStarted>(Duration::from_millis(50))
            .unwrap_err();
        assert!(err.is_timeout());
        let waited = start.elapsed();
        assert!(waited < Duration::from_millis(100), "{waited:?}");

        // Swallowed by the abandoned reader.
        thread::sleep(Duration::from_millis(150));
        agent.send(SyncStarted { id: 1 }).unwrap();
        agent.send(SyncStarted { id: 2 }).unwrap();

        let next: SyncStarted = driver.receive(Duration::from_secs(5)).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn overlapping_receive_is_rejected() {
        let (driver, agent) = pair();
        let driver = Arc::new(driver);

        let waiting = {
            let driver = Arc::clone(&driver);
            thread::spawn(move || driver.receive::<SyncRequest>(Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(100));

        let start = Instant::now();
        let err = driver.receive_any(Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::ReceiveInProgress { .. }), "{err}");
        assert!(start.elapsed() < Duration::from_secs(1));

        let req = SyncRequest {
            id: 3,
            kind: SyncRequestType::Sync,
        };
        agent.send(req).unwrap();
        assert_eq!(waiting.join().unwrap().unwrap(), req);
    }

    #[test]
    fn send_while_receiving() {
        let (driver, agent) = pair();
        let driver = Arc::new(driver);

        let waiting = {
            let driver = Arc::clone(&driver);
            thread::spawn(move || driver.receive::<SyncStarted>(Duration::from_secs(5)))
        };
        driver.send(SyncStarted { id: 8 }).unwrap();
        let echoed: SyncStarted = agent.receive(Duration::from_secs(5)).unwrap();
        agent.send(echoed).unwrap();

        assert_eq!(waiting.join().unwrap().unwrap().id, 8);
    }

    #[test]
    fn close_is_seen_as_closed() {
        let (driver, agent) = pair();
        agent.close().unwrap();

        let err = driver.receive_any(Duration::from_secs(5)).unwrap_err();
        assert!(err.is_closed(), "{err}");
        assert!(err.to_string().contains("agent"));
    }

    #[test]
    fn drop_releases_connection() {
        let (driver, agent) = pair();
        drop(agent);

        let err = driver.receive_any(Duration::from_secs(5)).unwrap_err();
        assert!(err.is_closed(), "{err}");
    }

    #[test]
    fn connect_failure_names_target() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = Session::connect(addr, &SessionConfig::new("driver")).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("could not connect to driver at {addr}")
        );
    }
}
