//! Timeout-bounded IPC between a build benchmark driver and an IDE agent.
//!
//! `synclink` carries the [`synclink_proto`] wire protocol over a TCP
//! connection. Sending is synchronous; receiving waits at most a
//! caller-supplied timeout even though the socket read underneath blocks
//! indefinitely.
//!
//! # Quick start — driver
//!
//! ```no_run
//! use std::net::TcpListener;
//! use std::time::Duration;
//!
//! use synclink::{Driver, Session, SessionConfig};
//!
//! let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
//! // Publish listener.local_addr() to the agent, e.g. via SYNCLINK_PORT.
//! let session = Session::accept(&listener, &SessionConfig::new("IDE")).expect("accept");
//!
//! let mut driver = Driver::new(session);
//! let done = driver.sync(Duration::from_secs(600)).expect("sync");
//! println!("sync {} took {} ms", done.id, done.duration_millis);
//! driver.exit().expect("exit");
//! ```

mod agent;
mod config;
mod driver;
mod error;
mod receive;
mod session;

pub use agent::{DEFAULT_POLL, SyncHandler, serve};
pub use config::SessionConfig;
pub use driver::Driver;
pub use error::{Error, Result};
pub use session::Session;
pub use synclink_proto::{
    ConnectionParameters, Message, MessageKind, PORT_ENV, SyncCompleted, SyncParameters,
    SyncRequest, SyncRequestCompleted, SyncRequestType, SyncResult, SyncStarted, Variant,
};
