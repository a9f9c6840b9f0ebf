//! Driver side of the sync exchange.

use std::path::Path;
use std::time::Duration;

use synclink_proto::{
    ConnectionParameters, SyncParameters, SyncRequest, SyncRequestCompleted, SyncRequestType,
};

use crate::Session;
use crate::error::{Error, Result};

/// Issues numbered sync requests to a connected agent.
///
/// Request ids start at 1 and increase by one per request, `EXIT` included.
#[derive(Debug)]
pub struct Driver {
    /// Connection to the agent.
    session: Session,
    /// Id for the next request.
    next_id: i32,
}

impl Driver {
    /// Wraps a session connected to an agent.
    pub const fn new(session: Session) -> Self {
        Self {
            session,
            next_id: 1,
        }
    }

    /// The underlying session.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Tells the agent which build tool installation to use.
    pub fn connection_parameters(&self, installation: impl AsRef<Path>) -> Result<()> {
        self.session.send(ConnectionParameters::new(installation))
    }

    /// Sends the arguments for subsequent syncs.
    pub fn sync_parameters(&self, gradle_args: Vec<String>, jvm_args: Vec<String>) -> Result<()> {
        self.session.send(SyncParameters {
            gradle_args,
            jvm_args,
        })
    }

    /// Asks the agent to sync and waits up to `timeout` for its report.
    pub fn sync(&mut self, timeout: Duration) -> Result<SyncRequestCompleted> {
        let id = self.request(SyncRequestType::Sync)?;
        let done: SyncRequestCompleted = self.session.receive(timeout)?;
        if done.id != id {
            return Err(Error::IdMismatch {
                peer: self.session.peer().to_owned(),
                expected: id,
                actual: done.id,
            });
        }
        tracing::info!(id, result = %done.result, duration_millis = done.duration_millis, "sync completed");
        Ok(done)
    }

    /// Asks the agent to exit and closes the connection.
    pub fn exit(mut self) -> Result<()> {
        self.request(SyncRequestType::Exit)?;
        self.session.close()
    }

    /// Sends a request under the next id and returns that id.
    fn request(&mut self, kind: SyncRequestType) -> Result<i32> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.session.send(SyncRequest { id, kind })?;
        Ok(id)
    }
}
