//! Agent side of the sync exchange.
//!
//! The agent runs inside the IDE. It waits for [`SyncRequest`]s from the
//! driver, performs each sync through a [`SyncHandler`], reports back with a
//! [`SyncRequestCompleted`], and stops when asked to exit.

use std::time::{Duration, Instant};

use synclink_proto::{SyncRequest, SyncRequestCompleted, SyncRequestType, SyncResult};

use crate::Session;
use crate::error::Result;

/// How long the agent waits for the next request before giving up.
pub const DEFAULT_POLL: Duration = Duration::from_secs(24 * 60 * 60);

/// Performs the sync asked for by a request.
pub trait SyncHandler {
    /// Runs one sync and reports its outcome.
    fn sync(&mut self, request: &SyncRequest) -> SyncResult;
}

impl<F> SyncHandler for F
where
    F: FnMut(&SyncRequest) -> SyncResult,
{
    fn sync(&mut self, request: &SyncRequest) -> SyncResult {
        self(request)
    }
}

/// Serves sync requests until the driver sends `EXIT`.
///
/// Each request waits at most `poll` for the driver; a timeout or a closed
/// connection ends the loop with an error. Returns the number of syncs
/// performed.
pub fn serve(session: &Session, handler: &mut impl SyncHandler, poll: Duration) -> Result<usize> {
    let mut served = 0;
    loop {
        let request: SyncRequest = session.receive(poll)?;
        match request.kind {
            SyncRequestType::Exit => {
                tracing::info!(id = request.id, served, "exit requested");
                return Ok(served);
            }
            SyncRequestType::Sync => {
                tracing::info!(id = request.id, "sync requested");
                let start = Instant::now();
                let result = handler.sync(&request);
                let duration_millis = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);
                tracing::info!(id = request.id, %result, duration_millis, "sync finished");

                session.send(SyncRequestCompleted {
                    id: request.id,
                    duration_millis,
                    result,
                })?;
                served += 1;
            }
        }
    }
}
