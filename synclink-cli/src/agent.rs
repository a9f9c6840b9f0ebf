//! `synclink agent` — the IDE side, with a simulated sync.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use synclink::{DEFAULT_POLL, PORT_ENV, Session, SessionConfig, SyncRequest, SyncResult};

/// Arguments for `synclink agent`.
#[derive(clap::Args)]
pub struct AgentArgs {
    /// Driver port.
    #[arg(short, long, env = PORT_ENV)]
    pub(crate) port: u16,

    /// Driver host.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub(crate) host: IpAddr,

    /// Milliseconds each simulated sync takes.
    #[arg(long, default_value_t = 0)]
    pub(crate) sync_millis: u64,

    /// Outcome reported for every sync.
    #[arg(long, value_enum, default_value = "succeeded")]
    pub(crate) result: Outcome,
}

/// CLI spelling of [`SyncResult`].
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Outcome {
    /// Report `SUCCEEDED`.
    Succeeded,
    /// Report `FAILED`.
    Failed,
    /// Report `SKIPPED`.
    Skipped,
}

impl From<Outcome> for SyncResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Succeeded => Self::Succeeded,
            Outcome::Failed => Self::Failed,
            Outcome::Skipped => Self::Skipped,
        }
    }
}

pub fn run(args: &AgentArgs) -> Result<()> {
    let addr = SocketAddr::new(args.host, args.port);
    let session = Session::connect(addr, &SessionConfig::new("profiler"))?;

    let delay = Duration::from_millis(args.sync_millis);
    let result = SyncResult::from(args.result);
    let mut handler = |_: &SyncRequest| {
        thread::sleep(delay);
        result
    };
    let served = synclink::serve(&session, &mut handler, DEFAULT_POLL)?;
    session.close()?;

    eprintln!("served {served} sync request(s)");
    Ok(())
}
