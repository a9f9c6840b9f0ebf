//! `synclink listen` — the driver side.

use std::net::{Ipv4Addr, TcpListener};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use synclink::{Driver, PORT_ENV, Session, SessionConfig, SyncRequestCompleted, SyncResult};

use crate::OutputFormat;

/// Arguments for `synclink listen`.
#[derive(clap::Args)]
pub struct ListenArgs {
    /// Port to listen on (0 picks a free one).
    #[arg(short, long, env = PORT_ENV, default_value_t = 0)]
    pub(crate) port: u16,

    /// Number of syncs to request.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub(crate) syncs: u32,

    /// Seconds to wait for the agent to report each sync.
    #[arg(short, long, default_value_t = 600)]
    pub(crate) timeout: u64,

    /// Output format.
    #[arg(long, default_value = "table")]
    pub(crate) format: OutputFormat,
}

/// One finished sync, as printed.
#[derive(Debug, Serialize)]
struct Row {
    id: i32,
    duration_millis: i64,
    result: SyncResult,
}

impl From<SyncRequestCompleted> for Row {
    fn from(done: SyncRequestCompleted) -> Self {
        Self {
            id: done.id,
            duration_millis: done.duration_millis,
            result: done.result,
        }
    }
}

pub fn run(args: &ListenArgs) -> Result<()> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, args.port))
        .with_context(|| format!("bind port {}", args.port))?;
    let port = listener.local_addr()?.port();
    eprintln!("waiting for agent: {PORT_ENV}={port}");

    let session = Session::accept(&listener, &SessionConfig::new("IDE agent"))?;
    let mut driver = Driver::new(session);
    let timeout = Duration::from_secs(args.timeout);

    let mut rows = Vec::new();
    for _ in 0..args.syncs {
        rows.push(Row::from(driver.sync(timeout)?));
    }
    driver.exit()?;

    print_rows(&rows, args.format)
}

fn print_rows(rows: &[Row], format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }

    println!("{:<6} {:>12} {:<10}", "ID", "DURATION", "RESULT");
    for row in rows {
        println!(
            "{:<6} {:>12} {:<10}",
            row.id,
            format!("{} ms", row.duration_millis),
            row.result
        );
    }
    Ok(())
}
