//! CLI for driving and serving synclink sync exchanges.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod agent;
mod listen;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synclink", version, about = "Sync exchange between a benchmark driver and an IDE agent")]
struct Cli {
    /// Log protocol traffic.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wait for an agent, request syncs, then tell it to exit.
    Listen(listen::ListenArgs),

    /// Connect to a driver and serve its sync requests.
    Agent(agent::AgentArgs),

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

/// Output format for sync results.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// Machine-readable JSON.
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = cli.dispatch() {
        eprintln!("synclink: {e:#}");
        std::process::exit(1);
    }
}

/// Logs to stderr; `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "synclink=debug" } else { "synclink=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    fn dispatch(self) -> Result<()> {
        match self.command {
            Command::Listen(args) => listen::run(&args),
            Command::Agent(args) => agent::run(&args),
            Command::Completion { shell } => {
                clap_complete::generate(shell, &mut Self::command(), "synclink", &mut std::io::stdout());
                Ok(())
            }
        }
    }
}
