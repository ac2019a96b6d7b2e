mod cmd_hook;
mod cmd_session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "scribe",
    version,
    about = "Session activity tracking and session-notes reports"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hook entrypoints (reads the hook payload from stdin)
    Hook {
        #[command(subcommand)]
        host: HookHost,
    },
    /// Write a session-notes report now, bypassing the checkpoint gate
    Report {
        /// Session ID (defaults to the most recently active session)
        #[arg(long)]
        session: Option<String>,
        /// Project directory (defaults to the current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
    /// Show counters and gate state for a session
    Status {
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Discard a session's accumulated state
    Reset {
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum HookHost {
    /// Claude Code hooks
    Claude,
}

fn init_logging() {
    // stdout carries hook JSON, so logs go to stderr.
    let filter = EnvFilter::try_from_env("SCRIBE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Hook {
            host: HookHost::Claude,
        } => cmd_hook::claude(),
        Command::Report { session, cwd } => {
            cmd_session::report(&resolve_cwd(cwd)?, session.as_deref())
        }
        Command::Status { session, cwd, json } => {
            cmd_session::status(&resolve_cwd(cwd)?, session.as_deref(), json)
        }
        Command::Reset { session, cwd } => {
            cmd_session::reset(&resolve_cwd(cwd)?, session.as_deref())
        }
    }
}

fn resolve_cwd(cwd: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match cwd {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}
