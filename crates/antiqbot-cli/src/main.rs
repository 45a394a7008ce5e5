//! AntiqBot - a command-line client for the AntiqBot antiques appraisal service.
//!
//! Log in, upload a photo with an optional comment, spend a credit on an
//! appraisal, and review account and credit information.

mod app;
mod cli;
mod format;

use std::io;

use anyhow::Result;
use antiqbot_core::Config;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::{Cli, Command};

/// Log file name inside the cache directory
const LOG_FILE: &str = "antiqbot.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file in the cache directory so they do not mix with command
/// output; stderr is used when there is no cache directory. The returned
/// guard must live until exit to flush the file writer.
fn init_tracing(verbosity: u8) -> Option<WorkerGuard> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG overrides the -v flags (e.g., RUST_LOG=antiqbot_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_dir = Config::default()
        .cache_dir()
        .ok()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_guard = init_tracing(cli.verbose);
    info!(command = ?cli.command, "AntiqBot starting");

    let result = run(cli.api_url, cli.command).await;

    // Flush the log file before exiting
    drop(log_guard);

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(api_url: Option<String>, command: Command) -> Result<()> {
    let mut app = App::new(api_url)?;
    app.run(command).await
}
