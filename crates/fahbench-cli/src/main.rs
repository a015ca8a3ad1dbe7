mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Sets `flag` on the first Ctrl-C. The benchmark notices it between step
/// chunks.
fn spawn_interrupt_watcher(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received; cancelling after the current step chunk.");
                flag.store(true, Ordering::Relaxed);
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("FAHBench v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let cancel = Arc::new(AtomicBool::new(false));
    spawn_interrupt_watcher(cancel.clone());

    let config_path = cli.config.as_deref();
    let command_result = match cli.command {
        Commands::Run => {
            info!("Dispatching to 'run' command.");
            commands::run::run(config_path, cancel).await
        }
        Commands::Devices => {
            info!("Dispatching to 'devices' command.");
            commands::devices::run(config_path).await
        }
    };

    if let Err(e) = &command_result {
        error!("Command failed: {}", e);
    }
    command_result
}
