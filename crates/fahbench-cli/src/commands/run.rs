use crate::config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use fahbench::workflows::{Simulation, SimulationResult};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

pub async fn run(config_path: Option<&Path>, cancel: Arc<AtomicBool>) -> Result<()> {
    let file_config = config::load_file_config(config_path)?;
    info!("Building benchmark configuration...");
    let simulation_config = config::build_config(file_config)?;
    let platform = simulation_config.platform.clone();

    let mut simulation = Simulation::new(simulation_config);
    println!("{}", simulation.summary());

    let progress = CliProgressHandler::new();
    let updater = progress.updater(cancel);

    info!("Invoking the benchmark...");
    let result = tokio::task::block_in_place(|| simulation.run(&updater));
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            progress.finish("Benchmark aborted");
            return Err(e.into());
        }
    };

    match result {
        SimulationResult::Finished { .. } => {
            progress.finish("Benchmark finished");
            println!("{}", result);
            Ok(())
        }
        SimulationResult::Cancelled => {
            progress.finish("Benchmark cancelled");
            warn!("Benchmark was cancelled before completion.");
            println!("Benchmark cancelled.");
            Ok(())
        }
        SimulationResult::Failed | SimulationResult::Queued => {
            progress.finish("Benchmark failed");
            Err(CliError::Config(format!(
                "platform '{}' is not available; run `fahbench devices` to list platforms",
                platform
            )))
        }
    }
}
