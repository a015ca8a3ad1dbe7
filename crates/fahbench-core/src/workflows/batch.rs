use super::config::{BenchPaths, ConfigError, DEFAULT_WORK_UNIT, SimulationConfig};
use super::error::SimulationError;
use super::result::SimulationResult;
use super::simulation::Simulation;
use super::updater::Updater;
use crate::core::models::workunit::WorkUnit;
use crate::engine::NativeEngine;
use crate::engine::platform::REFERENCE_PLATFORM;
use crate::engine::traits::Engine;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// How a [`SimulationSet`] discovers its devices and work unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOptions {
    pub plugin_dir: PathBuf,
    pub work_unit_dir: PathBuf,
    pub work_unit: String,
    /// Devices whose vendor or name contains this text are skipped.
    pub disallowed_vendor: Option<String>,
}

impl SetOptions {
    pub fn from_environment() -> Result<Self, ConfigError> {
        let paths = BenchPaths::resolve()?;
        Ok(Self {
            plugin_dir: paths.plugin_dir,
            work_unit_dir: paths.workunit_dir,
            work_unit: DEFAULT_WORK_UNIT.to_string(),
            disallowed_vendor: Some("Intel".to_string()),
        })
    }
}

/// One [`Simulation`] per usable device, driven strictly in sequence.
pub struct SimulationSet<E: Engine + Clone = NativeEngine> {
    simulations: Vec<Simulation<E>>,
}

impl SimulationSet<NativeEngine> {
    /// Builds a set over every device of every non-reference platform,
    /// resolving directories from the environment.
    pub fn for_devices(run_length: Duration) -> Result<Self, SimulationError> {
        let options = SetOptions::from_environment()?;
        Self::for_devices_with(NativeEngine::new(), run_length, &options)
    }
}

impl<E: Engine + Clone> SimulationSet<E> {
    #[instrument(skip_all, name = "simulation_set")]
    pub fn for_devices_with(
        mut engine: E,
        run_length: Duration,
        options: &SetOptions,
    ) -> Result<Self, SimulationError> {
        engine.load_plugins_from_directory(&options.plugin_dir)?;
        let work_unit = WorkUnit::named(&options.work_unit_dir, &options.work_unit)?;

        let mut simulations = Vec::new();
        for platform in engine.platforms() {
            if platform.name == REFERENCE_PLATFORM {
                continue;
            }
            for device in &platform.devices {
                let filtered = options
                    .disallowed_vendor
                    .as_deref()
                    .is_some_and(|v| device.vendor.contains(v) || device.name.contains(v));
                if filtered {
                    info!(platform = %platform.name, device = %device.name, "Skipping disallowed device.");
                    continue;
                }
                let config = SimulationConfig::builder()
                    .work_unit(work_unit.clone())
                    .platform(platform.name.clone())
                    .device_index(device.device_index)
                    .platform_index(device.platform_index)
                    .run_length(run_length)
                    .plugin_dir(options.plugin_dir.clone())
                    .build()?;
                simulations.push(Simulation::with_engine(engine.clone(), config));
            }
        }
        info!(count = simulations.len(), "Built simulation set.");
        Ok(Self { simulations })
    }

    pub fn len(&self) -> usize {
        self.simulations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simulations.is_empty()
    }

    pub fn simulations(&self) -> &[Simulation<E>] {
        &self.simulations
    }

    /// Prepares every simulation in order. Stops at the first cancellation.
    ///
    /// Returns `Cancelled` if preparation was cancelled, `Failed` if any
    /// simulation failed to prepare (or the set is empty), else `Queued`.
    /// Simulations that did prepare keep their contexts either way.
    pub fn prepare_all(&mut self, updater: &Updater) -> Result<SimulationResult, SimulationError> {
        let mut outcome = if self.simulations.is_empty() {
            SimulationResult::Failed
        } else {
            SimulationResult::Queued
        };
        for simulation in &mut self.simulations {
            match simulation.prepare(updater)? {
                SimulationResult::Cancelled => return Ok(SimulationResult::Cancelled),
                SimulationResult::Queued => {}
                other => {
                    warn!(platform = %simulation.config().platform, "Simulation failed to prepare.");
                    outcome = other;
                }
            }
        }
        Ok(outcome)
    }

    /// Runs every simulation in order and returns the best scaled score.
    /// Stops at the first cancellation.
    pub fn run_all(&mut self, updater: &Updater) -> Result<f64, SimulationError> {
        let mut best: f64 = 0.0;
        for simulation in &mut self.simulations {
            let result = simulation.run(updater)?;
            if result == SimulationResult::Cancelled {
                break;
            }
            best = best.max(result.scaled_score());
        }
        Ok(best)
    }

    pub fn summary(&self) -> String {
        self.simulations.iter().map(Simulation::summary).collect()
    }
}
