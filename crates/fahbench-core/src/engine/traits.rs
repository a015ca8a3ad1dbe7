use super::error::EngineError;
use super::platform::{PlatformInfo, PropertyMap};
use crate::core::models::integrator::Integrator;
use crate::core::models::state::{State, StateData};
use crate::core::models::system::System;
use std::path::Path;
use std::sync::Arc;

/// The narrow interface the benchmark driver needs from an MD engine.
pub trait Engine {
    type Context: EngineContext;

    /// Registers every platform plugin found in `dir` and returns how many
    /// platforms were newly registered. Loading the same directory twice
    /// registers nothing the second time.
    fn load_plugins_from_directory(&mut self, dir: &Path) -> Result<usize, EngineError>;

    fn num_platforms(&self) -> usize;

    fn platforms(&self) -> Vec<PlatformInfo>;

    fn platform(&self, name: &str) -> Option<PlatformInfo>;

    /// Binds `system` and `integrator` to a backend. The integrator is
    /// consumed: each context owns its own instance.
    fn create_context(
        &self,
        system: Arc<System>,
        integrator: Integrator,
        platform: &str,
        properties: &PropertyMap,
    ) -> Result<Self::Context, EngineError>;
}

/// A live binding of a system to a compute backend. Device resources are
/// released when the context is dropped.
pub trait EngineContext {
    fn platform_name(&self) -> &str;

    fn set_state(&mut self, state: &State) -> Result<(), EngineError>;

    /// Integrator step size in picoseconds.
    fn step_size(&self) -> f64;

    fn step(&mut self, steps: u32) -> Result<(), EngineError>;

    /// Total steps advanced by this context's integrator.
    fn steps_taken(&self) -> u64;

    /// Extracts a snapshot. Blocks until all queued work has completed.
    fn state(&mut self, data: StateData) -> Result<State, EngineError>;
}
