use super::config::ConfigError;
use crate::core::io::serialization::SerializationError;
use crate::core::models::workunit::WorkUnitError;
use crate::core::validation::ValidationError;
use crate::engine::error::EngineError;
use thiserror::Error;

/// Fatal errors of the benchmark driver.
///
/// Recoverable outcomes such as an unknown platform or a cancelled run are
/// reported through [`SimulationResult`](super::result::SimulationResult)
/// instead.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Work unit error: {0}")]
    WorkUnit(#[from] WorkUnitError),

    #[error("Failed to load work unit data: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Correctness check failed: {0}")]
    Validation(#[from] ValidationError),
}
