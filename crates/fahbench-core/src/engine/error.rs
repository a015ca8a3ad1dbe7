use crate::core::io::serialization::SerializationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("There is no registered platform called '{0}'")]
    UnknownPlatform(String),

    #[error("Failed to scan plugin directory '{path}': {source}", path = path.display())]
    PluginDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plugin manifest: {0}")]
    PluginManifest(#[from] SerializationError),

    #[error("Platform '{platform}' does not support the property '{property}'")]
    UnknownProperty { platform: String, property: String },

    #[error("Illegal value '{value}' for property '{property}': {reason}")]
    InvalidProperty {
        property: String,
        value: String,
        reason: String,
    },

    #[error("Invalid system: {0}")]
    InvalidSystem(String),

    #[error("State has {found} particles but the system has {expected}")]
    ParticleCountMismatch { expected: usize, found: usize },

    #[error("State is missing {0}")]
    MissingStateData(&'static str),

    #[error("Integrator has a non-positive step size of {0} ps")]
    InvalidStepSize(f64),
}
