use serde::{Deserialize, Serialize};

/// Integration scheme and its parameters.
///
/// An `Integrator` is handed to a context by value: once a context has been
/// built from it, the same instance can never back a second context.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case", tag = "type")]
pub enum Integrator {
    /// Velocity Verlet with a fixed step size.
    Verlet {
        /// Step size in picoseconds.
        step_size: f64,
    },
}

impl Integrator {
    pub fn verlet(step_size: f64) -> Self {
        Self::Verlet { step_size }
    }

    /// Step size in picoseconds.
    pub fn step_size(&self) -> f64 {
        match self {
            Self::Verlet { step_size } => *step_size,
        }
    }
}
