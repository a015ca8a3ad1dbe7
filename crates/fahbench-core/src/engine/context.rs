use super::error::EngineError;
use super::kernels::ForceKernel;
use super::traits::EngineContext;
use crate::core::models::integrator::Integrator;
use crate::core::models::state::{State, StateData, Vec3};
use crate::core::models::system::System;
use std::sync::Arc;
use tracing::{debug, trace};

/// A context of the built-in engine: integrates the system with velocity
/// Verlet, evaluating forces through the platform's kernel.
pub struct NativeContext {
    platform: String,
    system: Arc<System>,
    integrator: Integrator,
    kernel: Box<dyn ForceKernel>,
    inverse_masses: Vec<f64>,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    forces: Vec<Vec3>,
    potential_energy: f64,
    forces_valid: bool,
    time: f64,
    steps: u64,
}

impl NativeContext {
    pub(crate) fn new(
        platform: String,
        system: Arc<System>,
        integrator: Integrator,
        kernel: Box<dyn ForceKernel>,
    ) -> Result<Self, EngineError> {
        let step_size = integrator.step_size();
        if !(step_size > 0.0) {
            return Err(EngineError::InvalidStepSize(step_size));
        }
        let n = system.num_particles();
        let inverse_masses = system
            .masses
            .iter()
            .map(|&m| if m > 0.0 { 1.0 / m } else { 0.0 })
            .collect();
        debug!(platform = %platform, particles = n, "Context created.");
        Ok(Self {
            platform,
            system,
            integrator,
            kernel,
            inverse_masses,
            positions: vec![Vec3::zeros(); n],
            velocities: vec![Vec3::zeros(); n],
            forces: vec![Vec3::zeros(); n],
            potential_energy: 0.0,
            forces_valid: false,
            time: 0.0,
            steps: 0,
        })
    }

    fn ensure_forces(&mut self) {
        if !self.forces_valid {
            self.potential_energy = self.kernel.compute(&self.positions, &mut self.forces);
            self.forces_valid = true;
        }
    }

    fn kinetic_energy(&self) -> f64 {
        self.velocities
            .iter()
            .zip(&self.system.masses)
            .map(|(v, m)| 0.5 * m * v.norm_squared())
            .sum()
    }

    fn half_kick(&mut self, dt: f64) {
        for ((v, f), inv_m) in self
            .velocities
            .iter_mut()
            .zip(&self.forces)
            .zip(&self.inverse_masses)
        {
            *v += f * (0.5 * dt * inv_m);
        }
    }
}

impl EngineContext for NativeContext {
    fn platform_name(&self) -> &str {
        &self.platform
    }

    fn set_state(&mut self, state: &State) -> Result<(), EngineError> {
        let expected = self.system.num_particles();
        let positions = state
            .positions
            .as_ref()
            .ok_or(EngineError::MissingStateData("positions"))?;
        if positions.len() != expected {
            return Err(EngineError::ParticleCountMismatch {
                expected,
                found: positions.len(),
            });
        }
        let velocities = match &state.velocities {
            Some(v) if v.len() != expected => {
                return Err(EngineError::ParticleCountMismatch {
                    expected,
                    found: v.len(),
                });
            }
            Some(v) => v.clone(),
            None => vec![Vec3::zeros(); expected],
        };
        self.positions.clone_from(positions);
        self.velocities = velocities;
        self.time = state.time;
        self.forces_valid = false;
        Ok(())
    }

    fn step_size(&self) -> f64 {
        self.integrator.step_size()
    }

    fn step(&mut self, steps: u32) -> Result<(), EngineError> {
        let dt = self.integrator.step_size();
        self.ensure_forces();
        for _ in 0..steps {
            self.half_kick(dt);
            for (x, v) in self.positions.iter_mut().zip(&self.velocities) {
                *x += v * dt;
            }
            self.forces_valid = false;
            self.ensure_forces();
            self.half_kick(dt);
        }
        self.time += f64::from(steps) * dt;
        self.steps += u64::from(steps);
        trace!(steps, total = self.steps, "Integrated step chunk.");
        Ok(())
    }

    fn steps_taken(&self) -> u64 {
        self.steps
    }

    fn state(&mut self, data: StateData) -> Result<State, EngineError> {
        let needs_forces = data.contains(StateData::FORCES) || data.contains(StateData::ENERGY);
        if needs_forces {
            self.ensure_forces();
        }
        let energy = data.contains(StateData::ENERGY);
        Ok(State {
            time: self.time,
            positions: data
                .contains(StateData::POSITIONS)
                .then(|| self.positions.clone()),
            velocities: data
                .contains(StateData::VELOCITIES)
                .then(|| self.velocities.clone()),
            forces: data.contains(StateData::FORCES).then(|| self.forces.clone()),
            potential_energy: energy.then_some(self.potential_energy),
            kinetic_energy: energy.then(|| self.kinetic_energy()),
        })
    }
}

impl Drop for NativeContext {
    fn drop(&mut self) {
        debug!(
            platform = %self.platform,
            steps = self.steps,
            "Context destroyed."
        );
    }
}
