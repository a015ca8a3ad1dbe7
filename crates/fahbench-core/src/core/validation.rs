//! Correctness checks applied to state snapshots.
//!
//! A failure in any of these checks means the throughput number would be
//! meaningless, so callers treat every [`ValidationError`] as fatal.

use crate::core::models::state::{State, Vec3};
use thiserror::Error;

/// Largest coordinate magnitude (nm) accepted by [`check_for_discrepancies`].
pub const POSITION_LIMIT: f64 = 1.0e4;
/// Largest velocity component magnitude (nm/ps) accepted by [`check_for_discrepancies`].
pub const VELOCITY_LIMIT: f64 = 1.0e3;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("state is missing {0}")]
    MissingData(&'static str),

    #[error("non-finite value in {quantity} of particle {particle}")]
    NonFinite {
        quantity: &'static str,
        particle: usize,
    },

    #[error("non-finite {0}")]
    NonFiniteEnergy(&'static str),

    #[error("discrepancy: {quantity} of particle {particle} has magnitude {magnitude:.3e}, limit {limit:.1e}")]
    OutOfBounds {
        quantity: &'static str,
        particle: usize,
        magnitude: f64,
        limit: f64,
    },

    #[error("discrepancy: negative kinetic energy {0}")]
    NegativeKineticEnergy(f64),

    #[error("particle count mismatch: reference has {reference}, tested has {tested}")]
    ParticleCountMismatch { reference: usize, tested: usize },

    #[error(
        "force mismatch on particle {particle}: reference {reference:.4}, tested {tested:.4} (|diff| {difference:.4})"
    )]
    ForceMismatch {
        particle: usize,
        reference: f64,
        tested: f64,
        difference: f64,
    },

    #[error("energy mismatch: reference {reference:.6}, tested {tested:.6}")]
    EnergyMismatch { reference: f64, tested: f64 },
}

/// Acceptance thresholds for [`compare_forces_and_energies`].
///
/// A particle fails only when its force difference exceeds both the absolute
/// and the relative threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// kJ/mol/nm.
    pub force_absolute: f64,
    pub force_relative: f64,
    pub energy_relative: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            force_absolute: 5.0,
            force_relative: 0.02,
            energy_relative: 1.0e-3,
        }
    }
}

fn require<'a>(data: &'a Option<Vec<Vec3>>, name: &'static str) -> Result<&'a [Vec3], ValidationError> {
    data.as_deref().ok_or(ValidationError::MissingData(name))
}

fn scan_finite(values: &[Vec3], quantity: &'static str) -> Result<(), ValidationError> {
    match values.iter().position(|v| !v.iter().all(|x| x.is_finite())) {
        Some(particle) => Err(ValidationError::NonFinite { quantity, particle }),
        None => Ok(()),
    }
}

/// Scans positions, velocities and forces for NaN or infinite components.
pub fn check_for_nans(state: &State) -> Result<(), ValidationError> {
    scan_finite(require(&state.positions, "positions")?, "positions")?;
    scan_finite(require(&state.velocities, "velocities")?, "velocities")?;
    scan_finite(require(&state.forces, "forces")?, "forces")?;
    Ok(())
}

fn scan_bounds(values: &[Vec3], quantity: &'static str, limit: f64) -> Result<(), ValidationError> {
    for (particle, v) in values.iter().enumerate() {
        let magnitude = v.amax();
        if magnitude > limit {
            return Err(ValidationError::OutOfBounds {
                quantity,
                particle,
                magnitude,
                limit,
            });
        }
    }
    Ok(())
}

/// Sanity checks on a final state: energies must be finite, kinetic energy
/// non-negative, and no particle may have drifted or accelerated beyond
/// physically plausible bounds.
pub fn check_for_discrepancies(state: &State) -> Result<(), ValidationError> {
    let potential = state
        .potential_energy
        .ok_or(ValidationError::MissingData("potential energy"))?;
    let kinetic = state
        .kinetic_energy
        .ok_or(ValidationError::MissingData("kinetic energy"))?;
    if !potential.is_finite() {
        return Err(ValidationError::NonFiniteEnergy("potential energy"));
    }
    if !kinetic.is_finite() {
        return Err(ValidationError::NonFiniteEnergy("kinetic energy"));
    }
    if kinetic < 0.0 {
        return Err(ValidationError::NegativeKineticEnergy(kinetic));
    }
    scan_bounds(require(&state.positions, "positions")?, "position", POSITION_LIMIT)?;
    scan_bounds(require(&state.velocities, "velocities")?, "velocity", VELOCITY_LIMIT)?;
    Ok(())
}

/// Compares forces and potential energy of `tested` against `reference`.
pub fn compare_forces_and_energies(
    reference: &State,
    tested: &State,
    tolerances: &Tolerances,
) -> Result<(), ValidationError> {
    let ref_forces = require(&reference.forces, "forces")?;
    let forces = require(&tested.forces, "forces")?;
    if ref_forces.len() != forces.len() {
        return Err(ValidationError::ParticleCountMismatch {
            reference: ref_forces.len(),
            tested: forces.len(),
        });
    }
    scan_finite(ref_forces, "reference forces")?;
    scan_finite(forces, "forces")?;

    for (particle, (f_ref, f)) in ref_forces.iter().zip(forces).enumerate() {
        let difference = (f_ref - f).norm();
        let reference_norm = f_ref.norm();
        let relative = if reference_norm > 0.0 {
            difference / reference_norm
        } else {
            f64::INFINITY
        };
        if difference > tolerances.force_absolute && relative > tolerances.force_relative {
            return Err(ValidationError::ForceMismatch {
                particle,
                reference: reference_norm,
                tested: f.norm(),
                difference,
            });
        }
    }

    let ref_energy = reference
        .potential_energy
        .ok_or(ValidationError::MissingData("potential energy"))?;
    let energy = tested
        .potential_energy
        .ok_or(ValidationError::MissingData("potential energy"))?;
    if !ref_energy.is_finite() || !energy.is_finite() {
        return Err(ValidationError::NonFiniteEnergy("potential energy"));
    }
    let scale = ref_energy.abs().max(1.0);
    if (ref_energy - energy).abs() / scale > tolerances.energy_relative {
        return Err(ValidationError::EnergyMismatch {
            reference: ref_energy,
            tested: energy,
        });
    }
    Ok(())
}
