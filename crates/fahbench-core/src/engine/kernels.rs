use super::error::EngineError;
use super::platform::Precision;
use crate::core::models::state::Vec3;
use crate::core::models::system::{Force, HarmonicBond, LennardJonesParams, System};
use nalgebra::Vector3;
use std::collections::HashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Evaluates forces and potential energy for a fixed system.
pub(crate) trait ForceKernel: Send + Sync {
    /// Writes the force on every particle into `forces` and returns the
    /// potential energy.
    fn compute(&self, positions: &[Vec3], forces: &mut [Vec3]) -> f64;
}

/// Force-field terms of a `System`, flattened for evaluation.
#[derive(Debug, Clone, Default)]
pub(crate) struct ForceTerms {
    bonds: Vec<HarmonicBond>,
    lennard_jones: Option<LennardJones>,
}

#[derive(Debug, Clone)]
struct LennardJones {
    params: Vec<LennardJonesParams>,
    cutoff_squared: Option<f64>,
    exclusions: HashSet<(usize, usize)>,
}

#[inline]
fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

impl ForceTerms {
    pub(crate) fn from_system(system: &System) -> Result<Self, EngineError> {
        system.validate().map_err(EngineError::InvalidSystem)?;
        let mut terms = Self::default();
        for force in &system.forces {
            match force {
                Force::HarmonicBond { bonds } => terms.bonds.extend_from_slice(bonds),
                Force::Nonbonded {
                    particles,
                    cutoff,
                    exclusions,
                } => {
                    if terms.lennard_jones.is_some() {
                        return Err(EngineError::InvalidSystem(
                            "more than one nonbonded force".to_string(),
                        ));
                    }
                    terms.lennard_jones = Some(LennardJones {
                        params: particles.clone(),
                        cutoff_squared: cutoff.map(|c| c * c),
                        exclusions: exclusions.iter().map(|&(a, b)| pair_key(a, b)).collect(),
                    });
                }
            }
        }
        Ok(terms)
    }

    /// Adds bond forces into `forces` and returns the bond energy.
    fn accumulate_bonds(&self, positions: &[Vec3], forces: &mut [Vec3]) -> f64 {
        let mut energy = 0.0;
        for bond in &self.bonds {
            let delta = positions[bond.particle_b] - positions[bond.particle_a];
            let r = delta.norm();
            let stretch = r - bond.length;
            energy += 0.5 * bond.k * stretch * stretch;
            if r > 0.0 {
                let f = delta * (bond.k * stretch / r);
                forces[bond.particle_a] += f;
                forces[bond.particle_b] -= f;
            }
        }
        energy
    }
}

impl LennardJones {
    /// Force on `i` due to `j`, and the pair energy, or `None` when the pair
    /// does not interact.
    #[inline]
    fn pair(&self, i: usize, j: usize, positions: &[Vec3]) -> Option<(Vec3, f64)> {
        if i == j || self.exclusions.contains(&pair_key(i, j)) {
            return None;
        }
        let delta = positions[i] - positions[j];
        let r2 = delta.norm_squared();
        if r2 == 0.0 || self.cutoff_squared.is_some_and(|c2| r2 > c2) {
            return None;
        }
        let (pi, pj) = (&self.params[i], &self.params[j]);
        let sigma = 0.5 * (pi.sigma + pj.sigma);
        let epsilon = (pi.epsilon * pj.epsilon).sqrt();
        let sr2 = sigma * sigma / r2;
        let sr6 = sr2 * sr2 * sr2;
        let sr12 = sr6 * sr6;
        let energy = 4.0 * epsilon * (sr12 - sr6);
        let magnitude = 24.0 * epsilon * (2.0 * sr12 - sr6) / r2;
        Some((delta * magnitude, energy))
    }
}

/// Serial double-precision kernel. Every pair is visited once.
pub(crate) struct ReferenceKernel {
    terms: ForceTerms,
}

impl ReferenceKernel {
    pub(crate) fn new(terms: ForceTerms) -> Self {
        Self { terms }
    }
}

impl ForceKernel for ReferenceKernel {
    fn compute(&self, positions: &[Vec3], forces: &mut [Vec3]) -> f64 {
        forces.iter_mut().for_each(|f| *f = Vec3::zeros());
        let mut energy = self.terms.accumulate_bonds(positions, forces);
        if let Some(lj) = &self.terms.lennard_jones {
            let n = positions.len();
            for i in 0..n {
                for j in (i + 1)..n {
                    if let Some((f, e)) = lj.pair(i, j, positions) {
                        forces[i] += f;
                        forces[j] -= f;
                        energy += e;
                    }
                }
            }
        }
        energy
    }
}

/// Data-parallel kernel: each particle gathers its own nonbonded force, so
/// particles can be processed independently. Pair forces are rounded to
/// single precision unless the kernel runs in double precision.
pub(crate) struct CpuKernel {
    terms: ForceTerms,
    precision: Precision,
}

impl CpuKernel {
    pub(crate) fn new(terms: ForceTerms, precision: Precision) -> Self {
        Self { terms, precision }
    }

    fn gather(&self, lj: &LennardJones, i: usize, positions: &[Vec3]) -> (Vec3, f64) {
        match self.precision {
            Precision::Double => {
                let mut force = Vec3::zeros();
                let mut energy = 0.0;
                for j in 0..positions.len() {
                    if let Some((f, e)) = lj.pair(i, j, positions) {
                        force += f;
                        energy += e;
                    }
                }
                (force, 0.5 * energy)
            }
            Precision::Single | Precision::Mixed => {
                let mut force = Vector3::<f32>::zeros();
                let mut energy = 0.0f64;
                for j in 0..positions.len() {
                    if let Some((f, e)) = lj.pair(i, j, positions) {
                        force += f.cast::<f32>();
                        energy += match self.precision {
                            Precision::Single => f64::from(e as f32),
                            _ => e,
                        };
                    }
                }
                (force.cast::<f64>(), 0.5 * energy)
            }
        }
    }
}

impl ForceKernel for CpuKernel {
    fn compute(&self, positions: &[Vec3], forces: &mut [Vec3]) -> f64 {
        let nonbonded_energy = match &self.terms.lennard_jones {
            Some(lj) => {
                #[cfg(feature = "parallel")]
                let iter = forces.par_iter_mut().enumerate();
                #[cfg(not(feature = "parallel"))]
                let iter = forces.iter_mut().enumerate();

                iter.map(|(i, slot)| {
                    let (force, energy) = self.gather(lj, i, positions);
                    *slot = force;
                    energy
                })
                .sum::<f64>()
            }
            None => {
                forces.iter_mut().for_each(|f| *f = Vec3::zeros());
                0.0
            }
        };
        nonbonded_energy + self.terms.accumulate_bonds(positions, forces)
    }
}
