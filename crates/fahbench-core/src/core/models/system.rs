use serde::{Deserialize, Serialize};

/// A harmonic bond between two particles, `E = k/2 (r - r0)^2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HarmonicBond {
    pub particle_a: usize,
    pub particle_b: usize,
    /// Equilibrium length in nm.
    pub length: f64,
    /// Force constant in kJ/mol/nm^2.
    pub k: f64,
}

/// Per-particle Lennard-Jones parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LennardJonesParams {
    /// Collision diameter in nm.
    pub sigma: f64,
    /// Well depth in kJ/mol.
    pub epsilon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case", tag = "type")]
pub enum Force {
    HarmonicBond {
        bonds: Vec<HarmonicBond>,
    },
    /// Lennard-Jones interactions between all non-bonded pairs, combined with
    /// Lorentz-Berthelot rules. Pairs listed in `exclusions` are skipped.
    Nonbonded {
        particles: Vec<LennardJonesParams>,
        #[serde(default)]
        cutoff: Option<f64>,
        #[serde(default)]
        exclusions: Vec<(usize, usize)>,
    },
}

/// The topology and force field of a simulated system.
///
/// A `System` is immutable once deserialized. Contexts share it through an
/// `Arc`, so it outlives every context built from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct System {
    /// Particle masses in amu. A mass of zero marks a fixed particle.
    pub masses: Vec<f64>,
    #[serde(default)]
    pub forces: Vec<Force>,
}

impl System {
    pub fn new(masses: Vec<f64>) -> Self {
        Self {
            masses,
            forces: Vec::new(),
        }
    }

    pub fn with_force(mut self, force: Force) -> Self {
        self.forces.push(force);
        self
    }

    pub fn num_particles(&self) -> usize {
        self.masses.len()
    }

    /// Checks that every force refers only to particles that exist.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.num_particles();
        for force in &self.forces {
            match force {
                Force::HarmonicBond { bonds } => {
                    if let Some(bond) = bonds
                        .iter()
                        .find(|b| b.particle_a >= n || b.particle_b >= n)
                    {
                        return Err(format!(
                            "bond ({}, {}) refers to a particle outside 0..{}",
                            bond.particle_a, bond.particle_b, n
                        ));
                    }
                }
                Force::Nonbonded {
                    particles,
                    exclusions,
                    ..
                } => {
                    if particles.len() != n {
                        return Err(format!(
                            "nonbonded force has {} particles, system has {}",
                            particles.len(),
                            n
                        ));
                    }
                    if let Some((a, b)) = exclusions.iter().find(|(a, b)| *a >= n || *b >= n) {
                        return Err(format!(
                            "exclusion ({}, {}) refers to a particle outside 0..{}",
                            a, b, n
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
