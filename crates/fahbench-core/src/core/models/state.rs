use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

pub type Vec3 = Vector3<f64>;

/// Selects which quantities a state extraction should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateData(u8);

impl StateData {
    pub const POSITIONS: Self = Self(1);
    pub const VELOCITIES: Self = Self(1 << 1);
    pub const FORCES: Self = Self(1 << 2);
    pub const ENERGY: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for StateData {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// An immutable snapshot of the physical state of a context.
///
/// Quantities that were not requested when the snapshot was taken are `None`.
/// Units: nm, nm/ps, kJ/mol/nm and kJ/mol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct State {
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub positions: Option<Vec<Vec3>>,
    #[serde(default)]
    pub velocities: Option<Vec<Vec3>>,
    #[serde(default)]
    pub forces: Option<Vec<Vec3>>,
    #[serde(default)]
    pub potential_energy: Option<f64>,
    #[serde(default)]
    pub kinetic_energy: Option<f64>,
}

impl State {
    /// A state holding only positions and velocities, as stored in a work unit.
    pub fn initial(positions: Vec<Vec3>, velocities: Vec<Vec3>) -> Self {
        Self {
            positions: Some(positions),
            velocities: Some(velocities),
            ..Self::default()
        }
    }

    pub fn num_particles(&self) -> Option<usize> {
        self.positions.as_ref().map(Vec::len)
    }

    pub fn total_energy(&self) -> Option<f64> {
        Some(self.potential_energy? + self.kinetic_energy?)
    }
}
