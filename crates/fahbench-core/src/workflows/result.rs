use std::fmt;

/// Atom count of the DHFR work unit that scaled scores are normalized to.
pub const DHFR_ATOMS: usize = 23558;

/// Discrete outcome of a `prepare` or `run` call, as seen by embedding callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultStatus {
    Queued = 0,
    Cancelled = 1,
    Failed = 2,
    Finished = 3,
}

impl ResultStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// The outcome of one `prepare` or `run` call. Never mutated once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulationResult {
    /// Prepared and waiting to run.
    Queued,
    Cancelled,
    Failed,
    Finished {
        /// Simulated nanoseconds per wall-clock day.
        score: f64,
        atoms: usize,
    },
}

impl SimulationResult {
    pub fn status(&self) -> ResultStatus {
        match self {
            Self::Queued => ResultStatus::Queued,
            Self::Cancelled => ResultStatus::Cancelled,
            Self::Failed => ResultStatus::Failed,
            Self::Finished { .. } => ResultStatus::Finished,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Finished { score, .. } => Some(*score),
            _ => None,
        }
    }

    pub fn atoms(&self) -> Option<usize> {
        match self {
            Self::Finished { atoms, .. } => Some(*atoms),
            _ => None,
        }
    }

    /// Score normalized to the size of DHFR, so that work units of
    /// different sizes are comparable. Zero unless finished.
    pub fn scaled_score(&self) -> f64 {
        match self {
            Self::Finished { score, atoms } => score * (*atoms as f64) / (DHFR_ATOMS as f64),
            _ => 0.0,
        }
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => f.write_str("Queued"),
            Self::Cancelled => f.write_str("Cancelled"),
            Self::Failed => f.write_str("Failed"),
            Self::Finished { score, atoms } => {
                write!(f, "Score: {:.4} ns/day ({} atoms, scaled {:.4})", score, atoms, self.scaled_score())
            }
        }
    }
}
