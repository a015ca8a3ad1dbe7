use crate::core::models::workunit::WorkUnit;
use crate::core::validation::Tolerances;
use crate::engine::platform::Precision;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_WORK_UNIT: &str = "dhfr";
pub const DEFAULT_PLATFORM: &str = "OpenCL";
pub const DEFAULT_RUN_LENGTH: Duration = Duration::from_secs(60);

pub const PLUGIN_DIR_ENV: &str = "FAHBENCH_PLUGIN_DIR";
pub const WORKUNIT_DIR_ENV: &str = "FAHBENCH_WORKUNIT_DIR";

#[cfg(windows)]
const PLUGIN_DIR_FROM_EXE: &str = "plugins";
#[cfg(not(windows))]
const PLUGIN_DIR_FROM_EXE: &str = "../lib/fahbench/plugins";

#[cfg(windows)]
const WORKUNIT_DIR_FROM_EXE: &str = "workunits";
#[cfg(not(windows))]
const WORKUNIT_DIR_FROM_EXE: &str = "../share/fahbench/workunits";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for {parameter}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    #[error("Cannot locate the running executable: {0}")]
    Executable(#[source] io::Error),
}

/// Locations of the plugin directory and the work-unit root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchPaths {
    pub plugin_dir: PathBuf,
    pub workunit_dir: PathBuf,
}

impl BenchPaths {
    /// Resolves both directories from the environment, falling back to
    /// locations relative to the running executable.
    pub fn resolve() -> Result<Self, ConfigError> {
        let exe_dir = executable_dir();
        let pick = |var: &str, relative: &str| -> Result<PathBuf, ConfigError> {
            match env::var_os(var) {
                Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
                _ => exe_dir
                    .as_ref()
                    .map(|dir| normalize(&dir.join(relative)))
                    .map_err(|e| ConfigError::Executable(io::Error::new(e.kind(), e.to_string()))),
            }
        };
        Ok(Self {
            plugin_dir: pick(PLUGIN_DIR_ENV, PLUGIN_DIR_FROM_EXE)?,
            workunit_dir: pick(WORKUNIT_DIR_ENV, WORKUNIT_DIR_FROM_EXE)?,
        })
    }
}

fn executable_dir() -> io::Result<PathBuf> {
    let exe = env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"))
}

/// Canonicalizes when the path exists, so summaries show a clean path.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Everything that determines a benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub work_unit: WorkUnit,
    pub platform: String,
    pub precision: Precision,
    pub device_index: u32,
    /// Sub-platform index for backends that group devices.
    pub platform_index: u32,
    pub verify_accuracy: bool,
    /// Steps between mid-run NaN scans; 0 disables them.
    pub nan_check_interval: u32,
    pub run_length: Duration,
    pub plugin_dir: PathBuf,
    pub tolerances: Tolerances,
}

impl SimulationConfig {
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::new()
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    work_unit: Option<WorkUnit>,
    platform: Option<String>,
    precision: Option<Precision>,
    device_index: Option<u32>,
    platform_index: Option<u32>,
    verify_accuracy: Option<bool>,
    nan_check_interval: Option<u32>,
    run_length: Option<Duration>,
    plugin_dir: Option<PathBuf>,
    tolerances: Option<Tolerances>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn work_unit(mut self, work_unit: WorkUnit) -> Self {
        self.work_unit = Some(work_unit);
        self
    }
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }
    pub fn device_index(mut self, index: u32) -> Self {
        self.device_index = Some(index);
        self
    }
    pub fn platform_index(mut self, index: u32) -> Self {
        self.platform_index = Some(index);
        self
    }
    pub fn verify_accuracy(mut self, enabled: bool) -> Self {
        self.verify_accuracy = Some(enabled);
        self
    }
    pub fn nan_check_interval(mut self, steps: u32) -> Self {
        self.nan_check_interval = Some(steps);
        self
    }
    pub fn run_length(mut self, run_length: Duration) -> Self {
        self.run_length = Some(run_length);
        self
    }
    pub fn plugin_dir(mut self, dir: PathBuf) -> Self {
        self.plugin_dir = Some(dir);
        self
    }
    pub fn tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = Some(tolerances);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let run_length = self.run_length.unwrap_or(DEFAULT_RUN_LENGTH);
        if run_length.is_zero() {
            return Err(ConfigError::InvalidParameter {
                parameter: "run_length",
                reason: "must be positive".to_string(),
            });
        }
        let plugin_dir = match self.plugin_dir {
            Some(dir) => dir,
            None => BenchPaths::resolve()?.plugin_dir,
        };
        Ok(SimulationConfig {
            work_unit: self
                .work_unit
                .ok_or(ConfigError::MissingParameter("work_unit"))?,
            platform: self
                .platform
                .unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
            precision: self.precision.unwrap_or_default(),
            device_index: self.device_index.unwrap_or(0),
            platform_index: self.platform_index.unwrap_or(0),
            verify_accuracy: self.verify_accuracy.unwrap_or(true),
            nan_check_interval: self.nan_check_interval.unwrap_or(0),
            run_length,
            plugin_dir,
            tolerances: self.tolerances.unwrap_or_default(),
        })
    }
}
