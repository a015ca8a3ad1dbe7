use crate::error::{CliError, Result};
use fahbench::core::validation::Tolerances;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileTolerances {
    pub force_absolute: Option<f64>,
    pub force_relative: Option<f64>,
    pub energy_relative: Option<f64>,
}

impl FileTolerances {
    pub fn apply(&self, base: Tolerances) -> Tolerances {
        Tolerances {
            force_absolute: self.force_absolute.unwrap_or(base.force_absolute),
            force_relative: self.force_relative.unwrap_or(base.force_relative),
            energy_relative: self.energy_relative.unwrap_or(base.energy_relative),
        }
    }
}

/// The benchmark configuration file. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub work_unit: Option<String>,
    pub work_unit_dir: Option<PathBuf>,
    pub plugin_dir: Option<PathBuf>,
    pub platform: Option<String>,
    pub precision: Option<String>,
    pub device: Option<u32>,
    pub platform_index: Option<u32>,
    pub verify_accuracy: Option<bool>,
    /// Steps between mid-run NaN scans.
    pub nan_check: Option<u32>,
    /// Seconds.
    pub run_length: Option<f64>,
    pub tolerances: Option<FileTolerances>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
