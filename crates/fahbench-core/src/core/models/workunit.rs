use crate::core::io::serialization::{self, SerializationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MANIFEST_FILE_NAME: &str = "workunit.toml";

const DEFAULT_SYSTEM_FILE: &str = "system.toml";
const DEFAULT_INTEGRATOR_FILE: &str = "integrator.toml";
const DEFAULT_STATE_FILE: &str = "state.toml";

#[derive(Debug, Error)]
pub enum WorkUnitError {
    #[error("Failed to read work unit manifest: {0}")]
    Manifest(#[from] SerializationError),

    #[error("Work unit '{codename}' declares an invalid step chunk of {step_chunk}")]
    InvalidStepChunk { codename: String, step_chunk: u32 },
}

/// The on-disk description of a work unit, `workunit.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WorkUnitManifest {
    #[serde(default)]
    pub codename: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub step_chunk: u32,
    pub atoms: usize,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub integrator: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// A named benchmark payload: three serialized artifacts plus the number of
/// integration steps advanced per call.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkUnit {
    codename: String,
    fullname: String,
    description: String,
    step_chunk: u32,
    atoms: usize,
    system_path: PathBuf,
    integrator_path: PathBuf,
    state_path: PathBuf,
}

impl WorkUnit {
    /// Resolves `codename` to `<root>/<codename>/` and reads its manifest.
    pub fn named(root: &Path, codename: &str) -> Result<Self, WorkUnitError> {
        Self::from_directory(&root.join(codename))
    }

    pub fn from_directory(dir: &Path) -> Result<Self, WorkUnitError> {
        let manifest: WorkUnitManifest =
            serialization::load_object(&dir.join(MANIFEST_FILE_NAME))?;
        Self::from_manifest(dir, manifest)
    }

    pub fn from_manifest(dir: &Path, manifest: WorkUnitManifest) -> Result<Self, WorkUnitError> {
        let codename = manifest.codename.unwrap_or_else(|| {
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        if manifest.step_chunk == 0 {
            return Err(WorkUnitError::InvalidStepChunk {
                codename,
                step_chunk: manifest.step_chunk,
            });
        }
        let resolve = |file: Option<String>, default: &str| {
            dir.join(file.as_deref().unwrap_or(default))
        };
        Ok(Self {
            codename,
            fullname: manifest.name,
            description: manifest.description,
            step_chunk: manifest.step_chunk,
            atoms: manifest.atoms,
            system_path: resolve(manifest.system, DEFAULT_SYSTEM_FILE),
            integrator_path: resolve(manifest.integrator, DEFAULT_INTEGRATOR_FILE),
            state_path: resolve(manifest.state, DEFAULT_STATE_FILE),
        })
    }

    pub fn codename(&self) -> &str {
        &self.codename
    }

    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn step_chunk(&self) -> u32 {
        self.step_chunk
    }

    /// Atom count declared by the manifest.
    pub fn atoms(&self) -> usize {
        self.atoms
    }

    pub fn system_path(&self) -> &Path {
        &self.system_path
    }

    pub fn integrator_path(&self) -> &Path {
        &self.integrator_path
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn set_state_path(&mut self, path: PathBuf) {
        self.state_path = path;
    }
}
