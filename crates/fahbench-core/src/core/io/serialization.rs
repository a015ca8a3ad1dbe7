use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("cannot open {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed content in {path}: {source}", path = path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize object for {path}: {source}", path = path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
}

impl SerializationError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } | Self::Encode { path, .. } => path,
        }
    }
}

/// Reads and deserializes an engine object from a TOML file.
pub fn load_object<T: DeserializeOwned>(path: &Path) -> Result<T, SerializationError> {
    let content = fs::read_to_string(path).map_err(|source| SerializationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SerializationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serializes an engine object and writes it to `path`, replacing any
/// existing file.
pub fn save_object<T: Serialize>(path: &Path, object: &T) -> Result<(), SerializationError> {
    let content = toml::to_string(object).map_err(|source| SerializationError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(|source| SerializationError::Io {
        path: path.to_path_buf(),
        source,
    })
}
