use super::error::EngineError;
use super::platform::DeviceInfo;
use crate::core::io::serialization;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Kernel family a plugin platform is executed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginBackend {
    Reference,
    Cpu,
}

/// A compute-backend plugin, described by a `*.toml` manifest in the plugin
/// directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PluginManifest {
    pub name: String,
    pub backend: PluginBackend,
    pub property_prefix: String,
    #[serde(default)]
    pub sub_platforms: bool,
    #[serde(default)]
    pub devices: Vec<DeviceInfo>,
}

/// Reads every plugin manifest in `dir`, sorted by file name.
///
/// A missing directory yields no plugins; a malformed manifest is an error.
pub fn scan_directory(dir: &Path) -> Result<Vec<PluginManifest>, EngineError> {
    if !dir.is_dir() {
        warn!("Plugin directory {:?} does not exist; only built-in platforms are available.", dir);
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|source| EngineError::PluginDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut manifests = Vec::with_capacity(paths.len());
    for path in paths {
        debug!("Reading plugin manifest {:?}", path);
        manifests.push(serialization::load_object::<PluginManifest>(&path)?);
    }
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const OPENCL_MANIFEST: &str = r#"
        name = "OpenCL"
        backend = "cpu"
        property-prefix = "OpenCL"
        sub-platforms = true

        [[devices]]
        platform-index = 0
        device-index = 0
        name = "GeForce GTX 1080"
        vendor = "NVIDIA Corporation"

        [[devices]]
        platform-index = 1
        device-index = 0
        name = "HD Graphics 630"
        vendor = "Intel(R) Corporation"
    "#;

    #[test]
    fn manifests_are_read_in_file_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b-opencl.toml"), OPENCL_MANIFEST).unwrap();
        fs::write(
            dir.path().join("a-cuda.toml"),
            "name = \"CUDA\"\nbackend = \"cpu\"\nproperty-prefix = \"Cuda\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "not a plugin").unwrap();

        let manifests = scan_directory(dir.path()).unwrap();
        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[0].name, "CUDA");
        assert!(!manifests[0].sub_platforms);
        assert_eq!(manifests[1].name, "OpenCL");
        assert_eq!(manifests[1].backend, PluginBackend::Cpu);
        assert_eq!(manifests[1].devices.len(), 2);
        assert_eq!(manifests[1].devices[1].vendor, "Intel(R) Corporation");
    }

    #[test]
    fn missing_directory_yields_no_plugins() {
        let dir = tempdir().unwrap();
        let manifests = scan_directory(&dir.path().join("absent")).unwrap();
        assert!(manifests.is_empty());
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.toml"), "name = \"X\"\nbackend = \"gpu\"\n").unwrap();
        assert!(matches!(
            scan_directory(dir.path()),
            Err(EngineError::PluginManifest(_))
        ));
    }
}
