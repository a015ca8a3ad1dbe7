use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use crate::error::{CliError, Result};
use fahbench::core::models::workunit::WorkUnit;
use fahbench::core::validation::Tolerances;
use fahbench::engine::Precision;
use fahbench::workflows::{BenchPaths, SimulationConfig};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    match path {
        Some(path) => FileConfig::from_file(path),
        None => Ok(FileConfig::default()),
    }
}

/// Plugin and work-unit directories, with file entries taking precedence
/// over the environment and executable-relative defaults.
pub fn resolve_paths(file_config: &FileConfig) -> Result<BenchPaths> {
    let mut paths = BenchPaths::resolve().map_err(|e| CliError::Config(e.to_string()))?;
    if let Some(dir) = &file_config.plugin_dir {
        paths.plugin_dir = dir.clone();
    }
    if let Some(dir) = &file_config.work_unit_dir {
        paths.workunit_dir = dir.clone();
    }
    Ok(paths)
}

pub fn build_config(file_config: FileConfig) -> Result<SimulationConfig> {
    let defaults = DefaultsConfig::default();
    let paths = resolve_paths(&file_config)?;

    let codename = file_config.work_unit.unwrap_or(defaults.work_unit);
    let work_unit = WorkUnit::named(&paths.workunit_dir, &codename)
        .map_err(|e| CliError::Config(format!("cannot load work unit '{}': {}", codename, e)))?;
    info!(
        work_unit = %work_unit.codename(),
        dir = ?paths.workunit_dir,
        "Resolved work unit."
    );

    let precision = match file_config.precision {
        Some(text) => text
            .parse::<Precision>()
            .map_err(|e| CliError::Config(format!("precision: {}", e)))?,
        None => defaults.precision,
    };

    let seconds = file_config.run_length.unwrap_or(defaults.run_length_secs);
    let run_length = Duration::try_from_secs_f64(seconds)
        .map_err(|e| CliError::Config(format!("run-length {}: {}", seconds, e)))?;

    let tolerances = file_config
        .tolerances
        .map(|t| t.apply(Tolerances::default()))
        .unwrap_or_default();

    SimulationConfig::builder()
        .work_unit(work_unit)
        .platform(file_config.platform.unwrap_or(defaults.platform))
        .precision(precision)
        .device_index(file_config.device.unwrap_or(defaults.device))
        .platform_index(file_config.platform_index.unwrap_or(defaults.platform_index))
        .verify_accuracy(file_config.verify_accuracy.unwrap_or(defaults.verify_accuracy))
        .nan_check_interval(file_config.nan_check.unwrap_or(defaults.nan_check))
        .run_length(run_length)
        .plugin_dir(paths.plugin_dir)
        .tolerances(tolerances)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::FileTolerances;
    use fahbench::core::io::serialization::save_object;
    use fahbench::core::models::workunit::{MANIFEST_FILE_NAME, WorkUnitManifest};
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn work_unit_root(codename: &str) -> TempDir {
        let dir = tempdir().unwrap();
        let wu_dir = dir.path().join(codename);
        fs::create_dir_all(&wu_dir).unwrap();
        let manifest = WorkUnitManifest {
            codename: None,
            name: "Dihydrofolate reductase".to_string(),
            description: "Explicit solvent".to_string(),
            step_chunk: 50,
            atoms: 23558,
            system: None,
            integrator: None,
            state: None,
        };
        save_object(&wu_dir.join(MANIFEST_FILE_NAME), &manifest).unwrap();
        dir
    }

    fn file_config(root: &TempDir) -> FileConfig {
        FileConfig {
            work_unit_dir: Some(root.path().to_path_buf()),
            plugin_dir: Some(root.path().join("plugins")),
            ..FileConfig::default()
        }
    }

    #[test]
    fn empty_file_falls_back_to_defaults() {
        let root = work_unit_root("dhfr");
        let config = build_config(file_config(&root)).unwrap();

        assert_eq!(config.work_unit.codename(), "dhfr");
        assert_eq!(config.platform, "OpenCL");
        assert_eq!(config.precision, Precision::Single);
        assert_eq!(config.device_index, 0);
        assert!(config.verify_accuracy);
        assert_eq!(config.nan_check_interval, 0);
        assert_eq!(config.run_length, Duration::from_secs(60));
        assert_eq!(config.plugin_dir, root.path().join("plugins"));
    }

    #[test]
    fn file_values_override_defaults() {
        let root = work_unit_root("nav");
        let config = build_config(FileConfig {
            work_unit: Some("nav".to_string()),
            platform: Some("CPU".to_string()),
            precision: Some("double".to_string()),
            device: Some(2),
            verify_accuracy: Some(false),
            nan_check: Some(1000),
            run_length: Some(0.5),
            tolerances: Some(FileTolerances {
                energy_relative: Some(0.01),
                ..FileTolerances::default()
            }),
            ..file_config(&root)
        })
        .unwrap();

        assert_eq!(config.work_unit.fullname(), "Dihydrofolate reductase");
        assert_eq!(config.platform, "CPU");
        assert_eq!(config.precision, Precision::Double);
        assert_eq!(config.device_index, 2);
        assert!(!config.verify_accuracy);
        assert_eq!(config.nan_check_interval, 1000);
        assert_eq!(config.run_length, Duration::from_millis(500));
        assert_eq!(config.tolerances.energy_relative, 0.01);
    }

    #[test]
    fn invalid_precision_is_a_config_error() {
        let root = work_unit_root("dhfr");
        let result = build_config(FileConfig {
            precision: Some("half".to_string()),
            ..file_config(&root)
        });
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("precision")));
    }

    #[test]
    fn negative_run_length_is_a_config_error() {
        let root = work_unit_root("dhfr");
        let result = build_config(FileConfig {
            run_length: Some(-1.0),
            ..file_config(&root)
        });
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_work_unit_is_a_config_error() {
        let root = work_unit_root("dhfr");
        let result = build_config(FileConfig {
            work_unit: Some("p5_hip".to_string()),
            ..file_config(&root)
        });
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("p5_hip")));
    }
}
