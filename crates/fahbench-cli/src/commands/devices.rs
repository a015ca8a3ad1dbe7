use crate::config;
use crate::error::Result;
use fahbench::engine::{Engine, NativeEngine, PlatformInfo};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let file_config = config::load_file_config(config_path)?;
    let paths = config::resolve_paths(&file_config)?;

    let mut engine = NativeEngine::new();
    let registered = engine
        .load_plugins_from_directory(&paths.plugin_dir)
        .map_err(fahbench::workflows::SimulationError::from)?;
    info!(registered, dir = ?paths.plugin_dir, "Loaded platform plugins.");

    println!("Plugin directory: {}", paths.plugin_dir.display());
    print!("{}", format_platforms(&engine.platforms()));
    Ok(())
}

fn format_platforms(platforms: &[PlatformInfo]) -> String {
    let mut out = String::new();
    for platform in platforms {
        let kind = match &platform.property_prefix {
            Some(prefix) => format!("plugin, properties {prefix}*"),
            None => "built-in".to_string(),
        };
        let _ = writeln!(out, "{} ({})", platform.name, kind);
        for device in &platform.devices {
            if platform.sub_platforms {
                let _ = write!(out, "  platform {} ", device.platform_index);
            } else {
                let _ = write!(out, "  ");
            }
            let _ = writeln!(
                out,
                "device {}: {} [{}]",
                device.device_index, device.name, device.vendor
            );
        }
    }
    out
}
