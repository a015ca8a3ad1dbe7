use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of the trusted double-precision backend used for accuracy checks.
pub const REFERENCE_PLATFORM: &str = "Reference";
/// Name of the built-in multithreaded backend.
pub const CPU_PLATFORM: &str = "CPU";

/// Whether `name` is one of the platforms every engine provides without
/// plugins. Only plugin platforms are addressed by a platform index.
pub fn is_built_in(name: &str) -> bool {
    name == REFERENCE_PLATFORM || name == CPU_PLATFORM
}

/// Backend-specific context properties, e.g. `OpenCLDeviceIndex = "1"`.
pub type PropertyMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precision {
    #[default]
    Single,
    Mixed,
    Double,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Mixed => "mixed",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "mixed" => Ok(Self::Mixed),
            "double" => Ok(Self::Double),
            other => Err(format!(
                "unknown precision '{}', expected single, mixed or double",
                other
            )),
        }
    }
}

/// A compute device exposed by a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceInfo {
    #[serde(default)]
    pub platform_index: u32,
    pub device_index: u32,
    pub name: String,
    pub vendor: String,
}

/// Describes how a platform is addressed by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub name: String,
    /// Prefix of the device-selection properties (`<prefix>DeviceIndex`,
    /// `<prefix>Precision`). `None` for platforms without device selection.
    pub property_prefix: Option<String>,
    /// Whether the platform groups devices into sub-platforms, selected with
    /// `<prefix>PlatformIndex`.
    pub sub_platforms: bool,
    pub devices: Vec<DeviceInfo>,
}

impl PlatformInfo {
    pub fn requires_device_selection(&self) -> bool {
        self.property_prefix.is_some()
    }

    /// Builds the property map selecting `device_index`/`platform_index` at
    /// `precision`. Platforms without device selection get an empty map.
    pub fn properties_for(
        &self,
        precision: Precision,
        device_index: u32,
        platform_index: u32,
    ) -> PropertyMap {
        let mut properties = PropertyMap::new();
        if let Some(prefix) = &self.property_prefix {
            properties.insert(format!("{prefix}Precision"), precision.to_string());
            properties.insert(format!("{prefix}DeviceIndex"), device_index.to_string());
            if self.sub_platforms {
                properties.insert(
                    format!("{prefix}PlatformIndex"),
                    platform_index.to_string(),
                );
            }
        }
        properties
    }
}
