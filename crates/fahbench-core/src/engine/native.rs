use super::context::NativeContext;
use super::error::EngineError;
use super::kernels::{CpuKernel, ForceKernel, ForceTerms, ReferenceKernel};
use super::platform::{CPU_PLATFORM, DeviceInfo, PlatformInfo, Precision, PropertyMap, REFERENCE_PLATFORM};
use super::plugins::{self, PluginBackend, PluginManifest};
use super::traits::Engine;
use crate::core::models::integrator::Integrator;
use crate::core::models::system::System;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct RegisteredPlatform {
    info: PlatformInfo,
    backend: PluginBackend,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ContextOptions {
    precision: Precision,
    device_index: u32,
    platform_index: u32,
}

impl RegisteredPlatform {
    fn built_in(name: &str, backend: PluginBackend) -> Self {
        let threads = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self {
            info: PlatformInfo {
                name: name.to_string(),
                property_prefix: None,
                sub_platforms: false,
                devices: vec![DeviceInfo {
                    platform_index: 0,
                    device_index: 0,
                    name: format!("Host CPU ({} threads)", threads),
                    vendor: "Host".to_string(),
                }],
            },
            backend,
        }
    }

    fn from_manifest(manifest: PluginManifest) -> Self {
        Self {
            info: PlatformInfo {
                name: manifest.name,
                property_prefix: Some(manifest.property_prefix),
                sub_platforms: manifest.sub_platforms,
                devices: manifest.devices,
            },
            backend: manifest.backend,
        }
    }

    fn default_precision(&self) -> Precision {
        match self.backend {
            PluginBackend::Reference => Precision::Double,
            PluginBackend::Cpu => Precision::Single,
        }
    }

    fn parse_options(&self, properties: &PropertyMap) -> Result<ContextOptions, EngineError> {
        let mut options = ContextOptions {
            precision: self.default_precision(),
            device_index: 0,
            platform_index: 0,
        };
        let unknown = |property: &str| EngineError::UnknownProperty {
            platform: self.info.name.clone(),
            property: property.to_string(),
        };
        let invalid = |property: &str, value: &str, reason: String| EngineError::InvalidProperty {
            property: property.to_string(),
            value: value.to_string(),
            reason,
        };

        let Some(prefix) = &self.info.property_prefix else {
            return match properties.keys().next() {
                Some(property) => Err(unknown(property)),
                None => Ok(options),
            };
        };

        for (property, value) in properties {
            let suffix = property.strip_prefix(prefix.as_str());
            match suffix {
                Some("Precision") => {
                    options.precision = value
                        .parse()
                        .map_err(|reason| invalid(property, value, reason))?;
                }
                Some("DeviceIndex") => {
                    options.device_index = value
                        .parse()
                        .map_err(|e: std::num::ParseIntError| invalid(property, value, e.to_string()))?;
                }
                Some("PlatformIndex") if self.info.sub_platforms => {
                    options.platform_index = value
                        .parse()
                        .map_err(|e: std::num::ParseIntError| invalid(property, value, e.to_string()))?;
                }
                _ => return Err(unknown(property)),
            }
        }

        let sub_platforms = self.info.sub_platforms;
        let device_exists = self.info.devices.iter().any(|d| {
            d.device_index == options.device_index
                && (!sub_platforms || d.platform_index == options.platform_index)
        });
        if !device_exists {
            return Err(invalid(
                &format!("{prefix}DeviceIndex"),
                &options.device_index.to_string(),
                format!(
                    "platform '{}' has no device {} on sub-platform {}",
                    self.info.name, options.device_index, options.platform_index
                ),
            ));
        }
        Ok(options)
    }
}

/// The built-in engine: a platform registry with the `Reference` and `CPU`
/// platforms, extended at runtime from plugin manifests.
#[derive(Debug, Clone)]
pub struct NativeEngine {
    platforms: Vec<RegisteredPlatform>,
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self {
            platforms: vec![
                RegisteredPlatform::built_in(REFERENCE_PLATFORM, PluginBackend::Reference),
                RegisteredPlatform::built_in(CPU_PLATFORM, PluginBackend::Cpu),
            ],
        }
    }
}

impl NativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, name: &str) -> Option<&RegisteredPlatform> {
        self.platforms.iter().find(|p| p.info.name == name)
    }
}

impl Engine for NativeEngine {
    type Context = NativeContext;

    fn load_plugins_from_directory(&mut self, dir: &Path) -> Result<usize, EngineError> {
        let mut registered = 0;
        for manifest in plugins::scan_directory(dir)? {
            if self.find(&manifest.name).is_some() {
                debug!("Platform '{}' is already registered; skipping.", manifest.name);
                continue;
            }
            info!(
                platform = %manifest.name,
                devices = manifest.devices.len(),
                "Registered plugin platform."
            );
            self.platforms.push(RegisteredPlatform::from_manifest(manifest));
            registered += 1;
        }
        Ok(registered)
    }

    fn num_platforms(&self) -> usize {
        self.platforms.len()
    }

    fn platforms(&self) -> Vec<PlatformInfo> {
        self.platforms.iter().map(|p| p.info.clone()).collect()
    }

    fn platform(&self, name: &str) -> Option<PlatformInfo> {
        self.find(name).map(|p| p.info.clone())
    }

    fn create_context(
        &self,
        system: Arc<System>,
        integrator: Integrator,
        platform: &str,
        properties: &PropertyMap,
    ) -> Result<NativeContext, EngineError> {
        let registered = self
            .find(platform)
            .ok_or_else(|| EngineError::UnknownPlatform(platform.to_string()))?;
        let options = registered.parse_options(properties)?;
        let terms = ForceTerms::from_system(&system)?;
        let kernel: Box<dyn ForceKernel> = match registered.backend {
            PluginBackend::Reference => Box::new(ReferenceKernel::new(terms)),
            PluginBackend::Cpu => Box::new(CpuKernel::new(terms, options.precision)),
        };
        debug!(
            platform,
            precision = %options.precision,
            device = options.device_index,
            sub_platform = options.platform_index,
            "Creating native context."
        );
        NativeContext::new(platform.to_string(), system, integrator, kernel)
    }
}
