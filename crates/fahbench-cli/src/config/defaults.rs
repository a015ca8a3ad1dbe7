use fahbench::engine::Precision;
use fahbench::workflows::config::{DEFAULT_PLATFORM, DEFAULT_RUN_LENGTH, DEFAULT_WORK_UNIT};

pub struct DefaultsConfig {
    pub work_unit: String,
    pub platform: String,
    pub precision: Precision,
    pub device: u32,
    pub platform_index: u32,
    pub verify_accuracy: bool,
    pub nan_check: u32,
    pub run_length_secs: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            work_unit: DEFAULT_WORK_UNIT.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            precision: Precision::Single,
            device: 0,
            platform_index: 0,
            verify_accuracy: true,
            nan_check: 0,
            run_length_secs: DEFAULT_RUN_LENGTH.as_secs_f64(),
        }
    }
}
