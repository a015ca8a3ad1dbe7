pub mod builder;
pub mod defaults;
pub mod file;

pub use builder::{build_config, load_file_config, resolve_paths};
