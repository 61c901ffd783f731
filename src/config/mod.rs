pub mod builder;
pub mod defaults;
pub mod merge;
pub mod types;


pub use builder::ConfigBuilder;
pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load the YAML config file, returning its input and containing directory.
/// A missing file yields an empty input.
pub fn load_config(config_file: &str) -> Result<(ConfigInput, PathBuf)> {
    let config_dir = Path::new(config_file)
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let config_input = if Path::new(config_file).exists() {
        let contents = std::fs::read_to_string(config_file)
            .with_context(|| format!("Failed to read config file {}", config_file))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", config_file))?
    } else {
        ConfigInput::default()
    };

    Ok((config_input, config_dir))
}
