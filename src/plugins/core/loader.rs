//! Loader for `assets/data/combat.ron`.

use std::fs;
use std::path::Path;

use ron::Options;

use super::config::{CombatConfig, DataFile, SCHEMA_VERSION};

pub const CONFIG_PATH: &str = "assets/data/combat.ron";

/// Error type for config loading failures.
#[derive(Debug)]
pub struct ConfigError {
    pub file: String,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to load {}: {}", self.file, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// RON options with `IMPLICIT_SOME`, so optional fields can be written without `Some(..)`.
fn ron_options() -> Options {
    Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

/// Parse a `DataFile<CombatConfig>` from text. `file` only labels errors.
pub fn parse_config(file: &str, contents: &str) -> Result<CombatConfig, ConfigError> {
    let data: DataFile<CombatConfig> = ron_options().from_str(contents).map_err(|e| ConfigError {
        file: file.to_string(),
        message: format!("Parse error: {}", e),
    })?;

    if data.schema_version != SCHEMA_VERSION {
        return Err(ConfigError {
            file: file.to_string(),
            message: format!(
                "schema version {} (expected {})",
                data.schema_version, SCHEMA_VERSION
            ),
        });
    }

    Ok(data.config)
}

pub fn load_config(path: &Path) -> Result<CombatConfig, ConfigError> {
    let file_name = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|e| ConfigError {
        file: file_name.clone(),
        message: format!("IO error: {}", e),
    })?;

    parse_config(&file_name, &contents)
}
