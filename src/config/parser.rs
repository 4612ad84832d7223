use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates configuration text
///
/// Missing sections and keys take their defaults, so an empty string yields
/// the default configuration.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads and validates the configuration file at `path`
///
/// # Returns
///
/// * `Ok(Config)` - Valid configuration
/// * `Err(ConfigError::Io)` - The file could not be read
/// * `Err(ConfigError::Parse)` - The file is not valid TOML for this layout
/// * `Err(ConfigError::Validation | UnknownCategory | InvalidUrl)` - A value is out of range
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_hash(path).map(|(config, _)| config)
}

/// SHA-256 fingerprint of a configuration file, hex encoded
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(fingerprint(&content))
}

/// Loads a configuration together with the fingerprint of the exact bytes parsed
///
/// The fingerprint is logged at startup so runs made with different files can
/// be told apart.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, fingerprint(content.as_bytes())))
}

fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
