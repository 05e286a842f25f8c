//! Configuration file loading.

use crate::config::types::WardenConfig;
use crate::error::WardenError;
use std::path::{Path, PathBuf};

/// Project-local configuration file name.
const LOCAL_CONFIG_NAME: &str = "toolwarden.toml";

/// File name inside the XDG config directory.
const XDG_CONFIG_NAME: &str = "config.toml";

/// Application name for XDG directory lookup.
const APP_NAME: &str = "toolwarden";

/// Loads configuration, preferring an explicit path.
///
/// Search order when `explicit` is `None`:
/// 1. `./toolwarden.toml`
/// 2. `~/.config/toolwarden/config.toml`
///
/// Returns defaults if no file is found.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or parsed. An explicit
/// path that does not exist is an error.
pub fn load(explicit: Option<&Path>) -> Result<WardenConfig, WardenError> {
    if let Some(path) = explicit {
        return from_path(path);
    }

    match search_paths().into_iter().find(|p| p.exists()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            from_path(&path)
        }
        None => Ok(WardenConfig::default()),
    }
}

/// Loads configuration from a specific file path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid configuration.
pub fn from_path(path: &Path) -> Result<WardenConfig, WardenError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        WardenError::configuration(
            "config_file",
            format!("failed to read '{}': {}", path.display(), e),
        )
    })?;

    from_str(&contents).map_err(|e| {
        WardenError::configuration(
            "config_file",
            format!("failed to parse '{}': {}", path.display(), e),
        )
    })
}

/// Parses configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or doesn't match the schema.
pub fn from_str(toml_str: &str) -> Result<WardenConfig, WardenError> {
    toml::from_str(toml_str)
        .map_err(|e| WardenError::configuration("config", format!("invalid TOML: {e}")))
}

/// Renders configuration as TOML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_toml(config: &WardenConfig) -> Result<String, WardenError> {
    toml::to_string_pretty(config)
        .map_err(|e| WardenError::configuration("config", format!("failed to render TOML: {e}")))
}

/// Paths searched when no explicit configuration file is given.
#[must_use]
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];

    if let Some(path) = xdg_config_path() {
        paths.push(path);
    }

    paths
}

/// `~/.config/toolwarden/config.toml` on most systems.
#[must_use]
pub fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME).join(XDG_CONFIG_NAME))
}

/// Writes `config` to `path` unless a file already exists there.
///
/// Returns `false` if the file already existed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_if_absent(path: &Path, config: &WardenConfig) -> Result<bool, WardenError> {
    if path.exists() {
        return Ok(false);
    }

    let write_err = |e: std::io::Error| {
        WardenError::configuration(
            "config_file",
            format!("failed to write '{}': {}", path.display(), e),
        )
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, to_toml(config)?).map_err(write_err)?;
    Ok(true)
}
