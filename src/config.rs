//! Shared config utilities for loading/saving JSON config files.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;

/// Errors raised at the configuration edge. The cue engine itself is infallible.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` on any load failure; only a missing file
/// is treated as routine and logged at info level.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    match read_json_config(path) {
        Ok(config) => {
            tracing::info!(target: "config", "[{}] Loaded config from {}", label, path.display());
            config
        }
        Err(ConfigError::Io { ref source, .. }) if source.kind() == ErrorKind::NotFound => {
            tracing::info!(
                target: "config",
                "[{}] No config file at {}, using defaults",
                label,
                path.display()
            );
            T::default()
        }
        Err(e) => {
            tracing::warn!(
                target: "config",
                "[{}] Failed to load config {} ({}), using defaults",
                label,
                path.display(),
                e
            );
            T::default()
        }
    }
}

/// Strict load: missing files and parse errors are reported to the caller.
pub fn read_json_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    Ok(serde_json::from_str::<T>(&content)?)
}

/// Generic save for any Serde config type.
pub fn save_json_config<T: Serialize>(
    path: &Path,
    config: &T,
    label: &str,
) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).map_err(|e| ConfigError::io(path, e))?;
    tracing::info!(target: "config", "[{}] Saved config to {}", label, path.display());
    Ok(())
}
