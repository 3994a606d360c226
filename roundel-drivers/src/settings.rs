//! Driver settings as they appear in the service and shell config files,
//! and the loader those files share
//!
//! Every key has a built-in default, so a missing file (or a file that
//! sets only a few keys) still yields a complete configuration. A file
//! that exists but does not parse is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use roundel_core::input::touch::DEFAULT_ADDRESS;
use roundel_core::input::ButtonTiming;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Read a TOML file, falling back to defaults when it does not exist
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("{} not found, using built-in defaults", path.display());
            return Ok(T::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// `KEY_POWER`
pub const DEFAULT_KEY_CODE: u16 = 116;

/// Touch controller settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchSettings {
    /// i2c-dev node
    pub bus: PathBuf,
    /// 7-bit controller address
    pub address: u8,
    pub poll_interval_ms: u64,
}

impl Default for TouchSettings {
    fn default() -> Self {
        Self {
            bus: PathBuf::from("/dev/i2c-1"),
            address: DEFAULT_ADDRESS,
            poll_interval_ms: 20,
        }
    }
}

impl TouchSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Button settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonSettings {
    /// Substrings matched against input device names
    pub device_names: Vec<String>,
    pub key_code: u16,
    #[serde(flatten)]
    pub timing: ButtonTiming,
}

impl Default for ButtonSettings {
    fn default() -> Self {
        Self {
            device_names: vec!["Power Button".to_string(), "roundel-button".to_string()],
            key_code: DEFAULT_KEY_CODE,
            timing: ButtonTiming::default(),
        }
    }
}
