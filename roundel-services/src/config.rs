//! Service configuration files
//!
//! Loaded with the same defaults-on-missing rules as the shell's file
//! ([`roundel_drivers::settings::load_or_default`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use roundel_core::power::DEFAULT_SCREEN_TIMEOUT_MS;
pub use roundel_drivers::{load_or_default, ConfigError};
use roundel_drivers::{ButtonSettings, TouchSettings};

/// `roundel-power` settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// DRM card node
    pub display_device: PathBuf,
    /// Backlight device directory; the first one found when unset
    pub backlight: Option<PathBuf>,
    /// Idle time before the screen turns off, 0 disables
    pub screen_timeout_ms: u32,
    pub active_governor: String,
    pub screen_off_governor: String,
    /// Root of the per-CPU cpufreq directories
    pub cpu_root: PathBuf,
    pub cpu_count: u32,
    /// Command run for the shutdown state
    pub shutdown_command: Vec<String>,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            display_device: PathBuf::from("/dev/dri/card0"),
            backlight: None,
            screen_timeout_ms: DEFAULT_SCREEN_TIMEOUT_MS,
            active_governor: "schedutil".to_string(),
            screen_off_governor: "powersave".to_string(),
            cpu_root: PathBuf::from("/sys/devices/system/cpu"),
            cpu_count: 4,
            shutdown_command: vec!["systemctl".to_string(), "poweroff".to_string()],
        }
    }
}

impl PowerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_or_default(path)
    }
}

/// `roundel-input` settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub touch: TouchSettings,
    pub button: ButtonSettings,
}

impl InputConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_or_default(path)
    }
}
