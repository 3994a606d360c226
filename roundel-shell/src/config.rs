//! Shell configuration (`/etc/roundel/shell.toml`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use roundel_drivers::ConfigError;
use roundel_drivers::{load_or_default, ButtonSettings, TouchSettings};

/// Everything the shell process needs, built once in `main`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// DRM card node
    pub display_device: PathBuf,
    /// Backlight device directory; the first one found when unset
    pub backlight: Option<PathBuf>,
    pub touch: TouchSettings,
    pub button: ButtonSettings,
    /// One subdirectory per installed app
    pub apps_dir: PathBuf,
    /// Program that runs external apps, given the entry point as its only argument
    pub interpreter: PathBuf,
    /// Upper bound on the main loop sleep
    pub loop_ceiling_ms: u64,
    pub clock_refresh_ms: u32,
    /// Main loop iterations between watchdog pings
    pub watchdog_every: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            display_device: PathBuf::from("/dev/dri/card0"),
            backlight: None,
            touch: TouchSettings::default(),
            button: ButtonSettings::default(),
            apps_dir: PathBuf::from("/usr/share/roundel/apps"),
            interpreter: PathBuf::from("/usr/bin/python3"),
            loop_ceiling_ms: 100,
            clock_refresh_ms: 1000,
            watchdog_every: 100,
        }
    }
}

impl ShellConfig {
    /// Load from `path`; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_or_default(path)
    }

    pub fn loop_ceiling(&self) -> Duration {
        Duration::from_millis(self.loop_ceiling_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ShellConfig::load(&dir.path().join("shell.toml")).unwrap();
        assert_eq!(cfg, ShellConfig::default());
        assert_eq!(cfg.loop_ceiling(), Duration::from_millis(100));
    }

    #[test]
    fn test_nested_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.toml");
        fs::write(
            &path,
            r#"
apps_dir = "/opt/apps"
interpreter = "/bin/sh"

[touch]
address = 0x38

[button]
device_names = ["gpio-keys"]
debounce_ms = 30
"#,
        )
        .unwrap();

        let cfg = ShellConfig::load(&path).unwrap();
        assert_eq!(cfg.apps_dir, PathBuf::from("/opt/apps"));
        assert_eq!(cfg.interpreter, PathBuf::from("/bin/sh"));
        assert_eq!(cfg.touch.address, 0x38);
        assert_eq!(cfg.touch.poll_interval_ms, 20);
        assert_eq!(cfg.button.device_names, vec!["gpio-keys".to_string()]);
        assert_eq!(cfg.button.timing.debounce_ms, 30);
        assert_eq!(cfg.watchdog_every, 100);
    }

    #[test]
    fn test_bad_type_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.toml");
        fs::write(&path, "loop_ceiling_ms = -5\n").unwrap();
        assert!(matches!(ShellConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
