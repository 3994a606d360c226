//! sysfs backlight (`/sys/class/backlight/<name>`)

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use roundel_hal::Backlight;

use crate::error::{HalError, Result};

/// Default sysfs class directory
pub const BACKLIGHT_CLASS_DIR: &str = "/sys/class/backlight";

/// Backlight controlled through a sysfs `brightness` file
#[derive(Debug, Clone)]
pub struct SysfsBacklight {
    brightness: PathBuf,
    max: u32,
}

impl SysfsBacklight {
    /// Open one backlight device directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let max_path = dir.join("max_brightness");
        let max = fs::read_to_string(&max_path)
            .map_err(|source| HalError::Open {
                path: max_path.clone(),
                source,
            })?
            .trim()
            .parse::<u32>()
            .map_err(|e| HalError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        Ok(Self {
            brightness: dir.join("brightness"),
            max,
        })
    }

    /// First device under `class_dir`, if any
    pub fn first_available(class_dir: impl AsRef<Path>) -> Option<Self> {
        let mut dirs: Vec<_> = fs::read_dir(class_dir)
            .ok()?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        dirs.sort();
        dirs.into_iter().find_map(|d| Self::open(d).ok())
    }

    pub fn max_brightness(&self) -> u32 {
        self.max
    }
}

impl Backlight for SysfsBacklight {
    type Error = HalError;

    fn set_level(&mut self, level: u8) -> Result<()> {
        let raw = scale(level, self.max);
        debug!("backlight level {} -> {}/{}", level, raw, self.max);
        fs::write(&self.brightness, raw.to_string())?;
        Ok(())
    }
}

/// Map 0..=255 onto 0..=max
fn scale(level: u8, max: u32) -> u32 {
    (u64::from(level) * u64::from(max) / 255) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_write() {
        let dir = tempfile::tempdir().unwrap();
        let dev = dir.path().join("panel");
        fs::create_dir(&dev).unwrap();
        fs::write(dev.join("max_brightness"), "1023\n").unwrap();
        fs::write(dev.join("brightness"), "0").unwrap();

        let mut bl = SysfsBacklight::first_available(dir.path()).unwrap();
        assert_eq!(bl.max_brightness(), 1023);

        bl.set_level(255).unwrap();
        assert_eq!(fs::read_to_string(dev.join("brightness")).unwrap(), "1023");
        bl.set_level(0).unwrap();
        assert_eq!(fs::read_to_string(dev.join("brightness")).unwrap(), "0");
    }

    #[test]
    fn test_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SysfsBacklight::first_available(dir.path()).is_none());
        assert!(SysfsBacklight::open(dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_scale_large_max() {
        assert_eq!(scale(255, u32::MAX), u32::MAX);
        assert_eq!(scale(128, 20_000_000), 10_039_215);
        assert_eq!(scale(0, u32::MAX), 0);
    }
}
