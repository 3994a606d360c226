//! Linux HAL for the round-display shell
//!
//! This crate provides Linux userspace implementations of the shared
//! `roundel-hal` traits:
//!
//! - DRM/KMS dumb-buffer scanout (implements `roundel_hal::Scanout`)
//! - sysfs backlight (implements `roundel_hal::Backlight`)
//! - evdev key source located by device name (implements
//!   `roundel_hal::KeyEventSource`)
//! - `/dev/i2c-N` bus for the touch controller (embedded-hal 1.0 `I2c`)

pub mod backlight;
pub mod drm;
pub mod error;
pub mod evdev;
pub mod i2c;

// Re-export shared traits from roundel-hal for convenience
pub use roundel_hal::{Backlight, KeyEdge, KeyEventSource, NoBacklight, Scanout};

pub use backlight::SysfsBacklight;
pub use drm::DrmScanout;
pub use error::HalError;
pub use evdev::EvdevKeySource;
pub use i2c::{open_i2c, I2cdev};
