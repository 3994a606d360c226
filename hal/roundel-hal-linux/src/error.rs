//! Errors from the Linux HAL

use std::io;
use std::path::PathBuf;

/// Errors raised while opening or driving Linux devices
#[derive(Debug, thiserror::Error)]
pub enum HalError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("system call failed: {0}")]
    Nix(#[from] nix::Error),

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no connected display output")]
    NoConnector,

    #[error("connector has no usable mode")]
    NoMode,

    #[error("no CRTC available for the connector")]
    NoCrtc,

    #[error("no input device matching {0:?}")]
    NoInputDevice(Vec<String>),

    #[error("i2c bus {path}: {message}")]
    I2c { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, HalError>;
