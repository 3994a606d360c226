//! i2c-dev bus access
//!
//! The touch driver is written against `embedded_hal::i2c::I2c`; on Linux
//! that is `linux_embedded_hal::I2cdev`.

use std::path::Path;

pub use linux_embedded_hal::I2cdev;

use crate::error::{HalError, Result};

/// Open an i2c-dev node such as `/dev/i2c-1`
pub fn open_i2c(path: impl AsRef<Path>) -> Result<I2cdev> {
    let path = path.as_ref();
    I2cdev::new(path).map_err(|e| HalError::I2c {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_bus() {
        let Err(err) = open_i2c("/nonexistent/i2c-99") else {
            panic!("expected open of missing i2c bus to fail");
        };
        assert!(matches!(err, HalError::I2c { .. }));
        assert!(err.to_string().contains("/nonexistent/i2c-99"));
    }
}
