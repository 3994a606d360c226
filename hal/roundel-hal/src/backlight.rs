//! Backlight control
//!
//! Brightness is best-effort: boards without a controllable backlight use
//! [`NoBacklight`].

/// Panel brightness control
pub trait Backlight {
    type Error: core::fmt::Debug;

    /// Set brightness, 0 (off) to 255 (full)
    fn set_level(&mut self, level: u8) -> Result<(), Self::Error>;
}

/// Backlight that accepts every level and does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBacklight;

impl Backlight for NoBacklight {
    type Error = core::convert::Infallible;

    fn set_level(&mut self, _level: u8) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// An absent backlight behaves like [`NoBacklight`]
impl<B: Backlight> Backlight for Option<B> {
    type Error = B::Error;

    fn set_level(&mut self, level: u8) -> Result<(), Self::Error> {
        match self {
            Some(b) => b.set_level(level),
            None => Ok(()),
        }
    }
}
