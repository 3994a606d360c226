//! Scanout buffer abstractions
//!
//! A scanout is the memory the display controller reads pixels from. The
//! implementation owns the mapping and whatever mode it replaced, and must
//! hand the panel back in its previous mode when restored.

/// Pixel encoding of the scanout buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelFormat {
    /// 16-bit 5-6-5, little endian
    Rgb565,
    /// 32-bit XRGB, little endian
    Xrgb8888,
}

impl PixelFormat {
    /// Bytes per pixel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Xrgb8888 => 4,
        }
    }

    /// Bits per pixel
    pub const fn bits_per_pixel(self) -> u32 {
        (self.bytes_per_pixel() * 8) as u32
    }
}

/// Shape of a mapped scanout buffer
///
/// `pitch` is the byte length of one row in the buffer, which may be larger
/// than `width * bytes_per_pixel` when the controller pads rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanoutGeometry {
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub format: PixelFormat,
}

impl ScanoutGeometry {
    /// Geometry with no row padding
    pub const fn packed(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            pitch: width * format.bytes_per_pixel() as u32,
            format,
        }
    }

    /// Minimum buffer size in bytes
    pub const fn buffer_len(&self) -> usize {
        self.pitch as usize * self.height as usize
    }
}

/// Mapped display buffer
///
/// Implementations are exclusive owners of the hardware surface. The
/// buffer returned by [`Scanout::pixels_mut`] is at least
/// [`ScanoutGeometry::buffer_len`] bytes long.
pub trait Scanout {
    type Error: core::fmt::Debug;

    /// Shape of the mapped buffer
    fn geometry(&self) -> ScanoutGeometry;

    /// Mutable view of the mapped pixel memory
    fn pixels_mut(&mut self) -> &mut [u8];

    /// Turn panel output on or off
    fn set_power(&mut self, on: bool) -> Result<(), Self::Error>;

    /// Put back the mode that was active before this scanout took over
    ///
    /// Called once during teardown. Implementations must tolerate a second
    /// call as a no-op.
    fn restore(&mut self) -> Result<(), Self::Error>;
}
