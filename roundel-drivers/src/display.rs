//! Frame buffer display
//!
//! Owns the scanout and backlight for the round panel. The rendering side
//! hands over dirty rectangles of RGB565 pixels through [`FlushTarget`];
//! each flush is copied row by row into the mapped buffer, honouring its
//! pitch, before the call returns, so the caller may reuse its pixel buffer
//! immediately.

use log::{debug, info, warn};

use roundel_core::geometry::{Rect, HEIGHT, SAFE_RADIUS, WIDTH};
use roundel_hal::{Backlight, PixelFormat, Scanout, ScanoutGeometry};

/// Display errors
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("scanout error: {0}")]
    Scanout(String),

    #[error("unsupported pixel format {0:?}")]
    UnsupportedFormat(PixelFormat),

    #[error("panel mode {width}x{height} is smaller than the 240x240 surface")]
    PanelTooSmall { width: u32, height: u32 },

    #[error("scanout buffer holds {got} bytes, geometry needs {expected}")]
    ShortMapping { expected: usize, got: usize },

    #[error("flush of {expected} pixels given {got}")]
    ShortPixels { expected: usize, got: usize },

    #[error("display already closed")]
    Closed,
}

fn scanout_err<E: core::fmt::Debug>(e: E) -> DisplayError {
    DisplayError::Scanout(format!("{:?}", e))
}

/// Logical drawing surface exposed to the toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySurface {
    pub width: u16,
    pub height: u16,
    pub format: PixelFormat,
    /// Largest radius fully visible on the round panel
    pub safe_radius: i16,
}

/// Something the toolkit can flush dirty rectangles into
pub trait FlushTarget {
    fn surface(&self) -> DisplaySurface;

    /// Copy `pixels` (row-major, `rect.width * rect.height` RGB565 values)
    /// into `rect`
    fn flush(&mut self, rect: Rect, pixels: &[u16]) -> Result<(), DisplayError>;
}

/// Panel driver over a scanout and a backlight
pub struct FrameBufferDisplay<S: Scanout, B: Backlight> {
    scanout: S,
    backlight: B,
    geometry: ScanoutGeometry,
    closed: bool,
}

impl<S: Scanout, B: Backlight> FrameBufferDisplay<S, B> {
    /// Take ownership of an opened scanout and switch the panel on
    pub fn open(mut scanout: S, backlight: B) -> Result<Self, DisplayError> {
        let geometry = scanout.geometry();

        if geometry.format != PixelFormat::Rgb565 {
            return Err(DisplayError::UnsupportedFormat(geometry.format));
        }
        if geometry.width < WIDTH as u32 || geometry.height < HEIGHT as u32 {
            return Err(DisplayError::PanelTooSmall {
                width: geometry.width,
                height: geometry.height,
            });
        }
        let mapped = scanout.pixels_mut().len();
        if mapped < geometry.buffer_len() {
            return Err(DisplayError::ShortMapping {
                expected: geometry.buffer_len(),
                got: mapped,
            });
        }

        scanout.set_power(true).map_err(scanout_err)?;
        info!(
            "Display opened: {}x{} surface on {}x{} scanout (pitch {})",
            WIDTH, HEIGHT, geometry.width, geometry.height, geometry.pitch
        );

        Ok(Self {
            scanout,
            backlight,
            geometry,
            closed: false,
        })
    }

    /// Panel output on or off
    pub fn set_power(&mut self, on: bool) -> Result<(), DisplayError> {
        if self.closed {
            return Err(DisplayError::Closed);
        }
        debug!("Display power {}", if on { "on" } else { "off" });
        self.scanout.set_power(on).map_err(scanout_err)
    }

    /// Best-effort brightness; failures are logged and ignored
    pub fn set_brightness(&mut self, level: u8) {
        if let Err(e) = self.backlight.set_level(level) {
            debug!("Backlight unavailable: {:?}", e);
        }
    }

    /// Put back the previous display mode and release the scanout
    pub fn close(mut self) -> Result<(), DisplayError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), DisplayError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.scanout.restore().map_err(scanout_err)?;
        info!("Display closed");
        Ok(())
    }

    /// Access the scanout (tests inspect the mapped pixels through this)
    pub fn scanout(&self) -> &S {
        &self.scanout
    }
}

impl<S: Scanout, B: Backlight> FlushTarget for FrameBufferDisplay<S, B> {
    fn surface(&self) -> DisplaySurface {
        DisplaySurface {
            width: WIDTH,
            height: HEIGHT,
            format: PixelFormat::Rgb565,
            safe_radius: SAFE_RADIUS,
        }
    }

    fn flush(&mut self, rect: Rect, pixels: &[u16]) -> Result<(), DisplayError> {
        if self.closed {
            return Err(DisplayError::Closed);
        }
        if pixels.len() < rect.area() {
            return Err(DisplayError::ShortPixels {
                expected: rect.area(),
                got: pixels.len(),
            });
        }

        let clip = rect.clip_to(WIDTH, HEIGHT);
        if clip.is_empty() {
            return Ok(());
        }

        let pitch = self.geometry.pitch as usize;
        let bpp = PixelFormat::Rgb565.bytes_per_pixel();
        let src_stride = rect.width as usize;
        let dx = (clip.x - rect.x) as usize;
        let dy = (clip.y - rect.y) as usize;
        let buf = self.scanout.pixels_mut();

        for row in 0..clip.height as usize {
            let src_start = (dy + row) * src_stride + dx;
            let src = &pixels[src_start..src_start + clip.width as usize];
            let dst_start = (clip.y as usize + row) * pitch + clip.x as usize * bpp;
            let dst = &mut buf[dst_start..dst_start + clip.width as usize * bpp];
            for (out, px) in dst.chunks_exact_mut(2).zip(src) {
                out.copy_from_slice(&px.to_le_bytes());
            }
        }
        Ok(())
    }
}

impl<S: Scanout, B: Backlight> Drop for FrameBufferDisplay<S, B> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Display release failed: {}", e);
        }
    }
}

/// Scanout backed by ordinary memory
///
/// Used when running headless and in tests.
#[derive(Debug, Clone)]
pub struct MemoryScanout {
    geometry: ScanoutGeometry,
    pixels: Vec<u8>,
    powered: bool,
    restores: u32,
}

impl MemoryScanout {
    pub fn new(geometry: ScanoutGeometry) -> Self {
        Self {
            geometry,
            pixels: vec![0; geometry.buffer_len()],
            powered: false,
            restores: 0,
        }
    }

    /// Packed RGB565 buffer the size of the panel
    pub fn panel() -> Self {
        Self::new(ScanoutGeometry::packed(WIDTH as u32, HEIGHT as u32, PixelFormat::Rgb565))
    }

    /// RGB565 value at a pixel
    pub fn pixel(&self, x: u32, y: u32) -> u16 {
        let off = y as usize * self.geometry.pitch as usize + x as usize * 2;
        u16::from_le_bytes([self.pixels[off], self.pixels[off + 1]])
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn restore_count(&self) -> u32 {
        self.restores
    }
}

impl Scanout for MemoryScanout {
    type Error = core::convert::Infallible;

    fn geometry(&self) -> ScanoutGeometry {
        self.geometry
    }

    fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    fn set_power(&mut self, on: bool) -> Result<(), Self::Error> {
        self.powered = on;
        Ok(())
    }

    fn restore(&mut self) -> Result<(), Self::Error> {
        self.restores += 1;
        self.powered = false;
        Ok(())
    }
}
