//! DRM/KMS dumb-buffer scanout
//!
//! Takes over the first connected connector: allocates an RGB565 dumb
//! buffer sized to the connector's first mode, maps it, and points the CRTC
//! at it. The CRTC configuration found at open time is saved and put back by
//! [`Scanout::restore`] (or on drop), so the next process gets the panel in
//! the mode it expects.

use std::fs::{File, OpenOptions};
use std::os::fd::{AsFd, BorrowedFd};
use std::path::Path;

use drm::buffer::{Buffer, DrmFourcc};
use drm::control::dumbbuffer::DumbBuffer;
use drm::control::{connector, crtc, framebuffer, property, Device as ControlDevice, Mode};
use log::{debug, info, warn};
use memmap2::{MmapMut, MmapOptions};
use roundel_hal::{PixelFormat, Scanout, ScanoutGeometry};

use crate::error::{HalError, Result};

/// DPMS property values
const DPMS_ON: u64 = 0;
const DPMS_OFF: u64 = 3;

/// Open DRM card node
struct Card(File);

impl AsFd for Card {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}

impl drm::Device for Card {}
impl ControlDevice for Card {}

/// Mapped dumb buffer driving one connector
pub struct DrmScanout {
    card: Card,
    connector: connector::Handle,
    crtc: crtc::Handle,
    saved: crtc::Info,
    framebuffer: framebuffer::Handle,
    buffer: Option<DumbBuffer>,
    map: Option<MmapMut>,
    dpms: Option<property::Handle>,
    geometry: ScanoutGeometry,
    restored: bool,
}

impl DrmScanout {
    /// Open a card node (e.g. `/dev/dri/card0`) and take over its first
    /// connected output
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| HalError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let card = Card(file);

        let resources = card.resource_handles()?;
        let conn = resources
            .connectors()
            .iter()
            .filter_map(|&h| card.get_connector(h, false).ok())
            .find(|c| c.state() == connector::State::Connected)
            .ok_or(HalError::NoConnector)?;
        let mode: Mode = *conn.modes().first().ok_or(HalError::NoMode)?;

        let crtc = conn
            .current_encoder()
            .and_then(|e| card.get_encoder(e).ok())
            .and_then(|e| e.crtc())
            .or_else(|| resources.crtcs().first().copied())
            .ok_or(HalError::NoCrtc)?;
        let saved = card.get_crtc(crtc)?;

        let (width, height) = mode.size();
        let buffer = card.create_dumb_buffer((width as u32, height as u32), DrmFourcc::Rgb565, 16)?;
        let framebuffer = card.add_framebuffer(&buffer, 16, 16)?;

        let pitch = buffer.pitch();
        let len = pitch as usize * height as usize;
        let map_req = drm_ffi::mode::dumbbuffer::map(card.as_fd(), u32::from(buffer.handle()), 0, 0)?;
        // SAFETY: the offset comes from the kernel for this buffer and the
        // mapping is dropped before the buffer is destroyed.
        let mut map = unsafe { MmapOptions::new().offset(map_req.offset).len(len).map_mut(&card.0)? };
        map.fill(0);

        card.set_crtc(crtc, Some(framebuffer), (0, 0), &[conn.handle()], Some(mode))?;

        let dpms = find_property(&card, conn.handle(), "DPMS");
        if dpms.is_none() {
            debug!("connector has no DPMS property, panel power control disabled");
        }

        info!(
            "DRM scanout on {}: {}x{} pitch {}",
            path.display(),
            width,
            height,
            pitch
        );

        Ok(Self {
            card,
            connector: conn.handle(),
            crtc,
            saved,
            framebuffer,
            buffer: Some(buffer),
            map: Some(map),
            dpms,
            geometry: ScanoutGeometry {
                width: width as u32,
                height: height as u32,
                pitch,
                format: PixelFormat::Rgb565,
            },
            restored: false,
        })
    }
}

fn find_property(card: &Card, conn: connector::Handle, name: &str) -> Option<property::Handle> {
    let props = card.get_properties(conn).ok()?;
    let (handles, _) = props.as_props_and_values();
    handles.iter().copied().find(|&h| {
        card.get_property(h)
            .map(|info| info.name().to_str() == Ok(name))
            .unwrap_or(false)
    })
}

impl Scanout for DrmScanout {
    type Error = HalError;

    fn geometry(&self) -> ScanoutGeometry {
        self.geometry
    }

    fn pixels_mut(&mut self) -> &mut [u8] {
        self.map.as_deref_mut().unwrap_or(&mut [])
    }

    fn set_power(&mut self, on: bool) -> Result<()> {
        match self.dpms {
            Some(prop) => {
                let value = if on { DPMS_ON } else { DPMS_OFF };
                self.card.set_property(self.connector, prop, value)?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        // Unmap before the buffer goes away
        self.map = None;

        self.card.set_crtc(
            self.crtc,
            self.saved.framebuffer(),
            self.saved.position(),
            &[self.connector],
            self.saved.mode(),
        )?;
        self.card.destroy_framebuffer(self.framebuffer)?;
        if let Some(buffer) = self.buffer.take() {
            self.card.destroy_dumb_buffer(buffer)?;
        }
        info!("DRM scanout released, previous mode restored");
        Ok(())
    }
}

impl Drop for DrmScanout {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("failed to restore display mode: {}", e);
        }
    }
}
