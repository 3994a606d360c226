//! Key input abstractions
//!
//! Provides a blocking-with-timeout source of raw key edges. Debouncing and
//! press classification happen above this layer.

/// Raw key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyEdge {
    Pressed,
    Released,
}

/// Source of key edges for one physical button
pub trait KeyEventSource {
    type Error: core::fmt::Debug;

    /// Wait up to `timeout_ms` for the next edge
    ///
    /// Returns `Ok(None)` when the wait times out with nothing to report.
    /// Autorepeat and unrelated key codes are filtered by the implementation.
    fn wait_edge(&mut self, timeout_ms: u16) -> Result<Option<KeyEdge>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanout::{PixelFormat, ScanoutGeometry};

    #[test]
    fn test_packed_geometry_pitch() {
        let g = ScanoutGeometry::packed(240, 240, PixelFormat::Rgb565);
        assert_eq!(g.pitch, 480);
        assert_eq!(g.buffer_len(), 480 * 240);
        assert_eq!(PixelFormat::Xrgb8888.bits_per_pixel(), 32);
    }

    #[test]
    fn test_key_edge_eq() {
        assert_ne!(KeyEdge::Pressed, KeyEdge::Released);
    }
}
