//! Touch controller driver
//!
//! Reads the controller's register block once per poll and feeds the
//! decoded point to a [`TouchTracker`]. A failed bus transfer counts as
//! "finger lifted" for that cycle and is never reported upward.

use embedded_hal::i2c::I2c;
use log::trace;

use roundel_core::input::touch::{decode_packet, TouchBatch, PACKET_LEN, PACKET_REGISTER};
use roundel_core::input::{PointerState, TouchTracker};

/// Result of one poll
#[derive(Debug, Clone, Default)]
pub struct TouchPoll {
    pub pointer: PointerState,
    pub samples: TouchBatch,
}

/// Touch controller on an I2C bus
pub struct TouchChannel<I> {
    bus: I,
    address: u8,
    tracker: TouchTracker,
}

impl<I: I2c> TouchChannel<I> {
    /// Wrap an opened bus; `address` is the controller's 7-bit address
    pub fn new(bus: I, address: u8) -> Self {
        Self {
            bus,
            address,
            tracker: TouchTracker::new(),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Read the controller once and classify the result
    pub fn poll(&mut self, now_ms: u32) -> TouchPoll {
        let reading = match self.read_packet() {
            Ok(buf) => decode_packet(&buf),
            Err(e) => {
                trace!("touch read failed, treating as released: {:?}", e);
                None
            }
        };

        let samples = self.tracker.update(reading, now_ms);
        TouchPoll {
            pointer: self.tracker.pointer(),
            samples,
        }
    }

    fn read_packet(&mut self) -> Result<[u8; PACKET_LEN], I::Error> {
        let mut buf = [0u8; PACKET_LEN];
        self.bus.write_read(self.address, &[PACKET_REGISTER], &mut buf)?;
        Ok(buf)
    }
}
