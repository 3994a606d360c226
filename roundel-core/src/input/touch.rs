//! Touch packet decoding and gesture detection
//!
//! The controller exposes a six byte register block:
//!
//! | Offset | Field        |
//! |--------|--------------|
//! | 0      | gesture id   |
//! | 1      | touch count  |
//! | 2      | X high (low nibble) |
//! | 3      | X low        |
//! | 4      | Y high (low nibble) |
//! | 5      | Y low        |
//!
//! Coordinates are mirrored on both axes to match the panel orientation.

use heapless::Vec;

use crate::elapsed_ms;
use crate::geometry::{distance, Point, HEIGHT, WIDTH};

/// Length of the register block read each poll
pub const PACKET_LEN: usize = 6;
/// First register of the block
pub const PACKET_REGISTER: u8 = 0x01;
/// Default 7-bit bus address of the controller
pub const DEFAULT_ADDRESS: u8 = 0x15;
/// Hold time at which a release becomes a long press
pub const LONG_PRESS_MS: u32 = 500;
/// Travel from the anchor needed to report a swipe
pub const SWIPE_THRESHOLD: f32 = 50.0;

/// Kind of touch sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchKind {
    Press,
    Release,
    Move,
    Tap,
    LongPress,
    SwipeUp,
    SwipeDown,
    SwipeLeft,
    SwipeRight,
}

impl TouchKind {
    /// snake_case name used in bus payloads
    pub const fn as_str(self) -> &'static str {
        match self {
            TouchKind::Press => "press",
            TouchKind::Release => "release",
            TouchKind::Move => "move",
            TouchKind::Tap => "tap",
            TouchKind::LongPress => "long_press",
            TouchKind::SwipeUp => "swipe_up",
            TouchKind::SwipeDown => "swipe_down",
            TouchKind::SwipeLeft => "swipe_left",
            TouchKind::SwipeRight => "swipe_right",
        }
    }

    pub const fn is_swipe(self) -> bool {
        matches!(
            self,
            TouchKind::SwipeUp | TouchKind::SwipeDown | TouchKind::SwipeLeft | TouchKind::SwipeRight
        )
    }
}

/// A classified touch event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchSample {
    pub x: i16,
    pub y: i16,
    pub kind: TouchKind,
    pub timestamp_ms: u32,
}

impl TouchSample {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Instantaneous pointer state after a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PointerState {
    pub pressed: bool,
    pub x: i16,
    pub y: i16,
}

/// Decode a register block into a panel point
///
/// Returns `None` when the touch count is zero, whatever the coordinate
/// bytes hold.
pub fn decode_packet(buf: &[u8; PACKET_LEN]) -> Option<Point> {
    if buf[1] == 0 {
        return None;
    }

    let raw_x = (((buf[2] & 0x0F) as i32) << 8) | buf[3] as i32;
    let raw_y = (((buf[4] & 0x0F) as i32) << 8) | buf[5] as i32;

    let x = (WIDTH as i32 - raw_x).clamp(0, WIDTH as i32 - 1);
    let y = (HEIGHT as i32 - raw_y).clamp(0, HEIGHT as i32 - 1);

    Some(Point::new(x as i16, y as i16))
}

/// Samples produced by one poll; a held move can also trigger a swipe
pub type TouchBatch = Vec<TouchSample, 2>;

/// Press/move/release tracker with edge-triggered swipe detection
#[derive(Debug, Clone)]
pub struct TouchTracker {
    pressed: bool,
    press_start_ms: u32,
    anchor: Point,
    last: Point,
}

impl Default for TouchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchTracker {
    pub const fn new() -> Self {
        Self {
            pressed: false,
            press_start_ms: 0,
            anchor: Point::new(0, 0),
            last: Point::new(0, 0),
        }
    }

    /// Current pointer state
    pub fn pointer(&self) -> PointerState {
        PointerState {
            pressed: self.pressed,
            x: self.last.x,
            y: self.last.y,
        }
    }

    /// Feed one decoded reading (`None` = released)
    pub fn update(&mut self, reading: Option<Point>, now_ms: u32) -> TouchBatch {
        let mut out = TouchBatch::new();

        match (self.pressed, reading) {
            (false, Some(p)) => {
                self.pressed = true;
                self.press_start_ms = now_ms;
                self.anchor = p;
                self.last = p;
                let _ = out.push(self.sample(TouchKind::Press, now_ms));
            }
            (true, Some(p)) => {
                self.last = p;
                let _ = out.push(self.sample(TouchKind::Move, now_ms));
                if let Some(kind) = self.detect_swipe(p) {
                    self.anchor = p;
                    let _ = out.push(self.sample(kind, now_ms));
                }
            }
            (true, None) => {
                self.pressed = false;
                let kind = if elapsed_ms(now_ms, self.press_start_ms) >= LONG_PRESS_MS {
                    TouchKind::LongPress
                } else {
                    TouchKind::Tap
                };
                let _ = out.push(self.sample(kind, now_ms));
            }
            (false, None) => {}
        }

        out
    }

    fn detect_swipe(&self, p: Point) -> Option<TouchKind> {
        if distance(self.anchor, p) <= SWIPE_THRESHOLD {
            return None;
        }

        let dx = p.x as i32 - self.anchor.x as i32;
        let dy = p.y as i32 - self.anchor.y as i32;

        let kind = if dx.abs() > dy.abs() {
            if dx > 0 {
                TouchKind::SwipeRight
            } else {
                TouchKind::SwipeLeft
            }
        } else if dy > 0 {
            TouchKind::SwipeDown
        } else {
            TouchKind::SwipeUp
        };
        Some(kind)
    }

    fn sample(&self, kind: TouchKind, now_ms: u32) -> TouchSample {
        TouchSample {
            x: self.last.x,
            y: self.last.y,
            kind,
            timestamp_ms: now_ms,
        }
    }
}
