//! Button debounce and press classification
//!
//! Classification is two-phase: a short press cannot be called a single
//! press until the double-press window has passed without a second one, so
//! single presses are emitted late from [`ButtonDebouncer::poll_timeout`].
//!
//! ```text
//!   press ──► release ──┬── held >= long ──► LongPress (+ Release)
//!                       ├── waiting, gap < window ──► DoublePress (+ Release)
//!                       └── otherwise ──► start wait (+ Release)
//!                                             │
//!                           wait >= window ───┴──► SinglePress
//! ```

use heapless::Vec;

use crate::elapsed_ms;

/// Button event kind
///
/// The discriminants are the type codes reported over the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ButtonKind {
    SinglePress = 0,
    DoublePress = 1,
    LongPress = 2,
    Release = 3,
}

impl ButtonKind {
    /// snake_case name used in bus payloads
    pub const fn as_str(self) -> &'static str {
        match self {
            ButtonKind::SinglePress => "single_press",
            ButtonKind::DoublePress => "double_press",
            ButtonKind::LongPress => "long_press",
            ButtonKind::Release => "release",
        }
    }

    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// A classified button event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonSample {
    pub kind: ButtonKind,
    pub timestamp_ms: u32,
    /// How long the button was held, saturated at `u16::MAX`
    pub duration_ms: u16,
}

/// Timing thresholds for press classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ButtonTiming {
    /// Hold time that makes a press a long press
    pub long_press_ms: u32,
    /// Maximum gap between two releases for a double press
    pub double_press_ms: u32,
    /// Edges closer than this to the previous accepted edge are bounce
    pub debounce_ms: u32,
}

impl Default for ButtonTiming {
    fn default() -> Self {
        Self {
            long_press_ms: 500,
            double_press_ms: 300,
            debounce_ms: 20,
        }
    }
}

/// Events produced by one edge
pub type ButtonBatch = Vec<ButtonSample, 2>;

/// Debounce and press classification state machine
#[derive(Debug, Clone)]
pub struct ButtonDebouncer {
    timing: ButtonTiming,
    pressed: bool,
    press_start_ms: u32,
    last_edge_ms: Option<u32>,
    /// Release edge rejected as bounce while held; applied by
    /// [`ButtonDebouncer::settle`] if no press follows it
    bounced_release: Option<u32>,
    /// Release time and held duration of a press awaiting classification
    pending: Option<(u32, u16)>,
}

impl ButtonDebouncer {
    pub const fn new(timing: ButtonTiming) -> Self {
        Self {
            timing,
            pressed: false,
            press_start_ms: 0,
            last_edge_ms: None,
            bounced_release: None,
            pending: None,
        }
    }

    pub fn timing(&self) -> &ButtonTiming {
        &self.timing
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// True while a short press waits to be called single or double
    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Press edge
    ///
    /// Returns `false` if the edge was discarded as bounce or a duplicate.
    pub fn on_press(&mut self, now_ms: u32) -> bool {
        if self.pressed {
            if self.is_bounce(now_ms) {
                // The line went back down before the release settled
                self.bounced_release = None;
            }
            return false;
        }
        if self.is_bounce(now_ms) {
            return false;
        }
        self.pressed = true;
        self.press_start_ms = now_ms;
        self.last_edge_ms = Some(now_ms);
        true
    }

    /// Release edge
    pub fn on_release(&mut self, now_ms: u32) -> ButtonBatch {
        if !self.pressed {
            return ButtonBatch::new();
        }
        if self.is_bounce(now_ms) {
            self.bounced_release = Some(now_ms);
            return ButtonBatch::new();
        }
        self.release_at(now_ms)
    }

    /// Apply a release that was rejected as bounce once the debounce window
    /// has passed without a press edge undoing it
    ///
    /// Call before handing the next edge to [`on_press`](Self::on_press) or
    /// [`on_release`](Self::on_release).
    pub fn settle(&mut self, now_ms: u32) -> ButtonBatch {
        match self.bounced_release {
            Some(released_at) if self.pressed && !self.is_bounce(now_ms) => {
                self.bounced_release = None;
                self.release_at(released_at)
            }
            _ => ButtonBatch::new(),
        }
    }

    fn release_at(&mut self, now_ms: u32) -> ButtonBatch {
        let mut out = ButtonBatch::new();
        self.pressed = false;
        self.bounced_release = None;
        self.last_edge_ms = Some(now_ms);

        let held = elapsed_ms(now_ms, self.press_start_ms);
        let duration_ms = held.min(u16::MAX as u32) as u16;
        let sample = |kind| ButtonSample {
            kind,
            timestamp_ms: now_ms,
            duration_ms,
        };

        if held >= self.timing.long_press_ms {
            self.pending = None;
            let _ = out.push(sample(ButtonKind::LongPress));
        } else {
            match self.pending {
                Some((first_release, _))
                    if elapsed_ms(now_ms, first_release) < self.timing.double_press_ms =>
                {
                    self.pending = None;
                    let _ = out.push(sample(ButtonKind::DoublePress));
                }
                _ => self.pending = Some((now_ms, duration_ms)),
            }
        }

        let _ = out.push(sample(ButtonKind::Release));
        out
    }

    /// Emit the deferred single press once the double-press window expires
    pub fn poll_timeout(&mut self, now_ms: u32) -> Option<ButtonSample> {
        let (released_at, duration_ms) = self.pending?;
        if elapsed_ms(now_ms, released_at) < self.timing.double_press_ms {
            return None;
        }
        self.pending = None;
        Some(ButtonSample {
            kind: ButtonKind::SinglePress,
            timestamp_ms: released_at,
            duration_ms,
        })
    }

    fn is_bounce(&self, now_ms: u32) -> bool {
        matches!(self.last_edge_ms, Some(t) if elapsed_ms(now_ms, t) < self.timing.debounce_ms)
    }
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new(ButtonTiming::default())
    }
}
