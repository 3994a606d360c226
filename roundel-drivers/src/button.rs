//! Physical button driver
//!
//! Waits on the key source with a bounded timeout so the pending
//! double-press decision is serviced even when no edge arrives.

use heapless::Vec;
use log::{trace, warn};

use roundel_core::input::{ButtonDebouncer, ButtonSample, ButtonTiming};
use roundel_hal::{KeyEdge, KeyEventSource};

use crate::clock::Clock;

/// Longest single wait on the key source
pub const WAIT_TIMEOUT_MS: u16 = 100;

/// Samples from one step: a settled release, the edge's classification and
/// release, and a deferred single press
pub type ButtonStep = Vec<ButtonSample, 5>;

/// Button state machine over a key source
pub struct ButtonChannel<K> {
    source: K,
    debouncer: ButtonDebouncer,
}

impl<K: KeyEventSource> ButtonChannel<K> {
    pub fn new(source: K, timing: ButtonTiming) -> Self {
        Self {
            source,
            debouncer: ButtonDebouncer::new(timing),
        }
    }

    /// Wait for at most one edge, then check the double-press timeout
    ///
    /// Source errors are logged and treated as "no edge".
    pub fn step(&mut self, clock: &impl Clock) -> ButtonStep {
        let edge = match self.source.wait_edge(WAIT_TIMEOUT_MS) {
            Ok(edge) => edge,
            Err(e) => {
                warn!("button read failed: {:?}", e);
                None
            }
        };
        let now = clock.now_ms();
        self.handle(edge, now)
    }

    /// Apply an edge observed at `now_ms`
    pub fn handle(&mut self, edge: Option<KeyEdge>, now_ms: u32) -> ButtonStep {
        let mut out = ButtonStep::new();
        out.extend(self.debouncer.settle(now_ms));

        match edge {
            Some(KeyEdge::Pressed) => {
                if !self.debouncer.on_press(now_ms) {
                    trace!("press edge discarded at {}", now_ms);
                }
            }
            Some(KeyEdge::Released) => {
                out.extend(self.debouncer.on_release(now_ms));
            }
            None => {}
        }

        if let Some(single) = self.debouncer.poll_timeout(now_ms) {
            let _ = out.push(single);
        }
        out
    }
}
