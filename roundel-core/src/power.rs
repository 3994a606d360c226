//! Power state and idle-timeout policy
//!
//! The controller only decides state changes; applying them to the panel
//! and CPU is the power service's job.

use crate::elapsed_ms;

/// Default screen-off timeout
pub const DEFAULT_SCREEN_TIMEOUT_MS: u32 = 30_000;

/// System power state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    Active,
    ScreenOff,
    Suspended,
    Shutdown,
}

impl PowerState {
    /// Name used on the bus
    pub const fn as_str(self) -> &'static str {
        match self {
            PowerState::Active => "active",
            PowerState::ScreenOff => "screen_off",
            PowerState::Suspended => "suspended",
            PowerState::Shutdown => "shutdown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PowerState::Active),
            "screen_off" => Some(PowerState::ScreenOff),
            "suspended" => Some(PowerState::Suspended),
            "shutdown" => Some(PowerState::Shutdown),
            _ => None,
        }
    }
}

/// Idle tracking and power state bookkeeping
///
/// Every method that can change state returns the new state when it did,
/// so the caller applies it and announces it exactly once.
#[derive(Debug, Clone)]
pub struct PowerController {
    state: PowerState,
    /// Screen timeout, 0 disables the idle check
    screen_timeout_ms: u32,
    last_activity_ms: u32,
}

impl PowerController {
    pub fn new(screen_timeout_ms: u32, now_ms: u32) -> Self {
        Self {
            state: PowerState::Active,
            screen_timeout_ms,
            last_activity_ms: now_ms,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn screen_timeout_ms(&self) -> u32 {
        self.screen_timeout_ms
    }

    pub fn set_screen_timeout(&mut self, timeout_ms: u32) {
        self.screen_timeout_ms = timeout_ms;
    }

    /// Request a state; `None` if already in it
    pub fn request(&mut self, state: PowerState) -> Option<PowerState> {
        if self.state == state {
            return None;
        }
        self.state = state;
        Some(state)
    }

    /// Record user activity, waking the screen if it was off
    pub fn reset_idle_timer(&mut self, now_ms: u32) -> Option<PowerState> {
        self.last_activity_ms = now_ms;
        if self.state == PowerState::ScreenOff {
            return self.request(PowerState::Active);
        }
        None
    }

    /// Turn the screen off once the idle timeout has elapsed
    pub fn check_idle(&mut self, now_ms: u32) -> Option<PowerState> {
        if self.screen_timeout_ms == 0 || self.state != PowerState::Active {
            return None;
        }
        if elapsed_ms(now_ms, self.last_activity_ms) >= self.screen_timeout_ms {
            return self.request(PowerState::ScreenOff);
        }
        None
    }
}
