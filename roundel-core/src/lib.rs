//! Board-agnostic core logic for the round-display shell
//!
//! This crate contains all shell logic that does not depend on an operating
//! system or specific hardware:
//!
//! - Panel geometry and circular layout math
//! - Touch packet decoding and gesture detection
//! - Button debounce and press classification
//! - Navigation state machine (home, launcher, running app)
//! - Application manifest model, validation and lifecycle states
//! - Power state and idle-timeout policy
//!
//! Time is always passed in as a wrapping millisecond counter (`now_ms`), so
//! every state machine here can be driven deterministically from tests.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod app;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod power;
pub mod state;

/// Milliseconds elapsed from `since` to `now` on a wrapping u32 clock
#[inline]
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}
