//! Roundel Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the shell needs from a board:
//! a mapped scanout buffer for the round panel, an optional backlight and a
//! source of key edges for the physical button. Board crates implement them;
//! the drivers in `roundel-drivers` are written only against these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  roundel-shell / roundel-services       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  roundel-drivers                        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  roundel-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ roundel-hal-  │       │  test fakes   │
//! │    linux      │       │  (in-memory)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! The touch controller is not abstracted here: it sits on an I2C bus and the
//! touch driver takes any `embedded_hal::i2c::I2c` directly.
//!
//! # Traits
//!
//! - [`scanout::Scanout`] - Mapped pixel buffer and panel power
//! - [`backlight::Backlight`] - Panel brightness
//! - [`input::KeyEventSource`] - Physical key press/release edges

#![no_std]
#![deny(unsafe_code)]

pub mod backlight;
pub mod input;
pub mod scanout;

// Re-export key traits at crate root for convenience
pub use backlight::{Backlight, NoBacklight};
pub use input::{KeyEdge, KeyEventSource};
pub use scanout::{PixelFormat, Scanout, ScanoutGeometry};
