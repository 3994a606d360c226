//! Hardware drivers for the round-display shell
//!
//! Each driver is written against the `roundel-hal` traits (or
//! `embedded_hal::i2c::I2c` for the touch controller) and turns raw hardware
//! activity into `roundel-core` samples:
//!
//! - [`display::FrameBufferDisplay`] - pitch-aware blits into the scanout
//! - [`touch::TouchChannel`] - touch controller polling and gestures
//! - [`button::ButtonChannel`] - key edges to single/double/long presses
//!
//! Touch and button run on their own polling threads ([`poller::Poller`])
//! and hand samples to the main loop through bounded queues
//! ([`channels`]).

pub mod button;
pub mod channels;
pub mod clock;
pub mod display;
pub mod pointer;
pub mod poller;
pub mod settings;
pub mod touch;

pub use button::ButtonChannel;
pub use channels::{ButtonQueue, TouchQueue, QUEUE_DEPTH};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use display::{DisplayError, DisplaySurface, FlushTarget, FrameBufferDisplay, MemoryScanout};
pub use pointer::SharedPointer;
pub use poller::Poller;
pub use settings::{load_or_default, ButtonSettings, ConfigError, TouchSettings};
pub use touch::{TouchChannel, TouchPoll};
