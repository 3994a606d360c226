//! Input decoding and classification
//!
//! Raw touch packets and key edges go in; classified samples come out.

pub mod button;
pub mod touch;

pub use button::{ButtonDebouncer, ButtonKind, ButtonSample, ButtonTiming};
pub use touch::{decode_packet, PointerState, TouchKind, TouchSample, TouchTracker};
