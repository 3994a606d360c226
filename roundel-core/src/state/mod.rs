//! Shell navigation state machine
//!
//! Which screen owns the display is a pure function of the current state and
//! an event. Side effects (showing screens, launching apps) are performed by
//! the shell after it observes the transition.

pub mod events;
pub mod machine;

pub use events::NavEvent;
pub use machine::NavState;
