//! In-process application hooks

use roundel_core::input::{ButtonSample, TouchSample};

use crate::toolkit::ContainerId;

/// An embedded app could not set itself up
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InitError(pub String);

/// Hooks called by the lifecycle manager on the main loop
///
/// Input and update hooks are only called while the app is running and
/// active.
pub trait EmbeddedApp {
    /// Build the app's UI inside `container`
    fn init(&mut self, container: ContainerId) -> Result<(), InitError>;

    fn show(&mut self);
    fn hide(&mut self);

    fn pause(&mut self) {
        self.hide();
    }

    fn resume(&mut self) {
        self.show();
    }

    /// Called once per shell tick with the time since the previous tick
    fn update(&mut self, _delta_ms: u32) {}

    /// Return true if the app consumed the touch
    fn on_touch(&mut self, _sample: &TouchSample) -> bool {
        false
    }

    /// Return true if the app consumed the button event
    fn on_button(&mut self, _sample: &ButtonSample) -> bool {
        false
    }

    /// Back gesture; return true to stay in the app
    fn on_back(&mut self) -> bool {
        false
    }

    fn cleanup(&mut self);
}
