//! Events that trigger navigation transitions

use crate::input::{ButtonKind, TouchKind};

/// Events that can move the shell between screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavEvent {
    // Gesture events
    /// Upward swipe on the panel
    SwipeUp,
    /// Downward swipe on the panel
    SwipeDown,

    // Button events
    /// Button released after a short press with no follow-up
    SinglePress,
    /// Two short presses inside the double-press window
    DoublePress,

    // Lifecycle outcomes
    /// The selected app was launched successfully
    AppLaunched,
    /// The active app was terminated, declined a back request or exited
    AppClosed,
}

impl NavEvent {
    /// Navigation event carried by a touch gesture, if any
    pub fn from_touch(kind: TouchKind) -> Option<Self> {
        match kind {
            TouchKind::SwipeUp => Some(NavEvent::SwipeUp),
            TouchKind::SwipeDown => Some(NavEvent::SwipeDown),
            _ => None,
        }
    }

    /// Navigation event carried by a button sample, if any
    pub fn from_button(kind: ButtonKind) -> Option<Self> {
        match kind {
            ButtonKind::SinglePress => Some(NavEvent::SinglePress),
            ButtonKind::DoublePress => Some(NavEvent::DoublePress),
            _ => None,
        }
    }
}
