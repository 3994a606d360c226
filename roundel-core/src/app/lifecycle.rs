//! Per-application lifecycle states
//!
//! ```text
//! Stopped ──launch──► Running ──pause──► Paused
//!    ▲                  │  ▲               │
//!    └────terminate─────┘  └────resume─────┘
//!    ▲                                     │
//!    └──────────────terminate──────────────┘
//! ```

/// Lifecycle state of one application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Requested lifecycle change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleAction {
    Launch,
    Pause,
    Resume,
    Terminate,
}

impl AppState {
    /// Next state, or `None` if the action does not apply here
    pub fn apply(self, action: LifecycleAction) -> Option<Self> {
        use AppState::*;
        use LifecycleAction::*;

        match (self, action) {
            (Stopped, Launch) => Some(Running),
            (Running, Pause) => Some(Paused),
            (Paused, Resume) => Some(Running),
            (Running | Paused, Terminate) => Some(Stopped),
            _ => None,
        }
    }

    /// Only running apps get updates and input
    pub fn receives_input(&self) -> bool {
        matches!(self, AppState::Running)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            AppState::Stopped => "stopped",
            AppState::Running => "running",
            AppState::Paused => "paused",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let s = AppState::Stopped;
        let s = s.apply(LifecycleAction::Launch).unwrap();
        assert_eq!(s, AppState::Running);
        let s = s.apply(LifecycleAction::Pause).unwrap();
        assert_eq!(s, AppState::Paused);
        assert!(!s.receives_input());
        let s = s.apply(LifecycleAction::Resume).unwrap();
        assert!(s.receives_input());
        assert_eq!(s.apply(LifecycleAction::Terminate), Some(AppState::Stopped));
    }

    #[test]
    fn test_invalid_actions() {
        assert_eq!(AppState::Stopped.apply(LifecycleAction::Pause), None);
        assert_eq!(AppState::Stopped.apply(LifecycleAction::Terminate), None);
        assert_eq!(AppState::Running.apply(LifecycleAction::Resume), None);
        assert_eq!(AppState::Paused.apply(LifecycleAction::Pause), None);
        assert_eq!(AppState::Running.apply(LifecycleAction::Launch), None);
    }

    #[test]
    fn test_terminate_from_paused() {
        assert_eq!(
            AppState::Paused.apply(LifecycleAction::Terminate),
            Some(AppState::Stopped)
        );
    }
}
