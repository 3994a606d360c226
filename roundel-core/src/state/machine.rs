//! Navigation state definition

use super::events::NavEvent;

/// Shell screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavState {
    /// Watch face with the clock
    #[default]
    Home,
    /// Ring of installed apps
    Launcher,
    /// An app owns the display and receives input first
    AppRunning,
}

impl NavState {
    /// True when the clock is on screen and should be refreshed
    pub fn shows_clock(&self) -> bool {
        matches!(self, NavState::Home)
    }

    /// True when input goes to the active app before the shell
    pub fn app_has_focus(&self) -> bool {
        matches!(self, NavState::AppRunning)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: NavEvent) -> Self {
        use NavEvent::*;
        use NavState::*;

        match (self, event) {
            // Home transitions
            (Home, SwipeUp) => Launcher,
            (Home, DoublePress) => Launcher,
            (Home, AppLaunched) => AppRunning,

            // Launcher transitions
            (Launcher, SwipeDown) => Home,
            (Launcher, DoublePress) => Home,
            (Launcher, AppLaunched) => AppRunning,

            // AppRunning transitions (only reached when the app ignored the input)
            (AppRunning, SinglePress) => Home,
            (AppRunning, DoublePress) => Home,
            (AppRunning, AppClosed) => Home,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_launcher_round_trip() {
        let launcher = NavState::Home.transition(NavEvent::SwipeUp);
        assert_eq!(launcher, NavState::Launcher);
        assert_eq!(launcher.transition(NavEvent::SwipeDown), NavState::Home);
    }

    #[test]
    fn test_double_press_toggles() {
        assert_eq!(NavState::Home.transition(NavEvent::DoublePress), NavState::Launcher);
        assert_eq!(NavState::Launcher.transition(NavEvent::DoublePress), NavState::Home);
    }

    #[test]
    fn test_app_launch_from_either_screen() {
        for state in [NavState::Home, NavState::Launcher] {
            assert_eq!(state.transition(NavEvent::AppLaunched), NavState::AppRunning);
        }
    }

    #[test]
    fn test_leaving_app() {
        for event in [NavEvent::SinglePress, NavEvent::DoublePress, NavEvent::AppClosed] {
            assert_eq!(NavState::AppRunning.transition(event), NavState::Home);
        }
    }

    #[test]
    fn test_ignored_events() {
        assert_eq!(NavState::Home.transition(NavEvent::SwipeDown), NavState::Home);
        assert_eq!(NavState::Home.transition(NavEvent::SinglePress), NavState::Home);
        assert_eq!(NavState::Launcher.transition(NavEvent::SwipeUp), NavState::Launcher);
        assert_eq!(NavState::AppRunning.transition(NavEvent::SwipeUp), NavState::AppRunning);
        assert_eq!(NavState::AppRunning.transition(NavEvent::AppLaunched), NavState::AppRunning);
    }

    #[test]
    fn test_clock_only_on_home() {
        assert!(NavState::Home.shows_clock());
        assert!(!NavState::Launcher.shows_clock());
        assert!(!NavState::AppRunning.shows_clock());
    }
}
