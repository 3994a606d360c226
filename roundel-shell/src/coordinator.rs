//! Shell coordinator
//!
//! Owns the navigation state and routes input:
//!
//! ```text
//!                  ┌──────── swipe up / double press ────────┐
//!                  │                                         ▼
//!               ┌──────┐                                ┌──────────┐
//!   start ────► │ Home │ ◄─ swipe down / double press ─ │ Launcher │
//!               └──────┘                                └──────────┘
//!                  ▲  │ app selected                         │ tap on icon
//!                  │  ▼                                      ▼
//!                  │ ┌────────────┐ ◄────── app selected ────┘
//!                  └─│ AppRunning │
//!     single/double  └────────────┘
//!     press, back declined, app exited
//! ```
//!
//! While an app runs it sees every touch and button event first; only what
//! it leaves unconsumed reaches the table above.

use log::{debug, info, warn};

use roundel_core::geometry::Point;
use roundel_core::input::{ButtonSample, TouchKind, TouchSample};
use roundel_core::layout::{circular_positions, hit_test, ICON_SIZE, LAUNCHER_RING_RADIUS, MAX_RING_ITEMS};
use roundel_core::state::{NavEvent, NavState};

use crate::app::{AppLifecycleManager, LaunchError};
use crate::manifest::{InstalledApp, ManifestStore};
use crate::toolkit::{ContainerId, Layer, LauncherEntry, Toolkit};

pub struct ShellCoordinator<T, S> {
    state: NavState,
    toolkit: T,
    apps: AppLifecycleManager<S>,
    catalog: Vec<InstalledApp>,
    positions: Vec<Point>,
    app_container: Option<ContainerId>,
}

impl<T: Toolkit, S: ManifestStore> ShellCoordinator<T, S> {
    /// Start on the home screen with `catalog` in the launcher ring
    pub fn new(mut toolkit: T, apps: AppLifecycleManager<S>, mut catalog: Vec<InstalledApp>) -> Self {
        if catalog.len() > MAX_RING_ITEMS {
            warn!(
                "{} apps installed, launcher shows the first {}",
                catalog.len(),
                MAX_RING_ITEMS
            );
            catalog.truncate(MAX_RING_ITEMS);
        }

        let positions: Vec<Point> = circular_positions(catalog.len(), LAUNCHER_RING_RADIUS, 0.0)
            .iter()
            .copied()
            .collect();
        toolkit.set_launcher_entries(
            catalog
                .iter()
                .zip(&positions)
                .map(|(app, position)| LauncherEntry {
                    name: app.name().to_string(),
                    position: *position,
                })
                .collect(),
        );
        toolkit.set_visible(Layer::Launcher, false);
        toolkit.set_visible(Layer::Home, true);
        toolkit.refresh_clock();

        info!("Shell ready with {} launcher entries", catalog.len());
        Self {
            state: NavState::Home,
            toolkit,
            apps,
            catalog,
            positions,
            app_container: None,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    pub fn toolkit_mut(&mut self) -> &mut T {
        &mut self.toolkit
    }

    pub fn apps(&self) -> &AppLifecycleManager<S> {
        &self.apps
    }

    pub fn apps_mut(&mut self) -> &mut AppLifecycleManager<S> {
        &mut self.apps
    }

    /// Launcher icon centres, in catalog order
    pub fn icon_positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn handle_touch(&mut self, sample: &TouchSample) {
        if self.state.app_has_focus() {
            if self.apps.dispatch_touch(sample) {
                return;
            }
            if sample.kind == TouchKind::SwipeDown {
                if self.apps.back() {
                    debug!("App handled back");
                } else {
                    self.apply(NavEvent::AppClosed);
                }
                return;
            }
        }

        if self.state == NavState::Launcher && sample.kind == TouchKind::Tap {
            if let Some(index) = hit_test(&self.positions, sample.point(), ICON_SIZE) {
                let id = self.catalog[index].id().to_string();
                if let Err(e) = self.launch(&id) {
                    warn!("Launch of {} failed: {}", id, e);
                }
                return;
            }
        }

        if let Some(event) = NavEvent::from_touch(sample.kind) {
            self.apply(event);
        }
    }

    pub fn handle_button(&mut self, sample: &ButtonSample) {
        if self.state.app_has_focus() && self.apps.dispatch_button(sample) {
            return;
        }

        if let Some(event) = NavEvent::from_button(sample.kind) {
            self.apply(event);
        }
    }

    /// Launch an app from Home or the launcher and give it the screen
    ///
    /// On failure the navigation state is unchanged.
    pub fn launch(&mut self, id: &str) -> Result<(), LaunchError> {
        if self.state.app_has_focus() {
            return Err(LaunchError::Busy(id.to_string()));
        }

        let existing = self.apps.container_of(id);
        let container = match existing {
            Some(container) => container,
            None => {
                let title = self
                    .catalog
                    .iter()
                    .find(|app| app.id() == id)
                    .map_or(id, InstalledApp::name);
                self.toolkit.create_container(title)
            }
        };

        match self.apps.launch(id, container) {
            Ok(bound) => {
                if bound != container {
                    self.toolkit.destroy_container(container);
                }
                self.toolkit.set_visible(Layer::Home, false);
                self.toolkit.set_visible(Layer::Launcher, false);
                self.toolkit.set_visible(Layer::App(bound), true);
                self.app_container = Some(bound);
                self.enter(self.state.transition(NavEvent::AppLaunched), NavEvent::AppLaunched);
                Ok(())
            }
            Err(e) => {
                if existing.is_none() {
                    self.toolkit.destroy_container(container);
                }
                Err(e)
            }
        }
    }

    /// Per-tick work; returns to Home if the active app has gone away
    pub fn tick(&mut self, delta_ms: u32) {
        self.apps.update(delta_ms);
        if self.state.app_has_focus() && self.apps.active_id().is_none() {
            info!("Active app is gone");
            self.apply(NavEvent::AppClosed);
        }
    }

    /// Update the clock if it is on screen
    pub fn refresh_clock(&mut self) {
        if self.state.shows_clock() {
            self.toolkit.refresh_clock();
        }
    }

    /// Terminate every app
    pub fn shutdown(&mut self) {
        self.close_active_app();
        self.apps.shutdown();
    }

    fn apply(&mut self, event: NavEvent) {
        let next = self.state.transition(event);
        if next == self.state {
            return;
        }

        if self.state == NavState::AppRunning {
            self.close_active_app();
        }
        match next {
            NavState::Home => {
                self.toolkit.set_visible(Layer::Launcher, false);
                self.toolkit.set_visible(Layer::Home, true);
                self.toolkit.refresh_clock();
            }
            NavState::Launcher => {
                self.toolkit.set_visible(Layer::Home, false);
                self.toolkit.set_visible(Layer::Launcher, true);
            }
            NavState::AppRunning => {}
        }
        self.enter(next, event);
    }

    fn enter(&mut self, next: NavState, event: NavEvent) {
        info!("{:?} -> {:?} ({:?})", self.state, next, event);
        self.state = next;
    }

    fn close_active_app(&mut self) {
        if let Some(id) = self.apps.active_id().map(str::to_string) {
            if let Err(e) = self.apps.terminate(&id) {
                warn!("Terminating {}: {}", id, e);
            }
        }
        if let Some(container) = self.app_container.take() {
            self.toolkit.set_visible(Layer::App(container), false);
            self.toolkit.destroy_container(container);
        }
    }
}
