//! Application lifecycle manager
//!
//! Tracks every launched app with its [`AppState`] and execution, and
//! decides which single app is active (receives input and updates).
//!
//! ```text
//! launch ──► manifest ──► Embedded: factory, init(container), show
//!                    └──► External: spawn interpreter + entry
//!
//! update ──► reap exited children ──► active.update(delta)
//! ```
//!
//! Everything here runs on the shell's main loop.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use log::{debug, info, warn};

use roundel_core::app::{AppState, ExecutionMode, LifecycleAction};
use roundel_core::input::{ButtonSample, TouchSample};

use super::embedded::{EmbeddedApp, InitError};
use super::process::ExternalProcess;
use super::registry::AppRegistry;
use crate::manifest::{InstalledApp, ManifestLoadError, ManifestStore};
use crate::toolkit::ContainerId;

/// Lifecycle operation failures
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error(transparent)]
    Manifest(#[from] ManifestLoadError),

    #[error("no embedded app factory '{0}'")]
    NoFactory(String),

    #[error("app '{id}' failed to initialize: {source}")]
    Init {
        id: String,
        #[source]
        source: InitError,
    },

    #[error("failed to start '{id}': {source}")]
    Spawn {
        id: String,
        #[source]
        source: io::Error,
    },

    #[error("app '{0}' is not running")]
    NotRunning(String),

    #[error("cannot launch '{0}' while another app has focus")]
    Busy(String),

    #[error("app '{id}' cannot {action:?} while {state}")]
    InvalidTransition {
        id: String,
        action: LifecycleAction,
        state: &'static str,
    },

    #[error("signalling '{id}' failed: {source}")]
    Signal {
        id: String,
        #[source]
        source: nix::Error,
    },
}

enum Execution {
    Embedded(Box<dyn EmbeddedApp>),
    External(ExternalProcess),
}

struct ManagedApp {
    app: InstalledApp,
    state: AppState,
    execution: Execution,
    container: ContainerId,
    launched_at: Instant,
}

impl ManagedApp {
    fn change(&mut self, action: LifecycleAction) -> Result<AppState, LaunchError> {
        self.state
            .apply(action)
            .ok_or_else(|| LaunchError::InvalidTransition {
                id: self.app.id().to_string(),
                action,
                state: self.state.as_str(),
            })
    }

    fn pause(&mut self) -> Result<(), LaunchError> {
        let next = self.change(LifecycleAction::Pause)?;
        match &mut self.execution {
            Execution::Embedded(app) => app.pause(),
            Execution::External(process) => process.stop().map_err(|source| LaunchError::Signal {
                id: self.app.id().to_string(),
                source,
            })?,
        }
        self.state = next;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), LaunchError> {
        let next = self.change(LifecycleAction::Resume)?;
        match &mut self.execution {
            Execution::Embedded(app) => app.resume(),
            Execution::External(process) => process.cont().map_err(|source| LaunchError::Signal {
                id: self.app.id().to_string(),
                source,
            })?,
        }
        self.state = next;
        Ok(())
    }
}

/// Launches and supervises apps; at most one is active
pub struct AppLifecycleManager<S> {
    registry: AppRegistry,
    store: S,
    interpreter: PathBuf,
    apps: BTreeMap<String, ManagedApp>,
    active: Option<String>,
    /// Terminated children that have not been reaped yet
    exiting: Vec<ExternalProcess>,
}

impl<S: ManifestStore> AppLifecycleManager<S> {
    pub fn new(registry: AppRegistry, store: S, interpreter: impl Into<PathBuf>) -> Self {
        let interpreter = interpreter.into();
        info!(
            "App manager: {} embedded factories, interpreter {}",
            registry.len(),
            interpreter.display()
        );
        Self {
            registry,
            store,
            interpreter,
            apps: BTreeMap::new(),
            active: None,
            exiting: Vec::new(),
        }
    }

    /// Launch `id` into `container`, or bring it to front if already tracked
    ///
    /// Returns the container the app is bound to, which is the app's
    /// original container when it was already running.
    pub fn launch(&mut self, id: &str, container: ContainerId) -> Result<ContainerId, LaunchError> {
        if let Some(managed) = self.apps.get_mut(id) {
            debug!("{} already running, bringing to front", id);
            if managed.state == AppState::Paused {
                managed.resume()?;
            }
            if let Execution::Embedded(app) = &mut managed.execution {
                app.show();
            }
            let bound = managed.container;
            self.activate(id);
            return Ok(bound);
        }

        let app = self.store.manifest(id)?;
        let execution = match app.manifest.mode {
            ExecutionMode::Embedded => {
                let key = app.manifest.entry.as_str();
                let mut instance = self
                    .registry
                    .create(key, &app.manifest)
                    .ok_or_else(|| LaunchError::NoFactory(key.to_string()))?;
                instance.init(container).map_err(|source| LaunchError::Init {
                    id: id.to_string(),
                    source,
                })?;
                instance.show();
                Execution::Embedded(instance)
            }
            ExecutionMode::External => {
                let process = ExternalProcess::spawn(&self.interpreter, &app.entry_path()).map_err(|source| {
                    LaunchError::Spawn {
                        id: id.to_string(),
                        source,
                    }
                })?;
                Execution::External(process)
            }
        };

        info!("Launched {} ({})", id, app.manifest.mode.as_str());
        self.apps.insert(
            id.to_string(),
            ManagedApp {
                app,
                state: AppState::Running,
                execution,
                container,
                launched_at: Instant::now(),
            },
        );
        self.activate(id);
        Ok(container)
    }

    /// Make `id` active, pausing the previously active app
    fn activate(&mut self, id: &str) {
        if let Some(previous) = self.active.take() {
            if previous != id {
                if let Some(managed) = self.apps.get_mut(&previous) {
                    if managed.state == AppState::Running {
                        if let Err(e) = managed.pause() {
                            warn!("Could not pause {}: {}", previous, e);
                        }
                    }
                }
            }
        }
        self.active = Some(id.to_string());
    }

    pub fn pause(&mut self, id: &str) -> Result<(), LaunchError> {
        self.tracked_mut(id)?.pause()?;
        info!("Paused {}", id);
        Ok(())
    }

    pub fn resume(&mut self, id: &str) -> Result<(), LaunchError> {
        self.tracked_mut(id)?.resume()?;
        info!("Resumed {}", id);
        Ok(())
    }

    /// Stop `id` and forget it
    ///
    /// External apps get SIGTERM and one non-blocking reap; a child that
    /// has not exited yet stays tracked until a later [`update`](Self::update)
    /// collects it.
    pub fn terminate(&mut self, id: &str) -> Result<(), LaunchError> {
        let managed = self
            .apps
            .remove(id)
            .ok_or_else(|| LaunchError::NotRunning(id.to_string()))?;

        match managed.execution {
            Execution::Embedded(mut app) => {
                app.hide();
                app.cleanup();
            }
            Execution::External(mut process) => {
                if !process.terminate() {
                    debug!("{} (pid {}) still exiting", id, process.pid());
                    self.exiting.push(process);
                }
            }
        }

        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        info!("Terminated {}", id);
        Ok(())
    }

    /// Per-tick work: reap exited children, then update the active app
    pub fn update(&mut self, delta_ms: u32) {
        self.reap();
        if let Some(ManagedApp {
            execution: Execution::Embedded(app),
            ..
        }) = self.active_running_mut()
        {
            app.update(delta_ms);
        }
    }

    fn reap(&mut self) {
        let exited: Vec<String> = self
            .apps
            .iter_mut()
            .filter_map(|(id, managed)| match &mut managed.execution {
                Execution::External(process) => process.try_reap().then(|| id.clone()),
                Execution::Embedded(_) => None,
            })
            .collect();

        for id in exited {
            self.apps.remove(&id);
            if self.active.as_deref() == Some(id.as_str()) {
                self.active = None;
            }
            info!("{} exited", id);
        }

        self.exiting.retain_mut(|process| !process.try_reap());
    }

    fn tracked_mut(&mut self, id: &str) -> Result<&mut ManagedApp, LaunchError> {
        self.apps
            .get_mut(id)
            .ok_or_else(|| LaunchError::NotRunning(id.to_string()))
    }

    fn active_running_mut(&mut self) -> Option<&mut ManagedApp> {
        let id = self.active.as_deref()?;
        self.apps.get_mut(id).filter(|m| m.state.receives_input())
    }

    /// Offer a touch to the active app; true if consumed
    pub fn dispatch_touch(&mut self, sample: &TouchSample) -> bool {
        match self.active_running_mut() {
            Some(ManagedApp {
                execution: Execution::Embedded(app),
                ..
            }) => app.on_touch(sample),
            _ => false,
        }
    }

    /// Offer a button event to the active app; true if consumed
    pub fn dispatch_button(&mut self, sample: &ButtonSample) -> bool {
        match self.active_running_mut() {
            Some(ManagedApp {
                execution: Execution::Embedded(app),
                ..
            }) => app.on_button(sample),
            _ => false,
        }
    }

    /// Ask the active app about a back gesture; true if it stays
    pub fn back(&mut self) -> bool {
        match self.active_running_mut() {
            Some(ManagedApp {
                execution: Execution::Embedded(app),
                ..
            }) => app.on_back(),
            _ => false,
        }
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// State of `id`; untracked apps are stopped
    pub fn state(&self, id: &str) -> AppState {
        self.apps.get(id).map_or(AppState::Stopped, |m| m.state)
    }

    pub fn is_tracked(&self, id: &str) -> bool {
        self.apps.contains_key(id)
    }

    /// Ids of every tracked app, running or paused
    pub fn running_apps(&self) -> Vec<&str> {
        self.apps.keys().map(String::as_str).collect()
    }

    pub fn container_of(&self, id: &str) -> Option<ContainerId> {
        self.apps.get(id).map(|m| m.container)
    }

    pub fn launched_at(&self, id: &str) -> Option<Instant> {
        self.apps.get(id).map(|m| m.launched_at)
    }

    /// Process id of an external app
    pub fn pid_of(&self, id: &str) -> Option<u32> {
        match &self.apps.get(id)?.execution {
            Execution::External(process) => Some(process.pid()),
            Execution::Embedded(_) => None,
        }
    }

    /// Terminated children still waiting to be reaped
    pub fn pending_exits(&self) -> usize {
        self.exiting.len()
    }

    /// Terminate every tracked app
    pub fn shutdown(&mut self) {
        let ids: Vec<String> = self.apps.keys().cloned().collect();
        for id in ids {
            if let Err(e) = self.terminate(&id) {
                warn!("Terminating {}: {}", id, e);
            }
        }
        self.exiting.retain_mut(|process| !process.try_reap());
        if !self.exiting.is_empty() {
            warn!("{} app process(es) still exiting", self.exiting.len());
        }
    }
}

impl<S> Drop for AppLifecycleManager<S> {
    fn drop(&mut self) {
        for (id, managed) in self.apps.iter_mut() {
            match &mut managed.execution {
                Execution::Embedded(app) => app.cleanup(),
                Execution::External(process) => {
                    if !process.terminate() {
                        debug!("{} left running at exit", id);
                    }
                }
            }
        }
    }
}
