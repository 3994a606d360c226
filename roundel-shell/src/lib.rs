//! Round-display wearable shell
//!
//! ```text
//!  touch poller ──► TouchQueue ──┐
//!                                ├─► ShellRuntime ──► ShellCoordinator ──► Toolkit
//!  button poller ─► ButtonQueue ─┘        │                 │
//!                                         │                 ▼
//!                                    watchdog        AppLifecycleManager
//!                                                     │              │
//!                                              EmbeddedApp    ExternalProcess
//! ```
//!
//! Everything right of the queues runs on the single main-loop thread.

pub mod app;
pub mod config;
pub mod coordinator;
pub mod manifest;
pub mod runtime;
pub mod toolkit;

pub use app::{AppLifecycleManager, AppRegistry, EmbeddedApp, ExternalProcess, LaunchError};
pub use config::{ConfigError, ShellConfig};
pub use coordinator::ShellCoordinator;
pub use manifest::{scan_apps, DirectoryStore, InstalledApp, ManifestLoadError, ManifestStore, MemoryStore};
pub use runtime::{LoopTiming, ShellRuntime};
pub use toolkit::{CanvasToolkit, ContainerId, Layer, Toolkit};
