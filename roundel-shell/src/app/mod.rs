//! Application supervision
//!
//! - [`EmbeddedApp`] - hooks an in-process app implements
//! - [`AppRegistry`] - factories for embedded apps, built once in `main`
//! - [`ExternalProcess`] - a supervised child process
//! - [`AppLifecycleManager`] - launches, pauses, resumes, terminates and
//!   reaps apps, and routes input to the active one

pub mod embedded;
pub mod manager;
pub mod process;
pub mod registry;

pub use embedded::{EmbeddedApp, InitError};
pub use manager::{AppLifecycleManager, LaunchError};
pub use process::ExternalProcess;
pub use registry::{AppFactory, AppRegistry, RegistryError};
