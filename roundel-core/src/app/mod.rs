//! Application model
//!
//! Manifest validation and the per-application lifecycle state machine.
//! Launching, supervising and dispatching to apps lives in the shell crate.

pub mod lifecycle;
pub mod manifest;

pub use lifecycle::{AppState, LifecycleAction};
pub use manifest::{
    AppManifest, ExecutionMode, ManifestError, ManifestField, ManifestWarning, Permission,
    RawManifest,
};
