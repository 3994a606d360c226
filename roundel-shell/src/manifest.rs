//! Manifest files on disk
//!
//! ```text
//! <apps_dir>/
//!   com.example.timer/
//!     manifest.toml
//!     main.py
//! ```
//!
//! `manifest.toml` holds `id`, `name`, `version`, `description`, `icon`,
//! `mode` (`embedded` or `external`), `entry` and `permissions`. Field
//! validation is done by `roundel_core::app::AppManifest`.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;

use roundel_core::app::{AppManifest, ExecutionMode, ManifestError, ManifestWarning, RawManifest};

pub const MANIFEST_FILE: &str = "manifest.toml";

/// Errors loading one manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid manifest {path}: {error}")]
    Invalid { path: PathBuf, error: ManifestError },

    #[error("no installed app with id '{0}'")]
    UnknownApp(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestFile {
    id: String,
    name: String,
    version: String,
    description: String,
    icon: String,
    mode: String,
    entry: String,
    permissions: Vec<String>,
}

/// A validated manifest and the directory it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledApp {
    pub manifest: AppManifest,
    pub dir: PathBuf,
}

impl InstalledApp {
    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// Entry point for external apps, relative paths resolved against the
    /// app directory
    pub fn entry_path(&self) -> PathBuf {
        let entry = Path::new(self.manifest.entry.as_str());
        if entry.is_absolute() {
            entry.to_path_buf()
        } else {
            self.dir.join(entry)
        }
    }

    pub fn is_external(&self) -> bool {
        self.manifest.mode == ExecutionMode::External
    }
}

/// Parse and validate manifest text
pub fn parse_manifest(text: &str, path: &Path) -> Result<AppManifest, ManifestLoadError> {
    let file: ManifestFile = toml::from_str(text).map_err(|source| ManifestLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let permissions: Vec<&str> = file.permissions.iter().map(String::as_str).collect();
    let raw = RawManifest {
        id: &file.id,
        name: &file.name,
        version: &file.version,
        description: &file.description,
        icon: &file.icon,
        mode: &file.mode,
        entry: &file.entry,
        permissions: &permissions,
    };

    let manifest = AppManifest::validate(&raw).map_err(|error| ManifestLoadError::Invalid {
        path: path.to_path_buf(),
        error,
    })?;

    for warning in manifest.warnings() {
        match warning {
            ManifestWarning::EmptyDescription => warn!("{}: empty description", path.display()),
            ManifestWarning::EmptyIcon => warn!("{}: empty icon", path.display()),
            ManifestWarning::Truncated(field) => {
                warn!("{}: {} truncated to fit", path.display(), field.as_str())
            }
        }
    }
    Ok(manifest)
}

/// Load `<dir>/manifest.toml`
pub fn load_manifest(dir: &Path) -> Result<InstalledApp, ManifestLoadError> {
    let path = dir.join(MANIFEST_FILE);
    let text = fs::read_to_string(&path).map_err(|source| ManifestLoadError::Read {
        path: path.clone(),
        source,
    })?;
    let manifest = parse_manifest(&text, &path)?;
    Ok(InstalledApp {
        manifest,
        dir: dir.to_path_buf(),
    })
}

/// Every valid app under `apps_dir`, sorted by id
///
/// Invalid manifests are logged and skipped. A missing directory yields an
/// empty list.
pub fn scan_apps(apps_dir: &Path) -> Vec<InstalledApp> {
    let entries = match fs::read_dir(apps_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read apps directory {}: {}", apps_dir.display(), e);
            return Vec::new();
        }
    };

    let mut apps = Vec::new();
    for entry in entries.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        if !dir.join(MANIFEST_FILE).is_file() {
            debug!("{} has no {}, skipping", dir.display(), MANIFEST_FILE);
            continue;
        }
        match load_manifest(&dir) {
            Ok(app) => apps.push(app),
            Err(e) => warn!("Skipping app: {}", e),
        }
    }

    apps.sort_by(|a, b| a.id().cmp(b.id()));
    apps.dedup_by(|b, a| {
        let dup = a.id() == b.id();
        if dup {
            warn!("Duplicate app id '{}' in {}, ignored", b.id(), b.dir.display());
        }
        dup
    });
    info!("Found {} installed app(s) in {}", apps.len(), apps_dir.display());
    apps
}

/// Where the lifecycle manager looks up manifests by id
pub trait ManifestStore {
    fn manifest(&self, id: &str) -> Result<InstalledApp, ManifestLoadError>;
}

/// Re-reads an app's manifest on every lookup
///
/// Apps found by [`scan_apps`] are looked up in the directory they were
/// scanned from, whatever that directory is called. Anything else is
/// expected at `<apps_dir>/<id>/manifest.toml`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    apps_dir: PathBuf,
    dirs: HashMap<String, PathBuf>,
}

impl DirectoryStore {
    pub fn new(apps_dir: impl Into<PathBuf>) -> Self {
        Self {
            apps_dir: apps_dir.into(),
            dirs: HashMap::new(),
        }
    }

    /// Store that knows where each scanned app lives
    pub fn from_scan(apps_dir: impl Into<PathBuf>, apps: &[InstalledApp]) -> Self {
        let mut store = Self::new(apps_dir);
        store.dirs = apps.iter().map(|a| (a.id().to_string(), a.dir.clone())).collect();
        store
    }

    fn dir_of(&self, id: &str) -> Option<PathBuf> {
        if let Some(dir) = self.dirs.get(id) {
            return Some(dir.clone());
        }
        // Ids never contain path separators, so a lookup cannot leave apps_dir
        if id.is_empty() || id.contains('/') || id == "." || id == ".." {
            return None;
        }
        Some(self.apps_dir.join(id))
    }
}

impl ManifestStore for DirectoryStore {
    fn manifest(&self, id: &str) -> Result<InstalledApp, ManifestLoadError> {
        let dir = self
            .dir_of(id)
            .ok_or_else(|| ManifestLoadError::UnknownApp(id.to_string()))?;
        let app = load_manifest(&dir)?;
        if app.id() != id {
            warn!("{} declares id '{}'", app.dir.display(), app.id());
            return Err(ManifestLoadError::UnknownApp(id.to_string()));
        }
        Ok(app)
    }
}

/// Fixed set of manifests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    apps: Vec<InstalledApp>,
}

impl MemoryStore {
    pub fn new(apps: Vec<InstalledApp>) -> Self {
        Self { apps }
    }
}

impl ManifestStore for MemoryStore {
    fn manifest(&self, id: &str) -> Result<InstalledApp, ManifestLoadError> {
        self.apps
            .iter()
            .find(|a| a.id() == id)
            .cloned()
            .ok_or_else(|| ManifestLoadError::UnknownApp(id.to_string()))
    }
}
