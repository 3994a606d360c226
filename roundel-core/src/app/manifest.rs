//! Application manifest model and validation
//!
//! A manifest is validated as a whole: any invalid field rejects it, so a
//! constructed [`AppManifest`] is always fully valid. Parsing the on-disk
//! format is left to the caller, which hands over a [`RawManifest`] of
//! borrowed strings.

use core::fmt;

use heapless::{String, Vec};

/// Maximum id length
pub const MAX_ID_LEN: usize = 128;
/// Display names longer than this are truncated
pub const MAX_NAME_LEN: usize = 64;
/// Maximum version string length
pub const MAX_VERSION_LEN: usize = 32;
/// Descriptions longer than this are truncated
pub const MAX_DESCRIPTION_LEN: usize = 512;
/// Maximum icon reference length
pub const MAX_ICON_LEN: usize = 256;
/// Maximum entry point length (factory key or path)
pub const MAX_ENTRY_LEN: usize = 512;

/// Permissions an app may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Permission {
    SystemSettings,
    SystemStats,
    PowerControl,
    NetworkAccess,
    BluetoothAccess,
    StorageRead,
    StorageWrite,
}

impl Permission {
    /// Every known permission, in vocabulary order
    pub const ALL: [Permission; 7] = [
        Permission::SystemSettings,
        Permission::SystemStats,
        Permission::PowerControl,
        Permission::NetworkAccess,
        Permission::BluetoothAccess,
        Permission::StorageRead,
        Permission::StorageWrite,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::SystemSettings => "system.settings",
            Permission::SystemStats => "system.stats",
            Permission::PowerControl => "power.control",
            Permission::NetworkAccess => "network.access",
            Permission::BluetoothAccess => "bluetooth.access",
            Permission::StorageRead => "storage.read",
            Permission::StorageWrite => "storage.write",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

/// How an app is run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExecutionMode {
    /// In-process object built by a registered factory
    Embedded,
    /// Supervised child process
    External,
}

impl ExecutionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Embedded => "embedded",
            ExecutionMode::External => "external",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "embedded" => Some(ExecutionMode::Embedded),
            "external" => Some(ExecutionMode::External),
            _ => None,
        }
    }
}

/// Manifest field, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ManifestField {
    Id,
    Name,
    Version,
    Description,
    Icon,
    Entry,
}

impl ManifestField {
    pub const fn as_str(self) -> &'static str {
        match self {
            ManifestField::Id => "id",
            ManifestField::Name => "name",
            ManifestField::Version => "version",
            ManifestField::Description => "description",
            ManifestField::Icon => "icon",
            ManifestField::Entry => "entry",
        }
    }
}

/// Reasons a manifest is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ManifestError {
    /// A required field is empty
    Missing(ManifestField),
    /// Id contains characters outside `[A-Za-z0-9._-]`
    InvalidId,
    /// Version is not `MAJOR.MINOR.PATCH`
    InvalidVersion,
    /// Mode is neither `embedded` nor `external`
    UnsupportedMode,
    /// Permission at this index is not in the vocabulary
    UnknownPermission { index: usize },
    /// Identifying field exceeds its storage capacity
    TooLong(ManifestField),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Missing(field) => write!(f, "missing required field '{}'", field.as_str()),
            ManifestError::InvalidId => f.write_str("id must match [A-Za-z0-9._-]+"),
            ManifestError::InvalidVersion => f.write_str("version must be MAJOR.MINOR.PATCH"),
            ManifestError::UnsupportedMode => f.write_str("mode must be 'embedded' or 'external'"),
            ManifestError::UnknownPermission { index } => {
                write!(f, "unknown permission at index {}", index)
            }
            ManifestError::TooLong(field) => write!(f, "field '{}' is too long", field.as_str()),
        }
    }
}

/// Non-fatal manifest findings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ManifestWarning {
    EmptyDescription,
    EmptyIcon,
    /// Display text cut to fit its field
    Truncated(ManifestField),
}

/// Unvalidated manifest fields as read from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct RawManifest<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub version: &'a str,
    pub description: &'a str,
    pub icon: &'a str,
    pub mode: &'a str,
    pub entry: &'a str,
    pub permissions: &'a [&'a str],
}

/// A validated application manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    pub id: String<MAX_ID_LEN>,
    pub name: String<MAX_NAME_LEN>,
    pub version: String<MAX_VERSION_LEN>,
    pub description: String<MAX_DESCRIPTION_LEN>,
    pub icon: String<MAX_ICON_LEN>,
    pub mode: ExecutionMode,
    pub entry: String<MAX_ENTRY_LEN>,
    /// Declared permissions in declaration order, without duplicates
    pub permissions: Vec<Permission, 7>,
    truncated: Vec<ManifestField, 2>,
}

impl AppManifest {
    /// Validate raw fields, rejecting the manifest as a whole on any error
    pub fn validate(raw: &RawManifest<'_>) -> Result<Self, ManifestError> {
        if raw.id.is_empty() {
            return Err(ManifestError::Missing(ManifestField::Id));
        }
        if !is_valid_id(raw.id) {
            return Err(ManifestError::InvalidId);
        }
        if raw.name.is_empty() {
            return Err(ManifestError::Missing(ManifestField::Name));
        }
        if !is_valid_version(raw.version) {
            return Err(ManifestError::InvalidVersion);
        }
        let mode = ExecutionMode::parse(raw.mode).ok_or(ManifestError::UnsupportedMode)?;
        if raw.entry.is_empty() {
            return Err(ManifestError::Missing(ManifestField::Entry));
        }

        let mut permissions = Vec::new();
        for (index, s) in raw.permissions.iter().enumerate() {
            let p = Permission::parse(s).ok_or(ManifestError::UnknownPermission { index })?;
            if !permissions.contains(&p) {
                // At most seven distinct permissions exist
                let _ = permissions.push(p);
            }
        }

        let mut truncated = Vec::new();
        let (name, cut) = truncate(raw.name);
        if cut {
            let _ = truncated.push(ManifestField::Name);
        }
        let (description, cut) = truncate(raw.description);
        if cut {
            let _ = truncated.push(ManifestField::Description);
        }

        Ok(Self {
            id: bounded(raw.id, ManifestField::Id)?,
            name,
            version: bounded(raw.version, ManifestField::Version)?,
            description,
            icon: bounded(raw.icon, ManifestField::Icon)?,
            mode,
            entry: bounded(raw.entry, ManifestField::Entry)?,
            permissions,
            truncated,
        })
    }

    /// Findings worth logging that do not invalidate the manifest
    pub fn warnings(&self) -> Vec<ManifestWarning, 4> {
        let mut out = Vec::new();
        for field in &self.truncated {
            let _ = out.push(ManifestWarning::Truncated(*field));
        }
        if self.description.is_empty() {
            let _ = out.push(ManifestWarning::EmptyDescription);
        }
        if self.icon.is_empty() {
            let _ = out.push(ManifestWarning::EmptyIcon);
        }
        out
    }

    pub fn has_permission(&self, p: Permission) -> bool {
        self.permissions.contains(&p)
    }
}

fn bounded<const N: usize>(s: &str, field: ManifestField) -> Result<String<N>, ManifestError> {
    let mut out = String::new();
    out.push_str(s).map_err(|_| ManifestError::TooLong(field))?;
    Ok(out)
}

/// Longest prefix of `s` that fits, cut on a character boundary
fn truncate<const N: usize>(s: &str) -> (String<N>, bool) {
    let mut end = s.len().min(N);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::new();
    // Fits by construction
    let _ = out.push_str(&s[..end]);
    (out, end < s.len())
}

fn is_valid_id(id: &str) -> bool {
    id.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

fn is_valid_version(v: &str) -> bool {
    let mut parts = 0;
    for part in v.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        parts += 1;
    }
    parts == 3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw<'a>(permissions: &'a [&'a str]) -> RawManifest<'a> {
        RawManifest {
            id: "org.roundel.stopwatch",
            name: "Stopwatch",
            version: "1.2.0",
            description: "Counts up",
            icon: "stopwatch.png",
            mode: "embedded",
            entry: "stopwatch",
            permissions,
        }
    }

    #[test]
    fn test_valid_manifest() {
        let m = AppManifest::validate(&raw(&["system.stats", "storage.read"])).unwrap();
        assert_eq!(m.id.as_str(), "org.roundel.stopwatch");
        assert_eq!(m.mode, ExecutionMode::Embedded);
        assert_eq!(
            m.permissions.as_slice(),
            &[Permission::SystemStats, Permission::StorageRead]
        );
        assert!(m.warnings().is_empty());
    }

    #[test]
    fn test_unknown_permission_rejects_all() {
        let err = AppManifest::validate(&raw(&["system.stats", "bogus.permission"])).unwrap_err();
        assert_eq!(err, ManifestError::UnknownPermission { index: 1 });
    }

    #[test]
    fn test_invalid_id() {
        let mut r = raw(&[]);
        r.id = "bad id!";
        assert_eq!(AppManifest::validate(&r), Err(ManifestError::InvalidId));
        r.id = "";
        assert_eq!(
            AppManifest::validate(&r),
            Err(ManifestError::Missing(ManifestField::Id))
        );
    }

    #[test]
    fn test_version_format() {
        assert!(is_valid_version("0.1.0"));
        assert!(is_valid_version("10.20.30"));
        assert!(!is_valid_version("1.0"));
        assert!(!is_valid_version("1.0.0.0"));
        assert!(!is_valid_version("1.x.0"));
        assert!(!is_valid_version("1..0"));
        assert!(!is_valid_version(""));
    }

    #[test]
    fn test_mode_and_name() {
        let mut r = raw(&[]);
        r.mode = "python";
        assert_eq!(AppManifest::validate(&r), Err(ManifestError::UnsupportedMode));

        let mut r = raw(&[]);
        r.name = "";
        assert_eq!(
            AppManifest::validate(&r),
            Err(ManifestError::Missing(ManifestField::Name))
        );
    }

    #[test]
    fn test_duplicate_permissions_collapse() {
        let m = AppManifest::validate(&raw(&["power.control", "power.control"])).unwrap();
        assert_eq!(m.permissions.len(), 1);
        assert!(m.has_permission(Permission::PowerControl));
    }

    #[test]
    fn test_warnings() {
        let mut r = raw(&[]);
        r.description = "";
        r.icon = "";
        let m = AppManifest::validate(&r).unwrap();
        assert_eq!(
            m.warnings().as_slice(),
            &[ManifestWarning::EmptyDescription, ManifestWarning::EmptyIcon]
        );
    }

    #[test]
    fn test_long_display_name_accepted() {
        let long = "A".repeat(40);
        let mut r = raw(&[]);
        r.name = &long;
        let m = AppManifest::validate(&r).unwrap();
        assert_eq!(m.name.as_str(), long);
        assert!(m.warnings().is_empty());

        let exact = "B".repeat(MAX_NAME_LEN);
        r.name = &exact;
        let m = AppManifest::validate(&r).unwrap();
        assert_eq!(m.name.len(), MAX_NAME_LEN);
        assert!(m.warnings().is_empty());
    }

    #[test]
    fn test_over_long_text_truncated() {
        let name = "C".repeat(MAX_NAME_LEN + 1);
        // Multi-byte characters straddle the description limit
        let description = format!("a{}", "é".repeat(MAX_DESCRIPTION_LEN));
        let mut r = raw(&[]);
        r.name = &name;
        r.description = &description;

        let m = AppManifest::validate(&r).unwrap();
        assert_eq!(m.name.as_str(), &name[..MAX_NAME_LEN]);
        assert_eq!(m.description.len(), MAX_DESCRIPTION_LEN - 1);
        assert!(m.description.chars().skip(1).all(|c| c == 'é'));
        assert_eq!(
            m.warnings().as_slice(),
            &[
                ManifestWarning::Truncated(ManifestField::Name),
                ManifestWarning::Truncated(ManifestField::Description)
            ]
        );
    }

    #[test]
    fn test_too_long_id_rejected() {
        let id = "x".repeat(MAX_ID_LEN + 1);
        let mut r = raw(&[]);
        r.id = &id;
        assert_eq!(
            AppManifest::validate(&r),
            Err(ManifestError::TooLong(ManifestField::Id))
        );
    }
}
