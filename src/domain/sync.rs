//! Sync configuration, settings and folder layout.
//!
//! Contains the typed settings document shared by all runs against one sync
//! root, the application configuration, and the pure mapping from target
//! files to sync folders.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Settings document name inside the sync root.
pub const SETTINGS_FILE_NAME: &str = "rhino_sync_settings.json";
/// Export document name inside a sync folder.
pub const EXPORT_FILE_NAME: &str = "rhino_export.json";
/// Metadata document name inside a sync folder.
pub const METADATA_FILE_NAME: &str = "sync_metadata.json";

/// Configuration for syncing and polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Shared folder all sync folders live under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_root: Option<PathBuf>,

    /// Interval between poll ticks in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_root: None,
            poll_interval_ms: default_poll_interval(),
        }
    }
}

const fn default_poll_interval() -> u64 {
    1000
}

/// Configuration for geometry encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Number of parameter steps per curve; `N + 1` points are written.
    #[serde(default = "default_curve_samples")]
    pub curve_samples: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            curve_samples: default_curve_samples(),
        }
    }
}

const fn default_curve_samples() -> usize {
    100
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    /// Directory holding the configuration file.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rhino-sync")
    }

    /// Sync root used when none is configured.
    #[must_use]
    pub fn default_sync_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("RhinoSync")
    }

    #[must_use]
    pub fn config_file_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// The sync root, using the default if not configured.
    #[must_use]
    pub fn sync_root(&self) -> PathBuf {
        self.sync
            .sync_root
            .clone()
            .unwrap_or_else(Self::default_sync_root)
    }

    #[must_use]
    pub fn layout(&self) -> SyncLayout {
        SyncLayout::new(self.sync_root())
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync.poll_interval_ms)
    }
}

/// Remembered target for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMemory {
    pub last_target: PathBuf,
    pub last_sync: DateTime<Utc>,
}

/// The settings document of a sync root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Directory the file chooser starts in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_directory: Option<PathBuf>,

    /// Source path → remembered target.
    #[serde(default)]
    pub file_targets: BTreeMap<String, TargetMemory>,
}

impl SyncSettings {
    #[must_use]
    pub fn target_for(&self, source: &Path) -> Option<&TargetMemory> {
        self.file_targets.get(&source_key(source))
    }

    /// Replace the memory for `source`.
    pub fn set_target(&mut self, source: &Path, target: &Path, at: DateTime<Utc>) {
        self.file_targets.insert(
            source_key(source),
            TargetMemory {
                last_target: target.to_path_buf(),
                last_sync: at,
            },
        );
    }
}

/// Key under which a source file's memory is stored.
#[must_use]
pub fn source_key(source: &Path) -> String {
    source.to_string_lossy().into_owned()
}

/// Paths under one sync root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncLayout {
    root: PathBuf,
}

impl SyncLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }

    /// Folder the exports for `target` are dropped into.
    #[must_use]
    pub fn sync_folder(&self, target: &Path) -> PathBuf {
        self.root.join(sync_folder_name(target))
    }
}

#[must_use]
pub fn export_path(folder: &Path) -> PathBuf {
    folder.join(EXPORT_FILE_NAME)
}

#[must_use]
pub fn metadata_path(folder: &Path) -> PathBuf {
    folder.join(METADATA_FILE_NAME)
}

/// `<sanitized stem>_<sanitized extension>` for a target file.
#[must_use]
pub fn sync_folder_name(target: &Path) -> String {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let ext = target
        .extension()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    format!("{}_{}", sanitize_file_name(&stem), sanitize_file_name(&ext))
}

/// Characters that may not appear in a file name on this platform.
#[must_use]
pub fn is_illegal_file_name_char(c: char) -> bool {
    if cfg!(windows) {
        c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
    } else {
        matches!(c, '/' | '\0')
    }
}

/// Strip every illegal file-name character.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars().filter(|&c| !is_illegal_file_name_char(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.sync.poll_interval_ms, 1000);
        assert_eq!(config.export.curve_samples, 100);
        assert!(config.sync_root().ends_with("RhinoSync"));
    }

    #[test]
    fn test_layout_paths() {
        let layout = SyncLayout::new("/shared/sync");
        assert_eq!(
            layout.settings_path(),
            PathBuf::from("/shared/sync/rhino_sync_settings.json")
        );
        let folder = layout.sync_folder(Path::new("/parts/bracket.SLDPRT"));
        assert_eq!(folder, PathBuf::from("/shared/sync/bracket_SLDPRT"));
        assert_eq!(export_path(&folder), folder.join("rhino_export.json"));
        assert_eq!(metadata_path(&folder), folder.join("sync_metadata.json"));
    }

    #[test]
    fn test_folder_name_without_extension() {
        assert_eq!(sync_folder_name(Path::new("/parts/bracket")), "bracket_");
    }

    #[test]
    fn test_same_target_same_folder() {
        let layout = SyncLayout::new("/root");
        let target = Path::new("/a/b/housing.f3d");
        assert_eq!(layout.sync_folder(target), layout.sync_folder(target));
    }

    #[test]
    fn test_set_target_overwrites() {
        let mut settings = SyncSettings::default();
        let source = Path::new("/models/a.3dm");
        settings.set_target(source, Path::new("/t/one.step"), Utc::now());
        settings.set_target(source, Path::new("/t/two.step"), Utc::now());

        assert_eq!(settings.file_targets.len(), 1);
        assert_eq!(
            settings.target_for(source).unwrap().last_target,
            PathBuf::from("/t/two.step")
        );
    }

    #[test]
    fn test_settings_schema() {
        let mut settings = SyncSettings {
            last_directory: Some(PathBuf::from("/t")),
            ..Default::default()
        };
        settings.set_target(Path::new("/m.3dm"), Path::new("/t/x.step"), Utc::now());
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["last_directory"], "/t");
        assert_eq!(value["file_targets"]["/m.3dm"]["last_target"], "/t/x.step");
        assert!(value["file_targets"]["/m.3dm"]["last_sync"].is_string());
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(name in "\\PC*") {
            let once = sanitize_file_name(&name);
            prop_assert_eq!(sanitize_file_name(&once), once);
        }

        #[test]
        fn sanitize_removes_illegal_chars(name in any::<String>()) {
            let clean = sanitize_file_name(&name);
            prop_assert!(!clean.chars().any(is_illegal_file_name_char));
        }
    }
}
