//! JSON settings document for a sync root.
//!
//! Remembers which target each source file was last exported to, and the
//! directory the file chooser last browsed. A missing or unreadable document
//! is treated as empty, never as an error.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::{AppError, Result, SyncLayout, SyncSettings};

use super::atomic::atomic_write;

/// Store for the settings document of one sync root.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn for_layout(layout: &SyncLayout) -> Self {
        Self::new(layout.settings_path())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to an empty document.
    #[must_use]
    pub fn load(&self) -> SyncSettings {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No settings yet");
                return SyncSettings::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read settings, starting empty");
                return SyncSettings::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Corrupt settings, starting empty");
            SyncSettings::default()
        })
    }

    /// Overwrite the settings document.
    ///
    /// # Errors
    /// Returns error if the document cannot be serialized or written.
    pub fn save(&self, settings: &SyncSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings).map_err(AppError::json_parse)?;
        atomic_write(&self.path, content.as_bytes()).map_err(|e| {
            AppError::io(format!("Failed to write settings: {}", self.path.display()), e)
        })?;
        tracing::debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Record `target` as the last target of `source`.
    ///
    /// # Errors
    /// Returns error if the document cannot be written.
    pub fn remember_target(&self, source: &Path, target: &Path, at: DateTime<Utc>) -> Result<()> {
        let mut settings = self.load();
        settings.set_target(source, target, at);
        self.save(&settings)
    }

    /// Record the directory the user last picked a target from.
    ///
    /// # Errors
    /// Returns error if the document cannot be written.
    pub fn remember_directory(&self, dir: &Path) -> Result<()> {
        let mut settings = self.load();
        settings.last_directory = Some(dir.to_path_buf());
        self.save(&settings)
    }
}
