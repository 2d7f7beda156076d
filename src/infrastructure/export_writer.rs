//! Writes export runs into their sync folder.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::{export_path, metadata_path, AppError, ExportDocument, Result, SyncMetadata};

use super::atomic::atomic_write;
use super::settings_store::SettingsStore;

/// Writer for export and metadata documents.
pub struct ExportWriter<'a> {
    store: &'a SettingsStore,
}

impl<'a> ExportWriter<'a> {
    #[must_use]
    pub const fn new(store: &'a SettingsStore) -> Self {
        Self { store }
    }

    /// Write both documents into `folder`, then remember the target.
    ///
    /// Files written before a failing step stay in place; the next run
    /// overwrites them.
    ///
    /// # Errors
    /// Returns error if a directory or document cannot be written.
    pub fn write(&self, document: &ExportDocument, metadata: &SyncMetadata, folder: &Path) -> Result<PathBuf> {
        fs::create_dir_all(folder).map_err(|e| {
            AppError::io(format!("Failed to create sync folder {}", folder.display()), e)
        })?;

        let export_file = export_path(folder);
        write_json(&export_file, document)?;
        write_json(&metadata_path(folder), metadata)?;

        self.store.remember_target(
            Path::new(&document.source_file),
            Path::new(&document.target_file),
            metadata.last_sync,
        )?;

        tracing::info!(
            folder = %folder.display(),
            objects = metadata.object_count,
            "Export written"
        );
        Ok(export_file)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(AppError::json_parse)?;
    atomic_write(path, content.as_bytes())
        .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))
}

/// Read the metadata document of a sync folder, if present.
///
/// # Errors
/// Returns error if the document exists but cannot be read or parsed.
pub fn read_metadata(folder: &Path) -> Result<Option<SyncMetadata>> {
    let path = metadata_path(folder);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AppError::io(format!("Failed to read {}", path.display()), e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(AppError::json_parse)
}
