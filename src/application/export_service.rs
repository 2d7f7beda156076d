//! Export flow: encode the selection, resolve a target, write the sync folder.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    AppConfig, AppError, ExportDocument, ExportedObject, HostObject, Result, SyncLayout, FORMAT_VERSION,
};
use crate::infrastructure::{ExportWriter, SettingsStore};

use super::encoder::{encode, EncodeOptions};
use super::target_resolver::{remembered_target, resolve_target, TargetPrompter};

/// Object filter applied before encoding. Empty filters select everything.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub layers: Vec<String>,
    pub ids: Vec<Uuid>,
}

impl Selection {
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.layers.is_empty() && self.ids.is_empty()
    }

    /// Objects matching any listed layer or id.
    ///
    /// # Errors
    /// Returns `InvalidSelection` if an id is not in `objects`.
    pub fn apply<'a>(&self, objects: &'a [HostObject]) -> Result<Vec<&'a HostObject>> {
        if let Some(missing) = self.ids.iter().find(|id| !objects.iter().any(|o| o.id == **id)) {
            return Err(AppError::InvalidSelection {
                message: format!("no object with id {missing}"),
            });
        }

        if self.is_all() {
            return Ok(objects.iter().collect());
        }

        Ok(objects
            .iter()
            .filter(|o| self.ids.contains(&o.id) || self.layers.iter().any(|l| *l == o.attributes.layer))
            .collect())
    }
}

/// Why an export stopped without writing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    TargetNotChosen,
    NothingSelected,
    /// Objects were selected but every one failed to encode.
    NothingEncoded,
}

/// Result of a completed export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub target: PathBuf,
    pub folder: PathBuf,
    pub export_file: PathBuf,
    pub exported: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported(ExportSummary),
    Cancelled(CancelReason),
}

/// Runs exports against one sync root.
pub struct ExportService {
    layout: SyncLayout,
    store: SettingsStore,
    options: EncodeOptions,
}

impl ExportService {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self::with_layout(
            config.layout(),
            EncodeOptions {
                curve_samples: config.export.curve_samples,
            },
        )
    }

    #[must_use]
    pub fn with_layout(layout: SyncLayout, options: EncodeOptions) -> Self {
        let store = SettingsStore::for_layout(&layout);
        Self {
            layout,
            store,
            options,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Interactive export: encode the selection, prompt for a target, write.
    ///
    /// Nothing is prompted for or persisted unless at least one object
    /// encodes.
    ///
    /// # Errors
    /// Returns error if the selection is invalid or writing fails.
    pub fn export(
        &self,
        source: &Path,
        objects: &[HostObject],
        selection: &Selection,
        prompter: &mut dyn TargetPrompter,
    ) -> Result<ExportOutcome> {
        let batch = match self.encode_selection(objects, selection)? {
            Ok(batch) => batch,
            Err(reason) => return Ok(ExportOutcome::Cancelled(reason)),
        };
        let Some(target) = resolve_target(source, &self.store, prompter) else {
            tracing::info!(source = %source.display(), "Export cancelled");
            return Ok(ExportOutcome::Cancelled(CancelReason::TargetNotChosen));
        };
        self.write(source, &target, batch)
    }

    /// Export to the remembered target without prompting.
    ///
    /// # Errors
    /// Returns `NoRememberedTarget`/`TargetMissing` if there is no usable
    /// target, or any error from [`Self::export`].
    pub fn quick_export(&self, source: &Path, objects: &[HostObject], selection: &Selection) -> Result<ExportOutcome> {
        let target = remembered_target(source, &self.store)?;
        let batch = match self.encode_selection(objects, selection)? {
            Ok(batch) => batch,
            Err(reason) => return Ok(ExportOutcome::Cancelled(reason)),
        };
        self.write(source, &target, batch)
    }

    /// Encode the selected objects, skipping failures.
    ///
    /// The inner `Err` is the reason to cancel when nothing is left to write.
    fn encode_selection(
        &self,
        objects: &[HostObject],
        selection: &Selection,
    ) -> Result<std::result::Result<EncodedBatch, CancelReason>> {
        let selected = selection.apply(objects)?;
        if selected.is_empty() {
            tracing::info!("No objects selected");
            return Ok(Err(CancelReason::NothingSelected));
        }

        let mut batch = EncodedBatch {
            records: Vec::with_capacity(selected.len()),
            skipped: 0,
        };
        for object in selected {
            match encode(object, &self.options) {
                Ok(record) => batch.records.push(record),
                Err(e) => {
                    tracing::warn!(id = %object.id, error = %e, "Skipping object");
                    batch.skipped += 1;
                }
            }
        }

        if batch.records.is_empty() {
            tracing::warn!(skipped = batch.skipped, "No selected object could be encoded");
            return Ok(Err(CancelReason::NothingEncoded));
        }
        Ok(Ok(batch))
    }

    fn write(&self, source: &Path, target: &Path, batch: EncodedBatch) -> Result<ExportOutcome> {
        let document = ExportDocument {
            format_version: FORMAT_VERSION,
            timestamp: Utc::now(),
            target_file: target.display().to_string(),
            source_file: source.display().to_string(),
            objects: batch.records,
        };
        let metadata = document.metadata();
        let folder = self.layout.sync_folder(target);
        let export_file = ExportWriter::new(&self.store).write(&document, &metadata, &folder)?;

        Ok(ExportOutcome::Exported(ExportSummary {
            target: target.to_path_buf(),
            folder,
            export_file,
            exported: metadata.object_count,
            skipped: batch.skipped,
        }))
    }
}

struct EncodedBatch {
    records: Vec<ExportedObject>,
    skipped: usize,
}
