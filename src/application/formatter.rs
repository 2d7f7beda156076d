//! Terminal output for export runs and sync status.
//!
//! Supports a table view and JSON.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::domain::{SyncLayout, SyncSettings};
use crate::infrastructure::read_metadata;

use super::export_service::ExportSummary;
use super::import_trigger::ImportRequest;

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// JSON format for programmatic use.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Use: table, json")),
        }
    }
}

/// One remembered source/target pair and the state of its sync folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub source: String,
    pub target: PathBuf,
    pub target_exists: bool,
    pub folder: PathBuf,
    pub last_sync: DateTime<Utc>,
    /// Object count from the folder's metadata, if it has been written.
    pub object_count: Option<usize>,
}

/// Build status rows from the settings document and per-folder metadata.
#[must_use]
pub fn collect_status(settings: &SyncSettings, layout: &SyncLayout) -> Vec<StatusRow> {
    settings
        .file_targets
        .iter()
        .map(|(source, memory)| {
            let folder = layout.sync_folder(&memory.last_target);
            let object_count = match read_metadata(&folder) {
                Ok(metadata) => metadata.map(|m| m.object_count),
                Err(e) => {
                    tracing::warn!(folder = %folder.display(), error = %e, "Unreadable metadata");
                    None
                }
            };

            StatusRow {
                source: source.clone(),
                target: memory.last_target.clone(),
                target_exists: memory.last_target.exists(),
                folder,
                last_sync: memory.last_sync,
                object_count,
            }
        })
        .collect()
}

/// Formats status rows as a table.
#[must_use]
pub fn format_status_table(rows: &[StatusRow]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Source", "Target", "Last sync", "Objects", "Folder"]);

    for row in rows {
        let target = truncate(&row.target.display().to_string(), 40);
        let target = if row.target_exists {
            target
        } else {
            format!("{target} (missing)")
        };

        table.add_row(vec![
            truncate(&row.source, 40),
            target,
            row.last_sync.format("%Y-%m-%d %H:%M").to_string(),
            row.object_count.map_or_else(|| "-".to_string(), |n| n.to_string()),
            row.folder.display().to_string(),
        ]);
    }

    table.to_string()
}

/// Formats status rows as JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_status_json(rows: &[StatusRow]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rows)
}

/// One-line report of a finished export.
#[must_use]
pub fn format_export_summary(summary: &ExportSummary) -> String {
    let mut out = format!(
        "{} Exported {} object(s) for {} to {}",
        "✓".green().bold(),
        summary.exported.to_string().cyan(),
        summary.target.display(),
        summary.folder.display()
    );
    if summary.skipped > 0 {
        out.push_str(&format!(
            "\n  {} {} object(s) skipped, see log",
            "!".yellow().bold(),
            summary.skipped
        ));
    }
    out
}

#[must_use]
pub fn format_import_request(request: &ImportRequest) -> String {
    format!(
        "{} {} ({})",
        "↻ Import".blue().bold(),
        request.export_file.display(),
        request.detected_at.format("%H:%M:%S")
    )
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FORMAT_VERSION;
    use crate::domain::ExportDocument;
    use crate::infrastructure::{ExportWriter, SettingsStore};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world!", 8), "hello...");
        assert_eq!(truncate("ääääääääää", 5), "ää...");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("markdown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_collect_status() {
        let dir = tempdir().unwrap();
        let layout = SyncLayout::new(dir.path().join("sync"));
        let store = SettingsStore::for_layout(&layout);

        let written = dir.path().join("written.step");
        fs::write(&written, "").unwrap();
        let document = ExportDocument {
            format_version: FORMAT_VERSION,
            timestamp: Utc::now(),
            target_file: written.display().to_string(),
            source_file: "/m/a.3dm".into(),
            objects: Vec::new(),
        };
        ExportWriter::new(&store)
            .write(&document, &document.metadata(), &layout.sync_folder(&written))
            .unwrap();
        store
            .remember_target(Path::new("/m/b.3dm"), &dir.path().join("gone.step"), Utc::now())
            .unwrap();

        let rows = collect_status(&store.load(), &layout);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source, "/m/a.3dm");
        assert!(rows[0].target_exists);
        assert_eq!(rows[0].object_count, Some(0));
        assert!(!rows[1].target_exists);
        assert_eq!(rows[1].object_count, None);

        let table = format_status_table(&rows);
        assert!(table.contains("(missing)"));
        assert!(format_status_json(&rows).unwrap().contains("\"object_count\": 0"));
    }
}
