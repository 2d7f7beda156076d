//! Application layer - use cases and orchestration.
//!
//! This layer encodes host objects, resolves sync targets, runs exports and
//! drives the change poller.

pub mod encoder;
pub mod export_service;
pub mod formatter;
pub mod import_trigger;
pub mod poller;
pub mod target_resolver;

pub use encoder::{encode, EncodeOptions};
pub use export_service::{CancelReason, ExportOutcome, ExportService, ExportSummary, Selection};
pub use formatter::{
    collect_status, format_export_summary, format_import_request, format_status_json,
    format_status_table, OutputFormat,
};
pub use import_trigger::{ImportRequest, ImportTrigger, QueueTrigger};
pub use poller::{AutoSync, ChangePoller, PollState};
pub use target_resolver::{remembered_target, resolve_target, ReuseChoice, TargetPrompter};
