//! Domain-level error types for rhino-sync.
//!
//! All errors are typed with `thiserror`. User cancellation is not an error
//! and never shows up here; see `ExportOutcome`.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// No target has been remembered for this source file yet.
    #[error("No remembered sync target for {source_file}; run `export` first")]
    NoRememberedTarget { source_file: String },

    /// The remembered target file no longer exists on disk.
    #[error("Remembered sync target no longer exists: {path}")]
    TargetMissing { path: PathBuf },

    /// Scene dump could not be loaded.
    #[error("Scene error: {message}")]
    Scene { message: String },

    /// Selection filter could not be applied.
    #[error("Invalid selection: {message}")]
    InvalidSelection { message: String },

    /// The external import command failed.
    #[error("Import failed: {message}")]
    Import { message: String },

    /// JSON parsing or serialization failed.
    #[error("JSON error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a JSON error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure to encode a single host object.
///
/// The export run logs these and skips the object.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// NURBS definition is inconsistent.
    #[error("invalid NURBS curve: {0}")]
    InvalidNurbs(String),

    /// A mesh face references a vertex that does not exist.
    #[error("mesh face {face} references vertex {vertex}, but mesh has {vertex_count} vertices")]
    MeshIndexOutOfRange {
        face: usize,
        vertex: usize,
        vertex_count: usize,
    },

    /// Geometry has nothing to measure (no points, no faces).
    #[error("empty geometry: {0}")]
    Empty(&'static str),

    /// Geometry contains NaN or infinite values.
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}
