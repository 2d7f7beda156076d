//! Domain layer - core types and pure logic.
//!
//! This layer contains the host geometry model, the interchange document
//! models, settings and layout types, and error types, without any I/O.

pub mod error;
pub mod geometry;
pub mod models;
pub mod sync;

pub use error::{AppError, EncodeError, Result};
pub use geometry::{Geometry, HostObject};
pub use models::{ExportDocument, ExportedObject, GeometryPayload, SyncMetadata, FORMAT_VERSION};
pub use sync::{
    export_path, metadata_path, AppConfig, SyncLayout, SyncSettings, TargetMemory,
};
