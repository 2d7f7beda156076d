//! Infrastructure layer - external adapters (filesystem, terminal).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod atomic;
pub mod config;
pub mod export_writer;
pub mod prompt;
pub mod scene;
pub mod settings_store;

pub use config::{ensure_config_exists, load_config, render_config};
pub use export_writer::{read_metadata, ExportWriter};
pub use prompt::{FixedTarget, TerminalPrompter};
pub use scene::{load_scene, Scene};
pub use settings_store::SettingsStore;
