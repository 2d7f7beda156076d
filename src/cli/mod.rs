//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use crate::application::{OutputFormat, Selection};

/// Rhino Sync - Export CAD geometry to a shared drop folder and pick it up on change.
///
///   rhino-sync export --scene scene.json            # choose or reuse a target
///   rhino-sync quick-export --scene scene.json      # reuse the remembered target
///   rhino-sync watch --target part.step --exec dec  # run `dec <export>` on each update
#[derive(Parser, Debug)]
#[command(name = "rhino-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Sync root directory (overrides the configuration file).
    #[arg(long, global = true)]
    pub sync_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Scene and object selection shared by the export commands.
#[derive(Args, Debug)]
pub struct SceneArgs {
    /// Scene dump to export from.
    #[arg(short, long)]
    pub scene: PathBuf,

    /// Source document path (defaults to the one recorded in the scene).
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Only export objects on this layer (repeatable).
    #[arg(short, long = "layer")]
    pub layers: Vec<String>,

    /// Only export the object with this id (repeatable).
    #[arg(long = "id")]
    pub ids: Vec<Uuid>,
}

impl SceneArgs {
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection {
            layers: self.layers.clone(),
            ids: self.ids.clone(),
        }
    }
}

/// Which sync folder to work on.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct FolderArgs {
    /// Sync folder to use directly.
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Target file whose sync folder to use.
    #[arg(long)]
    pub target: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a scene, choosing or reusing its sync target.
    Export {
        #[command(flatten)]
        scene: SceneArgs,

        /// Target file; skips the interactive prompt.
        #[arg(short, long)]
        target: Option<PathBuf>,
    },

    /// Export a scene to its remembered target without prompting.
    QuickExport {
        #[command(flatten)]
        scene: SceneArgs,
    },

    /// Trigger one import of a sync folder's current export.
    Import {
        #[command(flatten)]
        folder: FolderArgs,

        /// Program to run with the export file as its argument.
        #[arg(long)]
        exec: Option<String>,
    },

    /// Watch a sync folder and trigger an import on every newer export.
    Watch {
        #[command(flatten)]
        folder: FolderArgs,

        /// Poll interval in milliseconds (defaults to the configuration).
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Program to run with the export file as its argument.
        #[arg(long)]
        exec: Option<String>,
    },

    /// Show remembered targets and their last export.
    Status {
        /// Output format: table or json.
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the effective configuration.
    Config {
        /// Write the default configuration file if missing.
        #[arg(long)]
        init: bool,
    },
}
