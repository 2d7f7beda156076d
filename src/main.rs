//! Rhino Sync - Hand CAD geometry from a modeling application to a target file.
//!
//! The exporting side writes a JSON snapshot of the selected objects into a
//! per-target folder under a shared sync root. The importing side watches
//! that folder and hands each newer snapshot to a decoder.
//!
//!   rhino-sync export --scene scene.json           # interactive target choice
//!   rhino-sync quick-export --scene scene.json     # reuse the remembered target
//!   rhino-sync watch --target part.step --exec dec # decode every new export
//!   rhino-sync status                              # remembered targets

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    collect_status, format_export_summary, format_import_request, format_status_json,
    format_status_table, AutoSync, CancelReason, ChangePoller, ExportOutcome, ExportService,
    ImportRequest, OutputFormat, QueueTrigger,
};
use cli::{Cli, Commands, FolderArgs, SceneArgs};
use domain::{export_path, AppConfig, AppError};
use infrastructure::{
    ensure_config_exists, load_config, load_scene, render_config, FixedTarget, SettingsStore,
    TerminalPrompter,
};

/// Exit code when the user cancelled an export.
const EXIT_CANCELLED: i32 = 3;

/// How a command finished, when it did not fail.
enum Completion {
    Done,
    Cancelled,
}

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(Completion::Done) => {}
        Ok(Completion::Cancelled) => std::process::exit(EXIT_CANCELLED),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Main application logic.
fn run(cli: Cli) -> domain::Result<Completion> {
    let mut config = load_config()?;
    if let Some(root) = cli.sync_root {
        config.sync.sync_root = Some(root);
    }

    match cli.command {
        Commands::Export { scene, target } => cmd_export(&config, &scene, target),
        Commands::QuickExport { scene } => cmd_quick_export(&config, &scene),
        Commands::Import { folder, exec } => {
            cmd_import(&config, &folder, exec.as_deref())?;
            Ok(Completion::Done)
        }
        Commands::Watch {
            folder,
            interval_ms,
            exec,
        } => {
            let interval = interval_ms.map_or_else(|| config.poll_interval(), Duration::from_millis);
            cmd_watch(&config, &folder, interval, exec.as_deref())?;
            Ok(Completion::Done)
        }
        Commands::Status { format } => {
            cmd_status(&config, format)?;
            Ok(Completion::Done)
        }
        Commands::Config { init } => {
            cmd_config(&config, init)?;
            Ok(Completion::Done)
        }
    }
}

/// Interactive export command.
fn cmd_export(config: &AppConfig, args: &SceneArgs, target: Option<PathBuf>) -> domain::Result<Completion> {
    let scene = load_scene(&args.scene)?;
    let source = args.source.clone().unwrap_or_else(|| scene.source_path(&args.scene));
    let service = ExportService::new(config);

    let outcome = match target {
        Some(target) => service.export(
            &source,
            &scene.objects,
            &args.selection(),
            &mut FixedTarget::new(target),
        )?,
        None => service.export(
            &source,
            &scene.objects,
            &args.selection(),
            &mut TerminalPrompter::stdio(),
        )?,
    };

    Ok(report(&outcome))
}

/// Quick export command.
fn cmd_quick_export(config: &AppConfig, args: &SceneArgs) -> domain::Result<Completion> {
    let scene = load_scene(&args.scene)?;
    let source = args.source.clone().unwrap_or_else(|| scene.source_path(&args.scene));

    let outcome = ExportService::new(config).quick_export(&source, &scene.objects, &args.selection())?;
    Ok(report(&outcome))
}

fn report(outcome: &ExportOutcome) -> Completion {
    match outcome {
        ExportOutcome::Exported(summary) => {
            println!("{}", format_export_summary(summary));
            Completion::Done
        }
        ExportOutcome::Cancelled(reason) => {
            let why = match reason {
                CancelReason::TargetNotChosen => "no target chosen",
                CancelReason::NothingSelected => "nothing selected",
                CancelReason::NothingEncoded => "no selected object could be encoded",
            };
            eprintln!("{} {}", "Export cancelled:".yellow().bold(), why);
            Completion::Cancelled
        }
    }
}

/// Sync folder named on the command line.
fn sync_folder(config: &AppConfig, args: &FolderArgs) -> domain::Result<PathBuf> {
    match (&args.folder, &args.target) {
        (Some(folder), _) => Ok(folder.clone()),
        (None, Some(target)) => Ok(config.layout().sync_folder(target)),
        (None, None) => Err(AppError::Config {
            message: "either --folder or --target is required".into(),
        }),
    }
}

/// One-shot import command.
fn cmd_import(config: &AppConfig, args: &FolderArgs, exec: Option<&str>) -> domain::Result<()> {
    let folder = sync_folder(config, args)?;
    let export_file = export_path(&folder);
    if !export_file.exists() {
        return Err(AppError::Import {
            message: format!("no export in {}", folder.display()),
        });
    }

    let request = ImportRequest {
        folder,
        export_file,
        detected_at: Utc::now(),
    };
    build_runtime()?.block_on(handle_import(&request, exec))
}

/// Watch command: poll until Ctrl-C.
fn cmd_watch(config: &AppConfig, args: &FolderArgs, interval: Duration, exec: Option<&str>) -> domain::Result<()> {
    let folder = sync_folder(config, args)?;

    build_runtime()?.block_on(async {
        let (trigger, mut requests) = QueueTrigger::channel();
        let mut auto_sync = AutoSync::new(ChangePoller::new(Box::new(trigger)), interval);
        auto_sync.start(&folder);

        println!(
            "{} {} every {} ms (Ctrl-C to stop)",
            "Watching".green().bold(),
            folder.display(),
            auto_sync.interval().as_millis()
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                Some(request) = requests.recv() => {
                    if let Err(e) = handle_import(&request, exec).await {
                        tracing::warn!(error = %e, "Import failed");
                    }
                }
            }
        }

        auto_sync.stop();
        println!("Stopped");
        Ok(())
    })
}

/// Hand one export to the decoder, or just report it.
async fn handle_import(request: &ImportRequest, exec: Option<&str>) -> domain::Result<()> {
    println!("{}", format_import_request(request));

    let Some(program) = exec else {
        return Ok(());
    };

    let status = tokio::process::Command::new(program)
        .arg(&request.export_file)
        .status()
        .await
        .map_err(|e| AppError::io(format!("Failed to run {program}"), e))?;

    if status.success() {
        tracing::info!(program, "Import finished");
        Ok(())
    } else {
        Err(AppError::Import {
            message: format!("{program} exited with {status}"),
        })
    }
}

fn build_runtime() -> domain::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::io("Failed to start async runtime", e))
}

/// Show remembered targets.
fn cmd_status(config: &AppConfig, format: OutputFormat) -> domain::Result<()> {
    let layout = config.layout();
    let settings = SettingsStore::for_layout(&layout).load();
    let rows = collect_status(&settings, &layout);

    match format {
        OutputFormat::Json => {
            println!("{}", format_status_json(&rows).map_err(AppError::json_parse)?);
        }
        OutputFormat::Table if rows.is_empty() => {
            println!("No remembered targets under {}", layout.root().display());
        }
        OutputFormat::Table => {
            println!("{}", "Sync targets".bold());
            println!("{}", format_status_table(&rows));
            if let Some(dir) = &settings.last_directory {
                println!("Last browsed: {}", dir.display());
            }
        }
    }

    Ok(())
}

/// Print or initialize the configuration.
fn cmd_config(config: &AppConfig, init: bool) -> domain::Result<()> {
    let path = AppConfig::config_file_path();

    if init {
        if ensure_config_exists()? {
            println!("{} Created {}", "✓".green().bold(), path.display());
        } else {
            println!("Config already exists: {}", path.display());
        }
    }

    println!("{} {}", "#".dimmed(), display_or_default(&path));
    println!("{} sync root: {}", "#".dimmed(), config.sync_root().display());
    print!("{}", render_config(config)?);
    Ok(())
}

fn display_or_default(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not created, using defaults)", path.display())
    }
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
