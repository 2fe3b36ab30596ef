//! Folder Backup Creator - Command-line interface for the backup engine.
//!
//! This is a simple CLI for testing and manual use of the backup engine.
//! It provides argument parsing, a console status sink, and subcommands
//! mapping 1:1 onto engine operations.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use engine::{
    backup::{paths_schema, BackupEngine, BACKUPS_DIRECTORY_KEY, PATHS_SECTION, SAVE_DIRECTORY_KEY},
    model::{StatusEvent, StatusLevel},
    paths,
    progress::StatusSink,
    settings::SettingsStore,
};

/// Settings file used when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "folder_backup_creator.ini";

/// Folder Backup Creator - A versioned folder backup tool
#[derive(Parser, Debug)]
#[command(name = "folder-backup")]
#[command(version = "0.1.0")]
#[command(about = "Create and inspect versioned backups of a configured folder")]
struct Args {
    /// Settings file to read and write
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new backup of the configured save directory
    Backup,

    /// Print the path of the most recent backup
    Latest,

    /// List existing backup versions, newest first
    List,

    /// Check whether the configured paths are usable
    Check,

    /// Create the backup root if it is missing
    Init,

    /// Set the directory that gets backed up
    SetSource {
        /// Existing directory to back up
        #[arg(value_name = "DIR")]
        path: PathBuf,
    },

    /// Set the directory backups are stored under
    SetBackupRoot {
        /// Directory to store backups in (created by `init` when missing)
        #[arg(value_name = "DIR")]
        path: PathBuf,
    },

    /// Print the settings file path and contents
    Config,
}

/// CLI implementation of StatusSink for displaying backup progress.
///
/// Info and Warn entries go to stdout, Error entries to stderr, each as one
/// `[LEVEL](timestamp): message` line.
struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn emit(&self, event: StatusEvent) {
        let line = format!(
            "[{}]({}): {}",
            event.level,
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.message
        );
        match event.level {
            StatusLevel::Error => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}

/// Initialize the diagnostic logger. `RUST_LOG` overrides the default level.
fn init_logger() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();
}

/// Parse command-line arguments, then dispatch to the engine
fn main() {
    init_logger();
    let args = Args::parse();

    // Exit code tracking
    let exit_code = match run_cli(&args) {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<(), String> {
    let settings =
        SettingsStore::open(&args.config, paths_schema()).map_err(|e| e.to_string())?;
    let mut engine = BackupEngine::new(settings, Box::new(ConsoleSink));

    match &args.command {
        Command::Backup => {
            let report = engine.create_backup().map_err(|e| e.to_string())?;
            println!(
                "Backup {} complete: {} files, {} bytes",
                report.version, report.files_copied, report.bytes_copied
            );
            Ok(())
        }
        Command::Latest => match engine.latest_version_path().map_err(|e| e.to_string())? {
            Some(path) => {
                println!("{}", path.display());
                Ok(())
            }
            None => Err("No backups exist yet".to_string()),
        },
        Command::List => {
            let versions = engine.list_versions().map_err(|e| e.to_string())?;
            for version in versions {
                println!("{}", version);
            }
            Ok(())
        }
        Command::Check => {
            let configured = engine
                .paths_configured_correctly()
                .map_err(|e| e.to_string())?;
            if configured {
                println!("Paths configured correctly");
                Ok(())
            } else {
                Err("Paths not configured correctly".to_string())
            }
        }
        Command::Init => {
            let status = engine
                .ensure_backup_root_exists()
                .map_err(|e| e.to_string())?;
            if status.ok {
                println!("Paths initialized successfully");
                Ok(())
            } else {
                Err(status.message)
            }
        }
        Command::SetSource { path } => {
            set_directory_field(&mut engine, SAVE_DIRECTORY_KEY, path, true)
        }
        Command::SetBackupRoot { path } => {
            set_directory_field(&mut engine, BACKUPS_DIRECTORY_KEY, path, false)
        }
        Command::Config => {
            let path = engine.settings().path().to_path_buf();
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            println!("{}", path.display());
            print!("{}", contents);
            Ok(())
        }
    }
}

/// Validate and store one of the two configured directories.
///
/// The save directory must already exist; the backup root may be missing as
/// long as it is creatable, since `init` creates it. The stored value is the
/// normalized absolute form, so later runs do not depend on the working
/// directory.
fn set_directory_field(
    engine: &mut BackupEngine,
    key: &str,
    path: &Path,
    must_exist: bool,
) -> Result<(), String> {
    let given = path
        .to_str()
        .ok_or_else(|| "Path is not valid UTF-8".to_string())?;
    let resolved = paths::resolve(given);

    if must_exist && !resolved.is_directory() {
        return Err(format!(
            "Not an existing directory: {}",
            resolved.absolute.display()
        ));
    }
    if !resolved.exists_or_creatable {
        return Err(format!("Path is not usable: {}", resolved.absolute.display()));
    }
    if resolved.exists && !resolved.is_directory() {
        return Err(format!("Not a directory: {}", resolved.absolute.display()));
    }

    let value = resolved
        .absolute
        .to_str()
        .ok_or_else(|| "Path is not valid UTF-8".to_string())?;
    engine
        .settings_mut()
        .set_field(PATHS_SECTION, key, value)
        .map_err(|e| e.to_string())?;
    println!("Settings saved: {}.{} = {}", PATHS_SECTION, key, value);
    Ok(())
}
