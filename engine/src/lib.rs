//! # Folder Backup Engine
//!
//! A headless engine for versioned folder backups in Rust.
//! Designed as the foundation for multiple UIs (CLI, GUI, automation).
//!
//! ## Overview
//!
//! The engine snapshots a configured save directory into numbered
//! subdirectories of a configured backup root. It features:
//! - Path resolution with validity, existence and creatability checks
//! - A schema-backed settings file holding the two configured paths
//! - Monotonic version numbering (highest existing number plus one)
//! - Recursive tree copying with modification times preserved
//! - Progress reporting via a status sink (decoupled from UI technology)
//! - Comprehensive error handling
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{paths_schema, BackupEngine, NullSink, SettingsStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Open (or create) the settings file
//! let settings = SettingsStore::open("folder_backup_creator.ini", paths_schema())?;
//! let mut engine = BackupEngine::new(settings, Box::new(NullSink));
//!
//! // Point the engine at the folder to back up
//! engine
//!     .settings_mut()
//!     .set_field("paths", "save_directory_path", "/home/user/saves")?;
//!
//! // Make sure the backup root exists, then snapshot
//! let status = engine.ensure_backup_root_exists()?;
//! if status.ok {
//!     let report = engine.create_backup()?;
//!     println!("Backup {} written to {:?}", report.version, report.destination);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (ResolvedPath, BackupReport, StatusEvent)
//! - **error**: Error types and handling
//! - **paths**: Path resolution and directory/file creation
//! - **settings**: Schema-backed key-value settings file
//! - **fs_ops**: Recursive tree copying
//! - **backup**: Backup orchestration (versions, snapshots)
//! - **progress**: Status sink trait

pub mod model;
pub mod error;
pub mod paths;
pub mod settings;
pub mod fs_ops;
pub mod backup;
pub mod progress;

// Re-export main types and functions
pub use model::{BackupReport, ConfigStatus, PathKind, ResolvedPath, StatusEvent, StatusLevel};
pub use error::EngineError;
pub use backup::{
    paths_schema, BackupEngine, BACKUPS_DIRECTORY_KEY, PATHS_SECTION, SAVE_DIRECTORY_KEY,
};
pub use paths::resolve;
pub use progress::{NullSink, StatusSink};
pub use settings::{Field, Schema, Section, SettingsStore};
