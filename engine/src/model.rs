//! Core data model for the backup engine.
//!
//! This module defines the main data structures shared across the engine:
//! - ResolvedPath: classification of a path string (validity, existence, kind)
//! - ConfigStatus: verdict from backup root initialization
//! - BackupReport: outcome of a completed backup
//! - StatusLevel, StatusEvent: entries emitted to the status sink

use std::path::PathBuf;
use chrono::{DateTime, Local};

/// Classification of a single path string at one point in time.
///
/// A ResolvedPath is an immutable snapshot: it is recomputed on demand via
/// `paths::resolve` and never refreshed in place. After creating or removing
/// filesystem entries, callers resolve again to observe the new state.
///
/// Invariant: `exists` implies `exists_or_creatable` implies
/// `is_valid_syntax`, and `kind` is `Unknown` whenever `exists` is false.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    /// The input string, unmodified
    pub raw: String,

    /// Normalized absolute form of the input
    pub absolute: PathBuf,

    /// Whether the OS would accept this string as a pathname at all
    pub is_valid_syntax: bool,

    /// Valid syntax AND (already exists OR its parent directory is writable)
    pub exists_or_creatable: bool,

    /// Whether an entry currently exists at this path
    pub exists: bool,

    /// What the entry is; `Unknown` unless `exists` is true
    pub kind: PathKind,
}

impl ResolvedPath {
    /// Returns true if the path exists and is a directory.
    pub fn is_directory(&self) -> bool {
        self.exists && self.kind == PathKind::Directory
    }

    /// Returns true if the path exists and is a regular file.
    pub fn is_file(&self) -> bool {
        self.exists && self.kind == PathKind::File
    }
}

/// The kind of filesystem entry a resolved path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Nothing known; the path does not exist
    Unknown,
    /// A regular file (or anything that is not a directory)
    File,
    /// A directory
    Directory,
}

impl std::fmt::Display for PathKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathKind::Unknown => write!(f, "unknown"),
            PathKind::File => write!(f, "file"),
            PathKind::Directory => write!(f, "directory"),
        }
    }
}

/// Verdict returned by `BackupEngine::ensure_backup_root_exists`.
///
/// `ok` reports whether the configured paths ended up usable; when they did
/// not, `message` names the failing condition for display to the user.
#[derive(Debug, Clone)]
pub struct ConfigStatus {
    pub ok: bool,
    pub message: String,
}

impl ConfigStatus {
    /// Status for a correctly configured pair of paths.
    pub fn correct() -> ConfigStatus {
        ConfigStatus {
            ok: true,
            message: String::new(),
        }
    }

    /// Status carrying the reason the configuration is unusable.
    pub fn incorrect(message: impl Into<String>) -> ConfigStatus {
        ConfigStatus {
            ok: false,
            message: message.into(),
        }
    }
}

/// Outcome of a successfully completed backup.
#[derive(Debug)]
pub struct BackupReport {
    /// Version number assigned to this snapshot
    pub version: u64,

    /// Full path of the new snapshot directory (includes the source basename)
    pub destination: PathBuf,

    /// Number of regular files copied
    pub files_copied: u64,

    /// Total bytes copied across all files
    pub bytes_copied: u64,
}

/// Severity of a status sink entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusLevel::Info => write!(f, "INFO"),
            StatusLevel::Warn => write!(f, "WARN"),
            StatusLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One timestamped entry for the status sink.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    /// When the event was emitted
    pub timestamp: DateTime<Local>,

    /// Severity of the entry
    pub level: StatusLevel,

    /// Human-readable progress or failure notice
    pub message: String,
}

impl StatusEvent {
    /// Create an event stamped with the current local time.
    pub fn new(level: StatusLevel, message: impl Into<String>) -> StatusEvent {
        StatusEvent {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }

    /// Create an `Info` event.
    pub fn info(message: impl Into<String>) -> StatusEvent {
        StatusEvent::new(StatusLevel::Info, message)
    }

    /// Create a `Warn` event.
    pub fn warn(message: impl Into<String>) -> StatusEvent {
        StatusEvent::new(StatusLevel::Warn, message)
    }

    /// Create an `Error` event.
    pub fn error(message: impl Into<String>) -> StatusEvent {
        StatusEvent::new(StatusLevel::Error, message)
    }
}
