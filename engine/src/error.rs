//! Error types for the backup engine.
//!
//! The primary error type is `EngineError`, covering the I/O failures the
//! engine surfaces to callers. Path validity questions are never errors:
//! `paths::resolve` answers those as data on `ResolvedPath`, so callers can
//! render path state without try/catch scaffolding.

use std::fmt::{Display, self};
use std::path::PathBuf;
use std::io;
use std::error::Error;

/// Errors that can occur during settings persistence or backup execution.
///
/// These errors are non-recoverable for the operation that produced them and
/// should stop it. The engine never retries; every failure is surfaced to the
/// caller and to the status sink.
#[derive(Debug)]
pub enum EngineError {
    /// Source or backup root is not a usable existing directory
    ConfigInvalid { reason: String },

    /// Failed to create a directory
    DirectoryCreateFailed { path: PathBuf, source: io::Error },

    /// Failed to create a file
    FileCreateFailed { path: PathBuf, source: io::Error },

    /// Failed to copy a file or directory into the snapshot
    CopyFailed { path: PathBuf, source: io::Error },

    /// Failed to list the children of a directory
    ListFailed { path: PathBuf, source: io::Error },

    /// Failed to read or write the settings file
    PersistFailed { path: PathBuf, source: io::Error },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigInvalid { reason } => {
                write!(f, "Paths not configured correctly: {}", reason)
            }
            Self::DirectoryCreateFailed { path, .. } => {
                write!(f, "Failed to create directory: {}", path.display())
            }
            Self::FileCreateFailed { path, .. } => {
                write!(f, "Failed to create file: {}", path.display())
            }
            Self::CopyFailed { path, .. } => {
                write!(f, "Failed to copy: {}", path.display())
            }
            Self::ListFailed { path, .. } => {
                write!(f, "Failed to list directory: {}", path.display())
            }
            Self::PersistFailed { path, .. } => {
                write!(f, "Failed to write settings file: {}", path.display())
            }
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConfigInvalid { .. } => None,
            Self::DirectoryCreateFailed { source, .. }
            | Self::FileCreateFailed { source, .. }
            | Self::CopyFailed { source, .. }
            | Self::ListFailed { source, .. }
            | Self::PersistFailed { source, .. } => Some(source),
        }
    }
}

impl EngineError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<u32> {
        match self {
            Self::DirectoryCreateFailed { source, .. }
            | Self::FileCreateFailed { source, .. }
            | Self::CopyFailed { source, .. }
            | Self::ListFailed { source, .. }
            | Self::PersistFailed { source, .. } => {
                source.raw_os_error().map(|e| e as u32)
            }
            Self::ConfigInvalid { .. } => None,
        }
    }
}
