//! Filesystem operations module.
//!
//! This module provides the low-level copy machinery behind a backup:
//! - Recursively copying a directory tree
//! - Copying single files with modification-time preservation

use std::fs;
use std::io;
use std::path::Path;
use crate::error::EngineError;

/// Counters accumulated while copying a tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyStats {
    /// Number of regular files copied
    pub files_copied: u64,

    /// Total bytes copied across all files
    pub bytes_copied: u64,

    /// Number of directories created at the destination
    pub dirs_created: u64,
}

/// Recursively copy the tree rooted at `source` to `destination`.
///
/// `destination` itself is created (its parent must already exist) and must
/// not exist beforehand. The relative structure of the source is preserved,
/// empty directories included; file modification times are carried over.
/// Symlinks are followed, so linked content is copied as plain entries.
///
/// # Arguments
/// * `source` - Existing directory to copy from
/// * `destination` - Directory to create and copy into
///
/// # Returns
/// CopyStats with file, byte and directory counts
///
/// # Errors
/// Returns EngineError::CopyFailed on the first I/O failure. Whatever was
/// already copied is left in place; there is no rollback.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<CopyStats, EngineError> {
    let mut stats = CopyStats::default();

    fn recurse(src: &Path, dst: &Path, stats: &mut CopyStats) -> Result<(), EngineError> {
        fs::create_dir(dst).map_err(|e| EngineError::CopyFailed {
            path: dst.to_path_buf(),
            source: e,
        })?;
        stats.dirs_created += 1;

        let entries = fs::read_dir(src).map_err(|e| EngineError::CopyFailed {
            path: src.to_path_buf(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::CopyFailed {
                path: src.to_path_buf(),
                source: e,
            })?;
            let entry_path = entry.path();
            let metadata = fs::metadata(&entry_path).map_err(|e| EngineError::CopyFailed {
                path: entry_path.clone(),
                source: e,
            })?;
            let target = dst.join(entry.file_name());

            if metadata.is_dir() {
                recurse(&entry_path, &target, stats)?;
            } else {
                let bytes = copy_file_with_mtime(&entry_path, &target)?;
                stats.files_copied += 1;
                stats.bytes_copied += bytes;
            }
        }
        Ok(())
    }

    recurse(source, destination, &mut stats)?;
    Ok(stats)
}

/// Copy a file from `src` to `dst`, preserving the modification time.
///
/// # Arguments
/// * `src` - Source file path
/// * `dst` - Destination file path
///
/// # Returns
/// Number of bytes copied
///
/// # Errors
/// Returns EngineError::CopyFailed if the copy fails
pub fn copy_file_with_mtime(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    let mut src_file = fs::File::open(src).map_err(|e| EngineError::CopyFailed {
        path: src.to_path_buf(),
        source: e,
    })?;

    // Source metadata for the modification time
    let src_metadata = src_file.metadata().map_err(|e| EngineError::CopyFailed {
        path: src.to_path_buf(),
        source: e,
    })?;
    let src_mtime = src_metadata.modified().ok();

    let mut dst_file = fs::File::create(dst).map_err(|e| EngineError::CopyFailed {
        path: dst.to_path_buf(),
        source: e,
    })?;

    let bytes_copied = io::copy(&mut src_file, &mut dst_file).map_err(|e| {
        EngineError::CopyFailed {
            path: dst.to_path_buf(),
            source: e,
        }
    })?;

    // Preserve modification time if available
    if let Some(mtime) = src_mtime {
        let _ = filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(mtime));
    }

    Ok(bytes_copied)
}
