//! Path classification and filesystem entry creation.
//!
//! `resolve` classifies any input string: whether the OS would accept it as a
//! pathname, whether it exists or could be created, and what kind of entry it
//! points at. It never fails; callers branch on the returned flags instead of
//! handling errors. The list/create helpers perform the few filesystem
//! operations the engine needs and map failures into `EngineError`.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR, MAIN_SEPARATOR_STR};
use log::debug;
use crate::model::{PathKind, ResolvedPath};
use crate::error::EngineError;

/// Classify a path string.
///
/// # Arguments
/// * `path_string` - Any string, including empty or malformed values
///
/// # Returns
/// A ResolvedPath snapshot of the string's validity, creatability, existence
/// and kind. Never fails, for any input; see the invariant on ResolvedPath.
pub fn resolve(path_string: &str) -> ResolvedPath {
    let absolute = absolutize(Path::new(path_string));
    let is_valid_syntax = is_pathname_valid(path_string);

    let metadata = if is_valid_syntax {
        fs::metadata(&absolute).ok()
    } else {
        None
    };
    let exists_or_creatable =
        is_valid_syntax && (metadata.is_some() || is_path_creatable(&absolute));

    let (exists, kind) = match metadata {
        Some(meta) => {
            let kind = if meta.is_dir() {
                PathKind::Directory
            } else {
                PathKind::File
            };
            (true, kind)
        }
        None => (false, PathKind::Unknown),
    };

    ResolvedPath {
        raw: path_string.to_string(),
        absolute,
        is_valid_syntax,
        exists_or_creatable,
        exists,
        kind,
    }
}

/// List the names of the immediate subdirectories of `path`.
///
/// # Arguments
/// * `path` - Directory to list
///
/// # Returns
/// Subdirectory names (not full paths) in unspecified order; callers sort.
///
/// # Errors
/// Returns EngineError::ListFailed if `path` cannot be read as a directory.
pub fn list_subdirectories(path: &Path) -> Result<Vec<String>, EngineError> {
    let entries = fs::read_dir(path).map_err(|e| EngineError::ListFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EngineError::ListFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        // Follows symlinks; children that cannot be stat'ed are skipped.
        let is_dir = fs::metadata(entry.path())
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if is_dir {
            match entry.file_name().to_str() {
                Some(name) => names.push(name.to_string()),
                None => debug!("ignoring non-UTF-8 directory name {:?}", entry.file_name()),
            }
        }
    }
    Ok(names)
}

/// Create the directory at `path`.
///
/// Parents are not created. Previously returned ResolvedPath values are
/// snapshots; callers re-resolve to observe the new entry.
///
/// # Errors
/// Returns EngineError::DirectoryCreateFailed if creation fails, including
/// when an entry already exists at `path`.
pub fn create_directory(path: &Path) -> Result<(), EngineError> {
    fs::create_dir(path).map_err(|e| EngineError::DirectoryCreateFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create the file at `path` and write `initial_content` to it.
///
/// An existing file is appended to, not truncated. Previously returned
/// ResolvedPath values are snapshots; callers re-resolve to observe the new
/// entry.
///
/// # Errors
/// Returns EngineError::FileCreateFailed if the file cannot be opened or
/// written.
pub fn create_file(path: &Path, initial_content: &str) -> Result<(), EngineError> {
    let mut file = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| EngineError::FileCreateFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    file.write_all(initial_content.as_bytes())
        .map_err(|e| EngineError::FileCreateFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// `true` if the passed string is a valid pathname for the current OS.
///
/// Each component is checked with a stat call against the filesystem root;
/// only the invalid-name class of error (name too long, illegal characters)
/// marks the pathname invalid. Not-found and permission errors say nothing
/// about syntax.
fn is_pathname_valid(pathname: &str) -> bool {
    if pathname.is_empty() {
        return false;
    }
    let root = Path::new(MAIN_SEPARATOR_STR);
    for part in pathname.split(MAIN_SEPARATOR) {
        if part.is_empty() {
            continue;
        }
        if let Err(e) = fs::symlink_metadata(root.join(part)) {
            if matches!(
                e.kind(),
                io::ErrorKind::InvalidFilename | io::ErrorKind::InvalidInput
            ) {
                return false;
            }
        }
    }
    true
}

/// `true` if the current process could create an entry at `path`: the parent
/// directory exists, is a directory, and is not read-only.
fn is_path_creatable(path: &Path) -> bool {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return false,
    };
    match fs::metadata(parent) {
        Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
        Err(_) => false,
    }
}

/// Normalize to an absolute path without touching the filesystem.
///
/// Relative paths are joined onto the current directory; `.` and `..`
/// segments are resolved lexically. Falls back to the input as given when the
/// current directory is unavailable.
fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_with_name = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if ends_with_name {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(Component::ParentDir.as_os_str());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
