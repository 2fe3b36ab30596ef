//! Backup orchestration module.
//!
//! `BackupEngine` ties the pieces together: it reads the two configured
//! paths from the settings store, re-resolves them on every operation,
//! enumerates the numerically named snapshot directories under the backup
//! root, and performs the snapshot copy. Progress and failure notices go to
//! the status sink.

use std::path::PathBuf;
use log::debug;
use crate::error::EngineError;
use crate::fs_ops;
use crate::model::{BackupReport, ConfigStatus, ResolvedPath, StatusEvent};
use crate::paths;
use crate::progress::StatusSink;
use crate::settings::{Field, Schema, Section, SettingsStore};

/// Name of the settings section holding the two directory paths.
pub const PATHS_SECTION: &str = "paths";

/// Key of the directory that gets backed up.
pub const SAVE_DIRECTORY_KEY: &str = "save_directory_path";

/// Key of the directory backups are stored under.
pub const BACKUPS_DIRECTORY_KEY: &str = "backups_directory_path";

/// The settings schema the backup engine expects its store to carry.
pub fn paths_schema() -> Schema {
    Schema::new(vec![Section::new(
        PATHS_SECTION,
        vec![
            Field::new(SAVE_DIRECTORY_KEY, "None"),
            Field::new(BACKUPS_DIRECTORY_KEY, "./saveBackups"),
        ],
    )])
}

/// Versioned folder-backup engine.
///
/// The engine owns its settings store and a status sink. It keeps no path
/// state of its own: the configured source and backup root are read from the
/// store and re-resolved on every operation, so external changes to the
/// settings file or the filesystem are picked up call by call.
pub struct BackupEngine {
    settings: SettingsStore,
    sink: Box<dyn StatusSink>,
}

impl BackupEngine {
    /// Create an engine over `settings`, emitting notices to `sink`.
    pub fn new(settings: SettingsStore, sink: Box<dyn StatusSink>) -> BackupEngine {
        BackupEngine { settings, sink }
    }

    /// The underlying settings store.
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Mutable access to the underlying settings store.
    pub fn settings_mut(&mut self) -> &mut SettingsStore {
        &mut self.settings
    }

    /// Resolve the currently configured save directory.
    ///
    /// # Errors
    /// Fails only when reading the field has to materialize its default and
    /// persisting that fails.
    pub fn save_path(&mut self) -> Result<ResolvedPath, EngineError> {
        let value = self.settings.get_field(PATHS_SECTION, SAVE_DIRECTORY_KEY)?;
        Ok(paths::resolve(&value))
    }

    /// Resolve the currently configured backup root.
    ///
    /// # Errors
    /// Fails only when reading the field has to materialize its default and
    /// persisting that fails.
    pub fn backup_root(&mut self) -> Result<ResolvedPath, EngineError> {
        let value = self.settings.get_field(PATHS_SECTION, BACKUPS_DIRECTORY_KEY)?;
        Ok(paths::resolve(&value))
    }

    /// True iff the save directory and the backup root both exist and are
    /// directories. This is the precondition gate for every mutating
    /// operation.
    pub fn paths_configured_correctly(&mut self) -> Result<bool, EngineError> {
        let save = self.save_path()?;
        let root = self.backup_root()?;
        Ok(save.is_directory() && root.is_directory())
    }

    /// Create the backup root if it is creatable but missing, then report
    /// whether the configuration ended up usable.
    ///
    /// The save directory is never created; the user's data directory is not
    /// something this system fabricates. A missing save directory is reported
    /// distinctly from any other unmet condition.
    ///
    /// # Errors
    /// Returns EngineError::DirectoryCreateFailed if creating the backup root
    /// fails.
    pub fn ensure_backup_root_exists(&mut self) -> Result<ConfigStatus, EngineError> {
        let root = self.backup_root()?;
        if root.exists_or_creatable && !root.exists {
            paths::create_directory(&root.absolute)?;
        }

        if self.paths_configured_correctly()? {
            Ok(ConfigStatus::correct())
        } else if !self.save_path()?.exists {
            Ok(ConfigStatus::incorrect("Save directory path does not exist"))
        } else {
            Ok(ConfigStatus::incorrect("Unknown error"))
        }
    }

    /// Version numbers of the existing snapshots, newest first.
    ///
    /// Children of the backup root whose names are not canonical decimal
    /// integers are not part of the version sequence and are skipped.
    ///
    /// # Errors
    /// Returns EngineError::ListFailed if the backup root cannot be listed.
    pub fn list_versions(&mut self) -> Result<Vec<u64>, EngineError> {
        let root = self.backup_root()?;
        let names = paths::list_subdirectories(&root.absolute)?;

        let mut versions = Vec::new();
        for name in names {
            match parse_version_name(&name) {
                Some(version) => versions.push(version),
                None => debug!("ignoring non-version directory {:?}", name),
            }
        }
        versions.sort_unstable_by(|a, b| b.cmp(a));
        Ok(versions)
    }

    /// The number the next snapshot will receive.
    ///
    /// One more than the highest existing version, or 0 for an empty backup
    /// root. Gap-tolerant: numbers of versions deleted out-of-band are never
    /// reused. Saturates at the numeric limit, where the follow-up directory
    /// creation fails on the taken name instead of wrapping back to 0.
    pub fn next_version(&mut self) -> Result<u64, EngineError> {
        let versions = self.list_versions()?;
        Ok(versions
            .first()
            .map_or(0, |latest| latest.saturating_add(1)))
    }

    /// Full path of the most recent snapshot directory, or `None` when no
    /// backups exist yet.
    pub fn latest_version_path(&mut self) -> Result<Option<PathBuf>, EngineError> {
        let root = self.backup_root()?;
        let versions = self.list_versions()?;
        Ok(versions
            .first()
            .map(|latest| root.absolute.join(latest.to_string())))
    }

    /// Create a new snapshot of the save directory under the backup root.
    ///
    /// Creates `<backupRoot>/<nextVersion>` and copies the full source tree
    /// into `<backupRoot>/<nextVersion>/<sourceBasename>`. Each step emits a
    /// notice to the status sink.
    ///
    /// # Errors
    /// * EngineError::ConfigInvalid, before any I/O, when the paths are not
    ///   usable directories
    /// * EngineError::PersistFailed / EngineError::ListFailed when reading
    ///   the configured paths or scanning the version sequence fails
    /// * EngineError::DirectoryCreateFailed when the version directory cannot
    ///   be created (including a pre-existing name); no copy is attempted
    /// * EngineError::CopyFailed on the first failure mid-copy; the partial
    ///   destination is left in place
    pub fn create_backup(&mut self) -> Result<BackupReport, EngineError> {
        let configured = self
            .paths_configured_correctly()
            .map_err(|e| self.report_failure(e))?;
        if !configured {
            let err = EngineError::ConfigInvalid {
                reason: "save directory and backup root must be existing directories".to_string(),
            };
            return Err(self.report_failure(err));
        }
        self.sink.emit(StatusEvent::info("Creating backup"));

        let save = self.save_path().map_err(|e| self.report_failure(e))?;
        let basename = match save.absolute.file_name() {
            Some(name) => name.to_os_string(),
            None => {
                let err = EngineError::ConfigInvalid {
                    reason: format!(
                        "cannot determine the directory name of {}",
                        save.absolute.display()
                    ),
                };
                return Err(self.report_failure(err));
            }
        };

        let version = self.next_version().map_err(|e| self.report_failure(e))?;
        let root = self.backup_root().map_err(|e| self.report_failure(e))?;
        let version_dir = root.absolute.join(version.to_string());

        self.sink.emit(StatusEvent::info("Creating backup directory"));
        if let Err(e) = paths::create_directory(&version_dir) {
            self.sink.emit(StatusEvent::error(format!(
                "Creation of the directory {} failed",
                version_dir.display()
            )));
            return Err(e);
        }
        self.sink.emit(StatusEvent::info(format!(
            "Successfully created the directory {}",
            version_dir.display()
        )));

        let destination = version_dir.join(&basename);
        self.sink.emit(StatusEvent::info(
            "Copying files from save folder to backup folder",
        ));
        match fs_ops::copy_tree(&save.absolute, &destination) {
            Ok(stats) => {
                self.sink.emit(StatusEvent::info(format!(
                    "Files copied successfully into {}",
                    destination.display()
                )));
                Ok(BackupReport {
                    version,
                    destination,
                    files_copied: stats.files_copied,
                    bytes_copied: stats.bytes_copied,
                })
            }
            Err(e) => Err(self.report_failure(e)),
        }
    }

    /// Emit `err` to the status sink and hand it back for propagation.
    fn report_failure(&self, err: EngineError) -> EngineError {
        self.sink.emit(StatusEvent::error(err.to_string()));
        err
    }
}

/// Parse a directory name as a version number.
///
/// Only canonical decimal representations count: `"007"` or `"+7"` name
/// directories that are not part of the version sequence.
fn parse_version_name(name: &str) -> Option<u64> {
    let version: u64 = name.parse().ok()?;
    if version.to_string() == name {
        Some(version)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatusLevel;
    use crate::progress::NullSink;
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    // Test helper: sink recording every event for inspection.
    #[derive(Clone)]
    struct CollectingSink {
        events: Arc<Mutex<Vec<StatusEvent>>>,
    }

    impl CollectingSink {
        fn new() -> CollectingSink {
            CollectingSink {
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn messages(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.message.clone())
                .collect()
        }

        fn levels(&self) -> Vec<StatusLevel> {
            self.events.lock().unwrap().iter().map(|e| e.level).collect()
        }
    }

    impl StatusSink for CollectingSink {
        fn emit(&self, event: StatusEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn open_engine(temp: &Path, sink: Box<dyn StatusSink>) -> BackupEngine {
        let store = SettingsStore::open(temp.join("settings.ini"), paths_schema())
            .expect("Failed to open store");
        BackupEngine::new(store, sink)
    }

    fn configure(engine: &mut BackupEngine, save: &Path, root: &Path) {
        engine
            .settings_mut()
            .set_field(
                PATHS_SECTION,
                SAVE_DIRECTORY_KEY,
                save.to_str().expect("Temp path is not UTF-8"),
            )
            .expect("Failed to set save path");
        engine
            .settings_mut()
            .set_field(
                PATHS_SECTION,
                BACKUPS_DIRECTORY_KEY,
                root.to_str().expect("Temp path is not UTF-8"),
            )
            .expect("Failed to set backup root");
    }

    fn engine_with_dirs(temp: &Path) -> BackupEngine {
        let save = temp.join("project");
        let root = temp.join("backups");
        fs::create_dir(&save).expect("Failed to create save dir");
        fs::create_dir(&root).expect("Failed to create backup root");

        let mut engine = open_engine(temp, Box::new(NullSink));
        configure(&mut engine, &save, &root);
        engine
    }

    #[test]
    fn test_paths_not_configured_with_defaults() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut engine = open_engine(temp_dir.path(), Box::new(NullSink));

        let configured = engine
            .paths_configured_correctly()
            .expect("Failed to check configuration");
        assert!(!configured, "Default paths should not be usable");
    }

    #[test]
    fn test_paths_configured_correctly_with_real_dirs() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut engine = engine_with_dirs(temp_dir.path());

        let configured = engine
            .paths_configured_correctly()
            .expect("Failed to check configuration");
        assert!(configured);
    }

    #[test]
    fn test_ensure_backup_root_creates_missing_root() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let save = temp_dir.path().join("project");
        fs::create_dir(&save).expect("Failed to create save dir");
        let root = temp_dir.path().join("backups");

        let mut engine = open_engine(temp_dir.path(), Box::new(NullSink));
        configure(&mut engine, &save, &root);

        let status = engine
            .ensure_backup_root_exists()
            .expect("Failed to initialize paths");
        assert!(status.ok);
        assert!(root.is_dir(), "Backup root should have been created");
    }

    #[test]
    fn test_ensure_reports_missing_save_directory() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let save = temp_dir.path().join("missing_project");
        let root = temp_dir.path().join("backups");

        let mut engine = open_engine(temp_dir.path(), Box::new(NullSink));
        configure(&mut engine, &save, &root);

        let status = engine
            .ensure_backup_root_exists()
            .expect("Failed to initialize paths");
        assert!(!status.ok);
        assert_eq!(status.message, "Save directory path does not exist");
        assert!(root.is_dir(), "Backup root is created even when the source is missing");
    }

    #[test]
    fn test_list_versions_sorted_descending_ignoring_noise() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut engine = engine_with_dirs(temp_dir.path());
        let root = temp_dir.path().join("backups");

        for name in ["0", "3", "7", "abc", "007"] {
            fs::create_dir(root.join(name)).expect("Failed to create version dir");
        }
        fs::write(root.join("9"), "not a directory").expect("Failed to write file");

        let versions = engine.list_versions().expect("Failed to list versions");
        assert_eq!(versions, vec![7, 3, 0]);
    }

    #[test]
    fn test_next_version_on_empty_root_is_zero() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut engine = engine_with_dirs(temp_dir.path());

        let next = engine.next_version().expect("Failed to compute next version");
        assert_eq!(next, 0);
    }

    #[test]
    fn test_next_version_is_max_plus_one() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut engine = engine_with_dirs(temp_dir.path());
        let root = temp_dir.path().join("backups");

        for name in ["0", "3", "7"] {
            fs::create_dir(root.join(name)).expect("Failed to create version dir");
        }

        let next = engine.next_version().expect("Failed to compute next version");
        assert_eq!(next, 8, "Numbering is gap-tolerant");
    }

    #[test]
    fn test_version_numbers_saturate_at_the_numeric_limit() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut engine = engine_with_dirs(temp_dir.path());
        let root = temp_dir.path().join("backups");
        fs::create_dir(root.join(u64::MAX.to_string())).expect("Failed to create version dir");

        let next = engine.next_version().expect("Failed to compute next version");
        assert_eq!(next, u64::MAX, "The sequence saturates instead of wrapping");

        let err = engine.create_backup().expect_err("Backup should fail");
        assert!(matches!(err, EngineError::DirectoryCreateFailed { .. }));
        assert!(!root.join("0").exists(), "Version numbers are never reused");
    }

    #[test]
    fn test_latest_version_path() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut engine = engine_with_dirs(temp_dir.path());
        let root = temp_dir.path().join("backups");

        let latest = engine
            .latest_version_path()
            .expect("Failed to query latest version");
        assert!(latest.is_none(), "No backups yet is a normal outcome");

        for name in ["0", "3", "7"] {
            fs::create_dir(root.join(name)).expect("Failed to create version dir");
        }

        let latest = engine
            .latest_version_path()
            .expect("Failed to query latest version");
        assert_eq!(latest, Some(root.join("7")));
    }

    #[test]
    fn test_create_backup_produces_versioned_copies() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut engine = engine_with_dirs(temp_dir.path());
        let save = temp_dir.path().join("project");
        let root = temp_dir.path().join("backups");

        fs::write(save.join("a.txt"), "alpha").expect("Failed to write a.txt");
        fs::create_dir(save.join("sub")).expect("Failed to create subdir");
        fs::write(save.join("sub").join("b.txt"), "beta").expect("Failed to write b.txt");

        let report = engine.create_backup().expect("Failed to create backup");
        assert_eq!(report.version, 0);
        assert_eq!(report.destination, root.join("0").join("project"));
        assert_eq!(report.files_copied, 2);
        assert_eq!(report.bytes_copied, 9);

        let a = fs::read_to_string(root.join("0").join("project").join("a.txt"))
            .expect("Failed to read copied a.txt");
        assert_eq!(a, "alpha");
        let b = fs::read_to_string(root.join("0").join("project").join("sub").join("b.txt"))
            .expect("Failed to read copied b.txt");
        assert_eq!(b, "beta");

        let report = engine.create_backup().expect("Failed to create second backup");
        assert_eq!(report.version, 1);
        assert!(root.join("1").join("project").join("a.txt").is_file());

        let latest = engine
            .latest_version_path()
            .expect("Failed to query latest version");
        assert_eq!(latest, Some(root.join("1")));
    }

    #[test]
    fn test_create_backup_fails_when_source_missing() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let save = temp_dir.path().join("missing_project");
        let root = temp_dir.path().join("backups");
        fs::create_dir(&root).expect("Failed to create backup root");

        let mut engine = open_engine(temp_dir.path(), Box::new(NullSink));
        configure(&mut engine, &save, &root);

        let err = engine.create_backup().expect_err("Backup should fail");
        assert!(matches!(err, EngineError::ConfigInvalid { .. }));

        let children = fs::read_dir(&root).expect("Failed to list root").count();
        assert_eq!(children, 0, "No version directory may be created");
    }

    #[test]
    fn test_create_backup_emits_steps_to_sink() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let sink = CollectingSink::new();

        let save = temp_dir.path().join("project");
        let root = temp_dir.path().join("backups");
        fs::create_dir(&save).expect("Failed to create save dir");
        fs::create_dir(&root).expect("Failed to create backup root");
        fs::write(save.join("a.txt"), "alpha").expect("Failed to write a.txt");

        let mut engine = open_engine(temp_dir.path(), Box::new(sink.clone()));
        configure(&mut engine, &save, &root);
        engine.create_backup().expect("Failed to create backup");

        let messages = sink.messages();
        assert_eq!(messages[0], "Creating backup");
        assert!(messages
            .last()
            .expect("Expected events")
            .starts_with("Files copied successfully into"));
        assert!(sink.levels().iter().all(|level| *level == StatusLevel::Info));
    }

    #[test]
    fn test_create_backup_failure_emits_error_event() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let sink = CollectingSink::new();
        let mut engine = open_engine(temp_dir.path(), Box::new(sink.clone()));

        let result = engine.create_backup();
        assert!(result.is_err());
        assert!(sink.levels().contains(&StatusLevel::Error));
    }

    #[test]
    fn test_create_backup_settings_failure_emits_error_event() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let sink = CollectingSink::new();

        let save = temp_dir.path().join("project");
        let root = temp_dir.path().join("backups");
        fs::create_dir(&save).expect("Failed to create save dir");
        fs::create_dir(&root).expect("Failed to create backup root");

        let config_dir = temp_dir.path().join("cfg");
        fs::create_dir(&config_dir).expect("Failed to create config dir");
        let store = SettingsStore::open(config_dir.join("settings.ini"), paths_schema())
            .expect("Failed to open store");
        let mut engine = BackupEngine::new(store, Box::new(sink.clone()));
        configure(&mut engine, &save, &root);
        engine
            .settings_mut()
            .set_field(PATHS_SECTION, SAVE_DIRECTORY_KEY, "")
            .expect("Failed to blank field");

        // With the backing file gone, the default cannot be rematerialized.
        fs::remove_dir_all(&config_dir).expect("Failed to remove config dir");

        let err = engine.create_backup().expect_err("Backup should fail");
        assert!(matches!(err, EngineError::PersistFailed { .. }));
        assert!(sink.levels().contains(&StatusLevel::Error));
    }

    #[test]
    fn test_parse_version_name_rejects_non_canonical() {
        assert_eq!(parse_version_name("0"), Some(0));
        assert_eq!(parse_version_name("42"), Some(42));
        assert_eq!(parse_version_name("007"), None);
        assert_eq!(parse_version_name("+7"), None);
        assert_eq!(parse_version_name(" 7"), None);
        assert_eq!(parse_version_name("-1"), None);
        assert_eq!(parse_version_name("abc"), None);
        assert_eq!(parse_version_name(""), None);
    }
}
