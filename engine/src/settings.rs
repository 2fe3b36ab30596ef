//! Typed, defaulted settings persisted to a flat key-value file.
//!
//! A `Schema` declares named sections of defaulted fields once at startup; a
//! `SettingsStore` binds that schema to one on-disk file and keeps the two in
//! sync: every write persists the whole file immediately, and reading a field
//! whose stored value is empty materializes its default into the file first.
//! Keys are composed as `"<section>.<field>"`, one `key = value` pair per
//! line.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use log::debug;
use crate::error::EngineError;

/// A single named, defaulted configuration value within a section.
///
/// Fields are schema elements, not value holders; stored values live in the
/// SettingsStore.
#[derive(Debug, Clone)]
pub struct Field {
    /// Storage key, unique within the enclosing section
    pub key: String,

    /// Value materialized when the stored value is absent or empty
    pub default: String,
}

impl Field {
    pub fn new(key: &str, default: &str) -> Field {
        Field {
            key: key.to_string(),
            default: default.to_string(),
        }
    }
}

/// A named group of fields, namespacing their storage keys.
#[derive(Debug, Clone)]
pub struct Section {
    /// Section name, unique within the schema
    pub name: String,

    /// Fields in declaration order
    pub fields: Vec<Field>,
}

impl Section {
    pub fn new(name: &str, fields: Vec<Field>) -> Section {
        Section {
            name: name.to_string(),
            fields,
        }
    }
}

/// The fixed section/field registration backing a SettingsStore.
///
/// Built once at startup and passed into `SettingsStore::open`.
#[derive(Debug, Clone)]
pub struct Schema {
    sections: Vec<Section>,
}

impl Schema {
    /// Validate and assemble a schema.
    ///
    /// # Panics
    /// Duplicate or empty section names and duplicate or empty field keys are
    /// programmer errors and panic immediately.
    pub fn new(sections: Vec<Section>) -> Schema {
        let mut section_names: Vec<&str> = Vec::new();
        for section in &sections {
            assert!(!section.name.is_empty(), "section name must not be empty");
            assert!(
                !section_names.contains(&section.name.as_str()),
                "duplicate section name: {}",
                section.name
            );
            section_names.push(&section.name);

            let mut field_keys: Vec<&str> = Vec::new();
            for field in &section.fields {
                assert!(
                    !field.key.is_empty(),
                    "field key must not be empty in section {}",
                    section.name
                );
                assert!(
                    !field_keys.contains(&field.key.as_str()),
                    "duplicate field key in section {}: {}",
                    section.name,
                    field.key
                );
                field_keys.push(&field.key);
            }
        }
        Schema { sections }
    }

    /// Sections in declaration order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    fn default_for(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .and_then(|s| s.fields.iter().find(|f| f.key == key))
            .map(|f| f.default.as_str())
    }
}

/// A settings store bound to one flat key-value file.
///
/// Values are kept in memory and rewritten to disk in full on every change.
/// Keys parsed from the file that the schema does not declare are preserved
/// across saves.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    schema: Schema,
    values: BTreeMap<String, String>,
}

impl SettingsStore {
    /// Open the settings file at `path`, creating it empty if absent.
    ///
    /// After parsing, every declared field whose stored value is absent or
    /// empty and whose default is non-empty is materialized and persisted, so
    /// the file converges to explicit defaults at startup.
    ///
    /// # Errors
    /// Returns EngineError::PersistFailed if the file cannot be created, read
    /// or written.
    pub fn open<P: AsRef<Path>>(path: P, schema: Schema) -> Result<SettingsStore, EngineError> {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() {
            fs::write(&path, "").map_err(|e| EngineError::PersistFailed {
                path: path.clone(),
                source: e,
            })?;
            debug!("created settings file {}", path.display());
        }
        let contents = fs::read_to_string(&path).map_err(|e| EngineError::PersistFailed {
            path: path.clone(),
            source: e,
        })?;

        let mut store = SettingsStore {
            path,
            schema,
            values: parse(&contents),
        };
        store.materialize_defaults()?;
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The schema this store was opened with.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Read the value stored for `"<section>.<key>"`.
    ///
    /// Missing keys are not errors; absence reads as an empty string. When
    /// the stored value is empty and the declared field carries a non-empty
    /// default, the default is written through to disk first and returned.
    ///
    /// # Errors
    /// Returns EngineError::PersistFailed only when materializing a default
    /// fails to persist.
    pub fn get_field(&mut self, section: &str, key: &str) -> Result<String, EngineError> {
        let store_key = compose_key(section, key);
        let current = self.values.get(&store_key).cloned().unwrap_or_default();
        if current.is_empty() {
            if let Some(default) = self.schema.default_for(section, key) {
                if !default.is_empty() {
                    let default = default.to_string();
                    self.set_field(section, key, &default)?;
                    return Ok(default);
                }
            }
        }
        Ok(current)
    }

    /// Write `"<section>.<key>" = value` and persist the whole store.
    ///
    /// The in-memory value is committed only once persistence succeeds; on a
    /// failed write the previous value is restored.
    ///
    /// # Errors
    /// Returns EngineError::PersistFailed if the backing file cannot be
    /// written.
    pub fn set_field(&mut self, section: &str, key: &str, value: &str) -> Result<(), EngineError> {
        let store_key = compose_key(section, key);
        let previous = self.values.insert(store_key.clone(), value.to_string());
        if let Err(e) = self.save() {
            match previous {
                Some(old) => self.values.insert(store_key, old),
                None => self.values.remove(&store_key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn materialize_defaults(&mut self) -> Result<(), EngineError> {
        let mut pending = Vec::new();
        for section in self.schema.sections() {
            for field in &section.fields {
                if field.default.is_empty() {
                    continue;
                }
                let store_key = compose_key(&section.name, &field.key);
                let missing = self.values.get(&store_key).map_or(true, |v| v.is_empty());
                if missing {
                    pending.push((store_key, field.default.clone()));
                }
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        debug!(
            "materializing {} default value(s) into {}",
            pending.len(),
            self.path.display()
        );
        for (key, value) in pending {
            self.values.insert(key, value);
        }
        self.save()
    }

    fn save(&self) -> Result<(), EngineError> {
        let mut contents = String::new();
        for (key, value) in &self.values {
            contents.push_str(key);
            contents.push_str(" = ");
            contents.push_str(value);
            contents.push('\n');
        }
        fs::write(&self.path, contents).map_err(|e| EngineError::PersistFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}

fn compose_key(section: &str, key: &str) -> String {
    format!("{}.{}", section, key)
}

fn parse(contents: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                values.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    values
}
