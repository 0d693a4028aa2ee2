// src/core/settings.rs

use crate::{core::paths, models::Settings};
use log::{debug, error, warn};
use serde_json::{Map, Value};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Represents errors that can occur while persisting settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A filesystem I/O error occurred.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// The settings could not be converted to or from JSON.
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The file on disk holds valid JSON that is not an object, so merging into it
    /// would destroy its contents.
    #[error("Refusing to overwrite '{path}': it does not contain a JSON object.")]
    NotAnObject {
        /// The settings file.
        path: PathBuf,
    },
    /// The temporary file could not be moved into place.
    #[error("Could not replace the settings file: {0}")]
    Persist(#[from] tempfile::PersistError),
    /// The configuration directory could not be determined.
    #[error("Path error: {0}")]
    Path(#[from] paths::PathError),
}

/// Reads and writes the settings file at a fixed location.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// A store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A store for `<config_dir>/scriptdeck/settings.json`.
    pub fn from_default_location() -> Result<Self, SettingsError> {
        Ok(Self::new(paths::get_settings_path()?))
    }

    /// The settings file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the settings.
    ///
    /// A missing file yields the defaults silently. An unreadable or invalid file
    /// is logged and also yields the defaults.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("No settings at '{}'; using defaults.", self.path.display());
                Settings::default()
            }
            Err(e) => {
                error!("Could not load settings from '{}': {}", self.path.display(), e);
                Settings::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<Settings>, SettingsError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Writes `settings`, merging its top-level keys into whatever the file
    /// already holds so that keys written by other tools survive.
    ///
    /// The new content is written to a temporary file next to the target and
    /// then moved over it.
    pub fn try_save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let mut merged = self.read_existing_object()?;
        if let Value::Object(fields) = serde_json::to_value(settings)? {
            merged.extend(fields);
        }

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut temp_file = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut temp_file, &Value::Object(merged))?;
        temp_file.write_all(b"\n")?;
        temp_file.flush()?;
        temp_file.persist(&self.path)?;

        debug!("Settings saved to '{}'.", self.path.display());
        Ok(())
    }

    /// Like [`try_save`](Self::try_save), but logs failures instead of returning them.
    pub fn save(&self, settings: &Settings) -> bool {
        match self.try_save(settings) {
            Ok(()) => true,
            Err(e) => {
                error!("Could not save settings: {}", e);
                false
            }
        }
    }

    /// The current file as a JSON object. A missing, empty or unparseable file
    /// counts as an empty object; valid JSON of another shape is an error.
    fn read_existing_object(&self) -> Result<Map<String, Value>, SettingsError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SettingsError::NotAnObject {
                path: self.path.clone(),
            }),
            Err(e) => {
                warn!(
                    "Existing settings at '{}' are not valid JSON ({}); they will be replaced.",
                    self.path.display(),
                    e
                );
                Ok(Map::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScriptDirectoryInfo;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("settings.json"))
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store(&dir).load(), Settings::default());
    }

    #[test]
    fn test_invalid_json_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "{ not json").unwrap();
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_load_reads_camel_case_keys() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(
            store.path(),
            r#"{ "bashPath": "zsh -l", "directories": [{"fullPath": "/opt/scripts"}], "launchTimeoutSecs": 30 }"#,
        )
        .unwrap();

        let settings = store.load();
        assert_eq!(settings.bash_path, "zsh -l");
        assert_eq!(settings.directories, vec![ScriptDirectoryInfo::new("/opt/scripts")]);
        assert_eq!(settings.launch_timeout_secs, Some(30));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), r#"{ "directories": [] }"#).unwrap();
        assert_eq!(store.load().bash_path, Settings::default().bash_path);
    }

    #[test]
    fn test_save_merges_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(
            store.path(),
            r#"{ "theme": "dark", "bashPath": "old", "window": { "width": 800 } }"#,
        )
        .unwrap();

        let settings = Settings {
            bash_path: "bash".to_string(),
            directories: vec![ScriptDirectoryInfo::new("/home/me/scripts")],
            launch_timeout_secs: None,
        };
        store.try_save(&settings).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(saved["theme"], "dark");
        assert_eq!(saved["window"]["width"], 800);
        assert_eq!(saved["bashPath"], "bash");
        assert_eq!(saved["directories"][0]["fullPath"], "/home/me/scripts");
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_save_creates_missing_parent() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("nested/config/settings.json"));
        assert!(store.save(&Settings::default()));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_save_refuses_non_object_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "[1, 2, 3]").unwrap();

        assert!(matches!(
            store.try_save(&Settings::default()),
            Err(SettingsError::NotAnObject { .. })
        ));
        assert!(!store.save(&Settings::default()));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[1, 2, 3]");
    }
}
