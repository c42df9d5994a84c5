use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{Settings, SettingsFile, Task, TasksFile};

const DATA_FILE: &str = "data.json";
const SETTINGS_FILE: &str = "settings.json";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        StorageError::Json(value)
    }
}

/// Persistent task records.
///
/// `save` replaces the whole persisted set; it either fully succeeds or leaves the
/// previously saved set in place.
pub trait TaskStore: Send + Sync {
    fn fetch(&self) -> Result<Vec<Task>, StorageError>;
    fn save(&self, tasks: &[Task]) -> Result<(), StorageError>;
}

/// Single-value key-value settings (the user's display name).
pub trait SettingsStore: Send + Sync {
    fn user_name(&self) -> Result<Option<String>, StorageError>;
    fn set_user_name(&self, name: &str) -> Result<(), StorageError>;
}

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn load_tasks(&self) -> Result<TasksFile, StorageError> {
        self.load_json(self.root.join(DATA_FILE))
    }

    pub fn load_settings(&self) -> Result<SettingsFile, StorageError> {
        self.load_json(self.root.join(SETTINGS_FILE))
    }

    pub fn save_tasks(&self, data: &TasksFile) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(DATA_FILE), data)
    }

    pub fn save_settings(&self, data: &SettingsFile) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(SETTINGS_FILE), data)
    }

    fn load_json<T: DeserializeOwned>(&self, path: PathBuf) -> Result<T, StorageError> {
        let mut file = File::open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    fn write_atomic<T: Serialize>(&self, path: PathBuf, data: &T) -> Result<(), StorageError> {
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(data)?;
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }
}

fn is_not_found(error: &StorageError) -> bool {
    matches!(error, StorageError::Io(io) if io.kind() == std::io::ErrorKind::NotFound)
}

impl TaskStore for Storage {
    fn fetch(&self) -> Result<Vec<Task>, StorageError> {
        match self.load_tasks() {
            Ok(data) => Ok(data.tasks),
            // First launch: nothing saved yet.
            Err(error) if is_not_found(&error) => Ok(Vec::new()),
            Err(error) => Err(error),
        }
    }

    fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let data = TasksFile {
            schema_version: SCHEMA_VERSION,
            tasks: tasks.to_vec(),
        };
        self.save_tasks(&data)
    }
}

impl SettingsStore for Storage {
    fn user_name(&self) -> Result<Option<String>, StorageError> {
        match self.load_settings() {
            Ok(data) => Ok(data.settings.user_name),
            Err(error) if is_not_found(&error) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn set_user_name(&self, name: &str) -> Result<(), StorageError> {
        let mut settings = match self.load_settings() {
            Ok(data) => data.settings,
            Err(error) if is_not_found(&error) => Settings::default(),
            Err(error) => return Err(error),
        };
        settings.user_name = Some(name.to_string());
        self.save_settings(&SettingsFile {
            schema_version: SCHEMA_VERSION,
            settings,
        })
    }
}
