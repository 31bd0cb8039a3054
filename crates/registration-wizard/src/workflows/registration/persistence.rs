use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::domain::ApplicationForm;

/// Fixed key the in-progress answers live under.
pub const FORM_STORAGE_KEY: &str = "multiStepFormData";

/// String key-value storage, the shape of a browser's local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Port the wizard controller saves and restores its answers through.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<Option<ApplicationForm>, PersistenceError>;
    fn save(&self, form: &ApplicationForm) -> Result<(), PersistenceError>;
    fn clear(&self) -> Result<(), PersistenceError>;
}

impl<K> SnapshotStore for K
where
    K: KeyValueStore,
{
    fn load(&self) -> Result<Option<ApplicationForm>, PersistenceError> {
        match self.get(FORM_STORAGE_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, form: &ApplicationForm) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(&form.without_resume())?;
        self.set(FORM_STORAGE_KEY, &raw)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.remove(FORM_STORAGE_KEY)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("snapshot storage unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored snapshot is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Key-value store keeping one `<key>.json` file per entry inside a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.root)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(staging, path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let path = self.entry_path(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
