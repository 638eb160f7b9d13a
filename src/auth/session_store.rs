//! Session persistence
//!
//! Both stores mimic browser local storage: a string map in which the
//! session record lives, JSON-encoded, under [`SESSION_STORAGE_KEY`].

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::domain::{SessionRecord, SESSION_STORAGE_KEY};
use crate::infra::{Result, SessionStore};

/// Process-local store
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value for a key
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        self.raw(SESSION_STORAGE_KEY)
            .map(|json| serde_json::from_str::<SessionRecord>(&json))
            .transpose()
            .map_err(Into::into)
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(SESSION_STORAGE_KEY.to_string(), json);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(SESSION_STORAGE_KEY);
        Ok(())
    }
}

/// JSON file holding a key/value map; other keys are preserved
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<HashMap<String, serde_json::Value>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &HashMap<String, serde_json::Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        let mut map = self.read_map()?;
        match map.remove(SESSION_STORAGE_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(SESSION_STORAGE_KEY.to_string(), serde_json::to_value(record)?);
        self.write_map(&map)?;
        debug!(path = %self.path.display(), email = %record.email, "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut map = self.read_map()?;
        if map.remove(SESSION_STORAGE_KEY).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{UserRecord, UserType};

    fn record() -> SessionRecord {
        let user = UserRecord {
            email: "officer@jharkhand.gov.in".into(),
            uid: "uid-9".into(),
            display_name: None,
        };
        SessionRecord::for_user(&user, UserType::Government, None)
    }

    #[test]
    fn test_in_memory_round_trip() {
        let store = InMemorySessionStore::new();
        assert!(store.load().unwrap().is_none());

        let record = record();
        store.save(&record).unwrap();
        assert!(store.raw(SESSION_STORAGE_KEY).unwrap().contains("\"userType\""));
        assert_eq!(store.load().unwrap(), Some(record));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let store = FileSessionStore::new(&path);
        let record = record();
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap(), Some(record));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("theme"));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested/storage.json"));
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
        store.save(&record()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_file_store_rejects_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(store.load().is_err());
    }
}
