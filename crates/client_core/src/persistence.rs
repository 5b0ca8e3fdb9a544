//! Durable client-side storage for state that must survive restarts.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::ClientResult;

pub trait DurableStorage: Send + Sync {
    fn load(&self, namespace: &str) -> ClientResult<Option<String>>;
    fn save(&self, namespace: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, namespace: &str) -> ClientResult<()>;
}

/// One JSON document per namespace inside a data directory.
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{namespace}.json"))
    }
}

impl DurableStorage for JsonFileStorage {
    fn load(&self, namespace: &str) -> ClientResult<Option<String>> {
        let path = self.path_for(namespace);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, namespace: &str, value: &str) -> ClientResult<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(namespace);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        debug!(path = %path.display(), "persisted client state");
        Ok(())
    }

    fn remove(&self, namespace: &str) -> ClientResult<()> {
        match fs::remove_file(self.path_for(namespace)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Default, Clone)]
pub struct MemoryStorage {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn load(&self, namespace: &str) -> ClientResult<Option<String>> {
        Ok(self.records.lock().get(namespace).cloned())
    }

    fn save(&self, namespace: &str, value: &str) -> ClientResult<()> {
        self.records
            .lock()
            .insert(namespace.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, namespace: &str) -> ClientResult<()> {
        self.records.lock().remove(namespace);
        Ok(())
    }
}
