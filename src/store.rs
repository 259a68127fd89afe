//! Persisted client state
//!
//! The server binding (network, name, URL, catalog ETag, acknowledged update
//! version) and the last raw catalog, so the client can show titles before the
//! first sync completes.
//! Files live at ~/.local/share/homevideo/{server.toml,titles.json}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::models::ServerRecord;

/// Storage error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not encode server record: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Could not decode server record: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("Could not determine data directory")]
    NoDataDir,
}

/// Key/value persistence for the client
pub trait ClientStore: Send + Sync {
    /// Stored record, or an empty one if nothing was saved yet
    fn load_record(&self) -> Result<ServerRecord, StoreError>;

    fn save_record(&self, record: &ServerRecord) -> Result<(), StoreError>;

    /// Last raw catalog payload, if any
    fn load_catalog(&self) -> Result<Option<Vec<u8>>, StoreError>;

    fn save_catalog(&self, raw: &[u8]) -> Result<(), StoreError>;

    /// Drop the record and cached catalog
    fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed store
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default location (~/.local/share/homevideo)
    pub fn default_location() -> Result<Self, StoreError> {
        dirs::data_dir()
            .map(|p| Self::new(p.join("homevideo")))
            .ok_or(StoreError::NoDataDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self) -> PathBuf {
        self.dir.join("server.toml")
    }

    fn catalog_path(&self) -> PathBuf {
        self.dir.join("titles.json")
    }

    /// Write via a temporary file so a crash never leaves a partial file
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_optional(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

impl ClientStore for FileStore {
    fn load_record(&self) -> Result<ServerRecord, StoreError> {
        match read_optional(&self.record_path())? {
            Some(bytes) => Ok(toml::from_str(&String::from_utf8_lossy(&bytes))?),
            None => Ok(ServerRecord::default()),
        }
    }

    fn save_record(&self, record: &ServerRecord) -> Result<(), StoreError> {
        let toml = toml::to_string_pretty(record)?;
        self.write_atomic(&self.record_path(), toml.as_bytes())
    }

    fn load_catalog(&self) -> Result<Option<Vec<u8>>, StoreError> {
        read_optional(&self.catalog_path())
    }

    fn save_catalog(&self, raw: &[u8]) -> Result<(), StoreError> {
        self.write_atomic(&self.catalog_path(), raw)
    }

    fn clear(&self) -> Result<(), StoreError> {
        remove_optional(&self.record_path())?;
        remove_optional(&self.catalog_path())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    record: ServerRecord,
    catalog: Option<Vec<u8>>,
}

/// In-memory store; clones share the same state
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a record
    pub fn with_record(record: ServerRecord) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.record = record;
        }
        store
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Io(std::io::Error::other("memory store poisoned")))
    }
}

impl ClientStore for MemoryStore {
    fn load_record(&self) -> Result<ServerRecord, StoreError> {
        Ok(self.lock()?.record.clone())
    }

    fn save_record(&self, record: &ServerRecord) -> Result<(), StoreError> {
        self.lock()?.record = record.clone();
        Ok(())
    }

    fn load_catalog(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock()?.catalog.clone())
    }

    fn save_catalog(&self, raw: &[u8]) -> Result<(), StoreError> {
        self.lock()?.catalog = Some(raw.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.record = ServerRecord::default();
        state.catalog = None;
        Ok(())
    }
}
