//! The unit-local key-value store
//!
//! Values are arbitrary JSON documents. Writes are buffered in memory and only
//! reach the backing medium on `flush`, so a hook that fails halfway through
//! leaves the previously flushed state untouched

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::KvError;

/// A unit-local key-value store
pub trait UnitKv {
    /// Get the value stored under `key`
    fn get(&self, key: &str) -> Option<&Value>;
    /// Store `value` under `key`, overwriting any previous value
    fn set(&mut self, key: &str, value: Value);
    /// Remove the value stored under `key`, returning it
    fn unset(&mut self, key: &str) -> Option<Value>;
    /// Persist all buffered writes
    fn flush(&mut self) -> Result<(), KvError>;

    /// Get and deserialize the value stored under `key`
    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, KvError> {
        self.get(key).map(|v| serde_json::from_value(v.clone())).transpose().map_err(Into::into)
    }

    /// Serialize and store a value under `key`
    fn set_typed<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), KvError> {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }
}

// -------------
// | Memory KV |
// -------------

/// A store that lives only as long as the process
#[derive(Clone, Debug, Default)]
pub struct MemoryKv {
    /// The stored values
    values: BTreeMap<String, Value>,
}

impl MemoryKv {
    /// Constructor
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnitKv for MemoryKv {
    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn unset(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    fn flush(&mut self) -> Result<(), KvError> {
        Ok(())
    }
}

// -----------
// | File KV |
// -----------

/// A store backed by a single JSON document on disk
#[derive(Debug)]
pub struct FileKv {
    /// The path of the backing document
    path: PathBuf,
    /// The values as of the last load plus buffered writes
    values: BTreeMap<String, Value>,
    /// Whether there are writes not yet flushed
    dirty: bool,
}

impl FileKv {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KvError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() { BTreeMap::new() } else { serde_json::from_str(&contents)? }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = values.len(), "opened unit kv");
        Ok(Self { path, values, dirty: false })
    }

    /// The path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UnitKv for FileKv {
    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        if self.values.get(key) != Some(&value) {
            self.values.insert(key.to_string(), value);
            self.dirty = true;
        }
    }

    fn unset(&mut self, key: &str) -> Option<Value> {
        let prev = self.values.remove(key);
        self.dirty |= prev.is_some();
        prev
    }

    fn flush(&mut self) -> Result<(), KvError> {
        if !self.dirty {
            return Ok(());
        }

        // Write to a sibling temp file and rename over the target so readers
        // never observe a partial document
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.values)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| KvError::Io(e.to_string()))?;

        debug!(path = %self.path.display(), "flushed unit kv");
        self.dirty = false;
        Ok(())
    }
}
