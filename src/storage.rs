use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Synchronous string key/value store that the session and the record store
/// persist into.
pub trait Substrate {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Volatile substrate backed by a map.
#[derive(Debug, Default, Clone)]
pub struct MemorySubstrate {
    entries: BTreeMap<String, String>,
}

impl MemorySubstrate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Substrate for MemorySubstrate {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Substrate kept in a single JSON object on disk.
///
/// The whole file is read once on open and rewritten on every change.
#[derive(Debug)]
pub struct FileSubstrate {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileSubstrate {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|source| Error::CorruptedStore {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = entries.len(), "opened file substrate");
        Ok(FileSubstrate { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let s = serde_json::to_string_pretty(&self.entries)?;
        // Write beside the target then rename so readers never see half a file.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, s.as_bytes())?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Substrate for FileSubstrate {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Returns the path to the store file.
///
/// The path is determined in the following order:
/// 1. `TASKFLOW_DB` environment variable.
/// 2. `configured`, usually the `data_file` config entry.
/// 3. `~/.local/share/taskflow/store.json` (on Linux).
/// 4. `./store.json` (fallback).
pub fn db_path(configured: Option<&Path>) -> PathBuf {
    if let Ok(p) = std::env::var("TASKFLOW_DB") {
        return PathBuf::from(p);
    }
    if let Some(p) = configured {
        return p.to_path_buf();
    }
    match dirs::data_local_dir() {
        Some(mut p) => {
            p.push("taskflow");
            p.push("store.json");
            p
        }
        None => PathBuf::from("store.json"),
    }
}
