use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::store::write_atomic;

/// Returns the data directory.
///
/// The path is determined in the following order:
/// 1. `MONTHLY_DATA_DIR` environment variable.
/// 2. `~/.local/share/monthly` (on Linux).
/// 3. `./monthly` (fallback).
pub fn data_dir() -> PathBuf {
    std::env::var("MONTHLY_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("monthly");
        p
    })
}

/// Device-local string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Key-value storage backed by a single JSON object on disk.
pub struct FileKv {
    path: PathBuf,
}

impl FileKv {
    pub fn open(dir: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join("local_storage.json"),
        })
    }

    fn load(&self) -> Result<BTreeMap<String, String>, AppError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, map: &BTreeMap<String, String>) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(map)?;
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut map = self.load()?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }
}
