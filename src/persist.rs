use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::history::{MatchRecord, records_from_values};
use crate::http_cache::app_cache_dir;
use crate::session::SessionToken;

const STORAGE_FILE: &str = "storage.json";
pub const SESSION_KEY: &str = "admin_session";
pub const HISTORY_KEY: &str = "historial_partidos";

/// Key/value JSON file standing in for browser local storage.
///
/// A value that cannot be decoded is removed on read and reported as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Option<Self> {
        app_cache_dir().map(|dir| Self::at(dir.join(STORAGE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_session(&self) -> Option<SessionToken> {
        let value = self.get(SESSION_KEY)?;
        match serde_json::from_value::<SessionToken>(decode_string(value)) {
            Ok(token) => Some(token),
            Err(_) => {
                let _ = self.remove(SESSION_KEY);
                None
            }
        }
    }

    pub fn save_session(&self, token: SessionToken) -> Result<()> {
        let value = serde_json::to_value(token).context("serialize session")?;
        self.set(SESSION_KEY, value)
    }

    pub fn clear_session(&self) -> Result<()> {
        self.remove(SESSION_KEY)
    }

    pub fn load_history(&self) -> Option<Vec<MatchRecord>> {
        let value = decode_string(self.get(HISTORY_KEY)?);
        match value.as_array() {
            Some(rows) => Some(records_from_values(rows)),
            None => {
                let _ = self.remove(HISTORY_KEY);
                None
            }
        }
    }

    pub fn save_history(&self, records: &[MatchRecord]) -> Result<()> {
        let value = serde_json::to_value(records).context("serialize history")?;
        self.set(HISTORY_KEY, value)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut all = self.read_all();
        all.insert(key.to_string(), value);
        self.write_all(&all)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut all = self.read_all();
        if all.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&all)
    }

    fn read_all(&self) -> Map<String, Value> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    fn write_all(&self, all: &Map<String, Value>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(all).context("serialize storage")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).context("write storage")?;
        fs::rename(&tmp, &self.path).context("swap storage")?;
        Ok(())
    }
}

/// Values written by a browser are JSON text inside a JSON string.
fn decode_string(value: Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::Null),
        other => other,
    }
}
