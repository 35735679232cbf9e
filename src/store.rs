use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::layout::LayoutStrategy;

pub const SESSION_KEY: &str = "echo-session";
pub const HISTORY_KEY: &str = "echo-history";
const HISTORY_LIMIT: usize = 20;

/// Key-value store backed by a single JSON object file. Every failure is
/// logged and turned into the caller's default; nothing propagates.
/// Only unparseable content resets the file. A file that cannot be read is
/// left in place and saves are skipped until it reads again.
#[derive(Clone, Debug)]
pub struct LocalStore {
    path: Option<PathBuf>,
}

impl LocalStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store without durable backing: loads return defaults, saves are dropped.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(value) = self.load_all().remove(key) else {
            return default;
        };

        match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!("stored value for {key} is unreadable, using default: {error}");
                default
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        let map = match Self::read_map(path) {
            StoreRead::Entries(map) => map,
            StoreRead::Corrupt(error) => {
                Self::reset(path, &error);
                Map::new()
            }
            StoreRead::Unreadable(error) => {
                warn!("not persisting {key}, local store unreadable: {error:#}");
                return;
            }
        };

        if let Err(error) = Self::write_entry(path, map, key, value) {
            warn!("unable to persist {key}: {error:#}");
        }
    }

    fn load_all(&self) -> Map<String, Value> {
        let Some(path) = self.path.as_deref() else {
            return Map::new();
        };

        match Self::read_map(path) {
            StoreRead::Entries(map) => map,
            StoreRead::Corrupt(error) => {
                Self::reset(path, &error);
                Map::new()
            }
            StoreRead::Unreadable(error) => {
                warn!("local store unreadable, using defaults: {error:#}");
                Map::new()
            }
        }
    }

    fn reset(path: &Path, error: &anyhow::Error) {
        warn!("local store corrupt, resetting: {error:#}");
        if let Err(remove_error) = fs::remove_file(path) {
            warn!("unable to reset local store: {remove_error}");
        }
    }

    fn read_map(path: &Path) -> StoreRead {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return StoreRead::Entries(Map::new());
            }
            // Non-UTF-8 bytes are content damage, not an access problem.
            Err(error) if error.kind() == ErrorKind::InvalidData => {
                return StoreRead::Corrupt(
                    anyhow::Error::new(error)
                        .context(format!("{} is not UTF-8", path.display())),
                );
            }
            Err(error) => {
                return StoreRead::Unreadable(
                    anyhow::Error::new(error)
                        .context(format!("failed to read {}", path.display())),
                );
            }
        };

        match Self::parse_map(path, &raw) {
            Ok(map) => StoreRead::Entries(map),
            Err(error) => StoreRead::Corrupt(error),
        }
    }

    fn parse_map(path: &Path, raw: &str) -> Result<Map<String, Value>> {
        let parsed: Value = serde_json::from_str(raw)
            .with_context(|| format!("invalid JSON in {}", path.display()))?;
        match parsed {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("{} does not hold a JSON object", path.display()),
        }
    }

    fn write_entry<T: Serialize>(
        path: &Path,
        mut map: Map<String, Value>,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(value).context("value is not serializable")?;
        map.insert(key.to_owned(), value);

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let raw = serde_json::to_string_pretty(&Value::Object(map))
            .context("failed to encode local store")?;
        fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))
    }
}

enum StoreRead {
    Entries(Map<String, Value>),
    Corrupt(anyhow::Error),
    Unreadable(anyhow::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub words: Vec<String>,
    pub style_id: String,
    pub usage_id: String,
    pub cloud_enabled: bool,
    pub strategy: LayoutStrategy,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            words: Vec::new(),
            style_id: "poetique".to_owned(),
            usage_id: "therapie".to_owned(),
            cloud_enabled: false,
            strategy: LayoutStrategy::Orbital,
        }
    }
}

impl Session {
    pub fn load(store: &LocalStore) -> Self {
        store.load(SESSION_KEY, Self::default())
    }

    pub fn persist(&self, store: &LocalStore) {
        store.save(SESSION_KEY, self);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResonanceRecord {
    pub timestamp_ms: u64,
    pub pair: [String; 2],
    pub text: String,
}

impl ResonanceRecord {
    pub fn now(pair: [String; 2], text: String) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        Self {
            timestamp_ms,
            pair,
            text,
        }
    }
}

pub fn load_history(store: &LocalStore) -> Vec<ResonanceRecord> {
    store.load(HISTORY_KEY, Vec::new())
}

/// Prepends a record, keeping the newest entries only.
pub fn record_resonance(store: &LocalStore, record: ResonanceRecord) -> Vec<ResonanceRecord> {
    let mut history = load_history(store);
    history.insert(0, record);
    history.truncate(HISTORY_LIMIT);
    store.save(HISTORY_KEY, &history);
    history
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::at(dir.path().join("nested").join("store.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_returns_default() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load("absent", 7u32), 7);
    }

    #[test]
    fn save_then_load_roundtrips_session() {
        let (_dir, store) = temp_store();
        let session = Session {
            words: vec!["pluie".to_owned()],
            cloud_enabled: true,
            strategy: LayoutStrategy::Physics,
            ..Session::default()
        };
        session.persist(&store);
        assert_eq!(Session::load(&store), session);
    }

    #[test]
    fn corrupt_file_falls_back_and_resets() {
        let (dir, store) = temp_store();
        let path = dir.path().join("nested").join("store.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(store.load("key", String::from("fallback")), "fallback");
        assert!(!path.exists());

        store.save("key", &"value");
        assert_eq!(store.load("key", String::new()), "value");
    }

    #[test]
    fn non_object_root_is_reset() {
        let (dir, store) = temp_store();
        let path = dir.path().join("nested").join("store.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert_eq!(store.load("key", 4u32), 4);
        assert!(!path.exists());
    }

    #[test]
    fn unreadable_store_is_left_alone() {
        let (dir, _) = temp_store();
        // A directory in place of the file fails to read without being corrupt.
        let path = dir.path().join("store.json");
        fs::create_dir_all(path.join("inner")).unwrap();
        let store = LocalStore::at(&path);

        assert_eq!(store.load("key", 5u32), 5);
        store.save("key", &6u32);

        assert!(path.is_dir());
        assert!(path.join("inner").exists());
    }

    #[test]
    fn mistyped_value_uses_default() {
        let (_dir, store) = temp_store();
        store.save("count", &"not a number");
        assert_eq!(store.load("count", 3u32), 3);
    }

    #[test]
    fn disabled_store_is_inert() {
        let store = LocalStore::disabled();
        store.save("key", &1u32);
        assert_eq!(store.load("key", 9u32), 9);
        assert!(store.path().is_none());
    }

    #[test]
    fn history_keeps_newest_twenty() {
        let (_dir, store) = temp_store();
        for index in 0..25 {
            record_resonance(
                &store,
                ResonanceRecord {
                    timestamp_ms: index,
                    pair: ["a".to_owned(), "b".to_owned()],
                    text: format!("line {index}"),
                },
            );
        }

        let history = load_history(&store);
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].timestamp_ms, 24);
    }
}
