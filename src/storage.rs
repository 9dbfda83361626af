//! On-device persistence for diary entries and the saved store config.
//!
//! Storage is a data directory holding one JSON file per key:
//! ```text
//! <DATA_DIR>/
//!   diary-entries.json   { "entries": [...], "updatedAt": "..." }
//!   store-config.json    { "binId": "...", "masterKey": "...", "accessKey": "..." }
//! ```
//!
//! Each operation comes in two flavours. The `try_` methods return
//! [`StorageError`] for callers that want to match on it; the plain methods
//! log the failure and hand back a benign default, so a broken or missing
//! medium never stops the diary from working.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::{
    normalize_entries, sort_by_date, timestamp_from_value, Entry, RawStoreConfig, StoreConfig,
};

const PROBE_FILE: &str = ".storage-probe";

/// Keys available in local storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Entries,
    StoreConfig,
}

impl StorageKey {
    /// Returns the filename for this key.
    pub fn filename(&self) -> &'static str {
        match self {
            StorageKey::Entries => "diary-entries.json",
            StorageKey::StoreConfig => "store-config.json",
        }
    }
}

/// Entries read from local storage together with their save time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalSnapshot {
    pub entries: Vec<Entry>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntriesPayload<'a> {
    entries: &'a [Entry],
    updated_at: DateTime<Utc>,
}

/// Errors that can occur during local storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// No storage medium is configured.
    Unavailable,
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// File content is not valid JSON.
    ParseError(PathBuf, serde_json::Error),
    /// File is valid JSON but not in a recognized layout.
    UnexpectedShape(PathBuf),
    /// Serializing a payload failed.
    SerializeError(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "Local storage is not available"),
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::ParseError(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
            StorageError::UnexpectedShape(path) => {
                write!(f, "Unexpected data layout in {}", path.display())
            }
            StorageError::SerializeError(e) => write!(f, "Failed to serialize payload: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            StorageError::ParseError(_, e) => Some(e),
            StorageError::SerializeError(e) => Some(e),
            _ => None,
        }
    }
}

/// Local storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: Option<PathBuf>,
}

impl LocalStore {
    /// Creates a store backed by `data_dir`. The directory is created lazily.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
        }
    }

    /// Creates a store with no medium behind it. Every probe fails.
    pub fn disabled() -> Self {
        Self { data_dir: None }
    }

    /// Returns the data directory, if any.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Returns the full path for a key.
    pub fn path(&self, key: StorageKey) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(key.filename()))
    }

    /// Checks that the medium accepts writes by writing and removing a sentinel.
    pub fn detect_storage_support(&self) -> bool {
        match self.probe() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Local storage not available: {}", e);
                false
            }
        }
    }

    fn probe(&self) -> Result<(), StorageError> {
        let dir = self.data_dir.as_ref().ok_or(StorageError::Unavailable)?;
        fs::create_dir_all(dir).map_err(|e| StorageError::IoError(dir.clone(), e))?;

        let sentinel = dir.join(PROBE_FILE);
        fs::write(&sentinel, b"1").map_err(|e| StorageError::IoError(sentinel.clone(), e))?;
        fs::remove_file(&sentinel).map_err(|e| StorageError::IoError(sentinel, e))?;
        Ok(())
    }

    /// Reads the raw content of a key. `Ok(None)` if nothing is stored.
    ///
    /// Probes first: data left on a medium that no longer accepts writes is
    /// not trusted.
    fn read_key(&self, key: StorageKey) -> Result<Option<(PathBuf, String)>, StorageError> {
        self.probe()?;
        let path = self.path(key).ok_or(StorageError::Unavailable)?;
        match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some((path, raw))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    fn write_key<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> Result<(), StorageError> {
        self.probe()?;
        let path = self.path(key).ok_or(StorageError::Unavailable)?;
        let json = serde_json::to_string(value).map_err(StorageError::SerializeError)?;
        fs::write(&path, json).map_err(|e| StorageError::IoError(path, e))
    }

    /// Reads the stored entries, normalized and sorted.
    ///
    /// Accepts both the current `{ entries, updatedAt }` layout and the older
    /// bare array.
    pub fn try_read_entries(&self) -> Result<LocalSnapshot, StorageError> {
        let (path, raw) = match self.read_key(StorageKey::Entries)? {
            Some(found) => found,
            None => return Ok(LocalSnapshot::default()),
        };

        let payload: Value =
            serde_json::from_str(&raw).map_err(|e| StorageError::ParseError(path.clone(), e))?;

        match payload {
            Value::Array(items) => Ok(LocalSnapshot {
                entries: normalize_entries(items),
                updated_at: None,
            }),
            Value::Object(mut map) => match map.remove("entries") {
                Some(Value::Array(items)) => Ok(LocalSnapshot {
                    entries: normalize_entries(items),
                    updated_at: timestamp_from_value(map.get("updatedAt")),
                }),
                _ => Err(StorageError::UnexpectedShape(path)),
            },
            _ => Err(StorageError::UnexpectedShape(path)),
        }
    }

    /// Reads the stored entries. Empty when unsupported, absent or corrupt.
    pub fn read_entries(&self) -> LocalSnapshot {
        if self.data_dir.is_none() {
            return LocalSnapshot::default();
        }
        self.try_read_entries().unwrap_or_else(|e| {
            tracing::warn!("Local entries could not be read: {}", e);
            LocalSnapshot::default()
        })
    }

    /// Writes the entries (normalized) with the given save time.
    pub fn try_write_entries(
        &self,
        entries: &[Entry],
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let normalized = sort_by_date(entries.to_vec());
        self.write_key(
            StorageKey::Entries,
            &EntriesPayload {
                entries: &normalized,
                updated_at,
            },
        )
    }

    /// Writes the entries. Returns `false` instead of failing.
    pub fn write_entries(&self, entries: &[Entry], updated_at: DateTime<Utc>) -> bool {
        match self.try_write_entries(entries, updated_at) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Local backup could not be saved: {}", e);
                false
            }
        }
    }

    /// Reads the saved store config. `Ok(None)` if absent or invalid.
    pub fn try_read_stored_config(&self) -> Result<Option<StoreConfig>, StorageError> {
        match self.read_key(StorageKey::StoreConfig)? {
            Some((path, raw)) => {
                let config: RawStoreConfig =
                    serde_json::from_str(&raw).map_err(|e| StorageError::ParseError(path, e))?;
                Ok(config.normalize())
            }
            None => Ok(None),
        }
    }

    pub fn read_stored_config(&self) -> Option<StoreConfig> {
        if self.data_dir.is_none() {
            return None;
        }
        self.try_read_stored_config().unwrap_or_else(|e| {
            tracing::warn!("Saved store config could not be read: {}", e);
            None
        })
    }

    pub fn try_write_stored_config(&self, config: &StoreConfig) -> Result<(), StorageError> {
        self.write_key(StorageKey::StoreConfig, config)
    }

    pub fn write_stored_config(&self, config: &StoreConfig) -> bool {
        match self.try_write_stored_config(config) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Store config could not be saved: {}", e);
                false
            }
        }
    }

    /// Removes the saved store config. Succeeds when nothing was saved.
    pub fn try_clear_stored_config(&self) -> Result<(), StorageError> {
        self.probe()?;
        let path = self
            .path(StorageKey::StoreConfig)
            .ok_or(StorageError::Unavailable)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    pub fn clear_stored_config(&self) -> bool {
        match self.try_clear_stored_config() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Store config could not be removed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn test_store() -> (LocalStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    /// A store whose data directory sits below a regular file, so every write fails.
    fn broken_store() -> (LocalStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        (LocalStore::new(blocker.join("data")), temp_dir)
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_key_filenames() {
        assert_eq!(StorageKey::Entries.filename(), "diary-entries.json");
        assert_eq!(StorageKey::StoreConfig.filename(), "store-config.json");
    }

    #[test]
    fn test_probe_creates_directory_and_leaves_no_sentinel() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let store = LocalStore::new(nested.clone());

        assert!(store.detect_storage_support());
        assert!(nested.exists());
        assert!(!nested.join(PROBE_FILE).exists());
    }

    #[test]
    fn test_probe_fails_softly() {
        let (store, _temp) = broken_store();
        assert!(!store.detect_storage_support());
        assert!(!LocalStore::disabled().detect_storage_support());
    }

    #[test]
    fn test_read_nonexistent_is_empty() {
        let (store, _temp) = test_store();
        let snapshot = store.read_entries();
        assert!(snapshot.entries.is_empty());
        assert!(snapshot.updated_at.is_none());
    }

    #[test]
    fn test_write_and_read_entries() {
        let (store, _temp) = test_store();
        let entries = vec![
            Entry::new("2024-01-06").with_mood("😐 Neutral"),
            Entry::new("2024-01-05").with_mood("🙂 Gut"),
        ];

        assert!(store.write_entries(&entries, ts()));

        let snapshot = store.read_entries();
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.entries[0].date, "2024-01-05");
        assert_eq!(snapshot.updated_at, Some(ts()));
    }

    #[test]
    fn test_reads_legacy_bare_array() {
        let (store, temp) = test_store();
        fs::write(
            temp.path().join("diary-entries.json"),
            r#"[{"datum":"2024-01-02","konz":"gut"},{"datum":"2024-01-01"}]"#,
        )
        .unwrap();

        let snapshot = store.read_entries();
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.entries[0].date, "2024-01-01");
        assert_eq!(snapshot.entries[1].concentration_morning, "gut");
        assert!(snapshot.updated_at.is_none());
    }

    #[test]
    fn test_unparsable_updated_at_reads_as_none() {
        let (store, temp) = test_store();
        fs::write(
            temp.path().join("diary-entries.json"),
            r#"{"entries":[{"datum":"2024-01-01"}],"updatedAt":"last week"}"#,
        )
        .unwrap();

        let snapshot = store.read_entries();
        assert_eq!(snapshot.entries.len(), 1);
        assert!(snapshot.updated_at.is_none());
    }

    #[test]
    fn test_corrupt_payload_is_empty() {
        let (store, temp) = test_store();
        fs::write(temp.path().join("diary-entries.json"), "{not json").unwrap();

        assert!(matches!(
            store.try_read_entries(),
            Err(StorageError::ParseError(_, _))
        ));
        assert!(store.read_entries().entries.is_empty());
    }

    #[test]
    fn test_unexpected_shape_is_empty() {
        let (store, temp) = test_store();
        fs::write(temp.path().join("diary-entries.json"), r#"{"items":[]}"#).unwrap();

        assert!(matches!(
            store.try_read_entries(),
            Err(StorageError::UnexpectedShape(_))
        ));
        assert_eq!(store.read_entries(), LocalSnapshot::default());
    }

    #[test]
    fn test_unsupported_storage_fails_softly() {
        let (store, _temp) = broken_store();
        assert_eq!(store.read_entries(), LocalSnapshot::default());
        assert!(!store.write_entries(&[Entry::new("2024-01-05")], ts()));

        let disabled = LocalStore::disabled();
        assert_eq!(disabled.read_entries(), LocalSnapshot::default());
        assert!(!disabled.write_entries(&[Entry::new("2024-01-05")], ts()));
        assert!(matches!(
            disabled.try_write_entries(&[], ts()),
            Err(StorageError::Unavailable)
        ));
    }

    #[test]
    fn test_stored_config_roundtrip_and_clear() {
        let (store, _temp) = test_store();
        assert!(store.read_stored_config().is_none());

        let config = StoreConfig::new("bin-1").with_master_key("secret");
        assert!(store.write_stored_config(&config));
        assert_eq!(store.read_stored_config(), Some(config));

        assert!(store.clear_stored_config());
        assert!(store.read_stored_config().is_none());
        // Clearing twice is fine
        assert!(store.clear_stored_config());
    }

    #[test]
    fn test_invalid_stored_config_is_none() {
        let (store, temp) = test_store();
        fs::write(
            temp.path().join("store-config.json"),
            r#"{"binId":"","masterKey":"k"}"#,
        )
        .unwrap();
        assert!(store.read_stored_config().is_none());

        fs::write(temp.path().join("store-config.json"), "garbage").unwrap();
        assert!(store.read_stored_config().is_none());
    }

    #[test]
    fn test_failed_probe_hides_existing_data() {
        let (store, temp) = test_store();
        assert!(store.write_entries(&[Entry::new("2024-01-05")], ts()));
        assert!(store.write_stored_config(&StoreConfig::new("bin-x")));

        // A directory at the sentinel path makes the probe write fail
        fs::create_dir(temp.path().join(PROBE_FILE)).unwrap();

        assert!(!store.detect_storage_support());
        assert_eq!(store.read_entries(), LocalSnapshot::default());
        assert!(store.read_stored_config().is_none());
        assert!(matches!(
            store.try_read_entries(),
            Err(StorageError::IoError(..))
        ));
    }

    #[test]
    fn test_stored_config_fails_softly_without_medium() {
        let (store, _temp) = broken_store();
        let config = StoreConfig::new("bin-1");
        assert!(!store.write_stored_config(&config));
        assert!(!store.clear_stored_config());
        assert!(store.read_stored_config().is_none());
    }
}
