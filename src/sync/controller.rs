//! Decides where the diary lives on every read and write.
//!
//! The controller prefers the remote store when one is configured, falls back
//! to local storage when the remote fails, and keeps entries in memory when
//! there is no usable storage medium. A write is never dropped: if the remote
//! push fails the normalized entries still land locally (or in the session
//! cache), and the remote error is kept for display.

use chrono::{DateTime, NaiveDate, Utc};

use super::state::{Mode, Source, SyncState};
use super::status::{build_history_summary, fallback_tone, mode_status_message, Status, Tone};
use crate::models::{sort_by_date, Entry, RawStoreConfig};
use crate::remote::{RemoteError, RemoteStore};
use crate::resolver::resolve_config;
use crate::storage::{LocalSnapshot, LocalStore};

/// Result of [`SyncController::load_entries`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub entries: Vec<Entry>,
    pub updated_at: Option<DateTime<Utc>>,
    pub source: Source,
    pub cloud_error: Option<RemoteError>,
}

/// Result of [`SyncController::delete_entry`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// Entry removed; holds the collection as persisted.
    Deleted(Vec<Entry>),
    /// No entry with that date exists.
    NotFound,
}

/// Errors returned by controller operations that validate input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Entry date is not a `YYYY-MM-DD` calendar date
    InvalidDate(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::InvalidDate(date) => {
                write!(f, "Invalid date '{}': expected YYYY-MM-DD", date)
            }
        }
    }
}

impl std::error::Error for SyncError {}

fn validate_date(date: &str) -> Result<(), SyncError> {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) if parsed.format("%Y-%m-%d").to_string() == date => Ok(()),
        _ => Err(SyncError::InvalidDate(date.to_string())),
    }
}

/// Owns the sync state for one session.
pub struct SyncController {
    inline: Option<RawStoreConfig>,
    local: LocalStore,
    remote: Box<dyn RemoteStore>,
    storage_available: bool,
    state: SyncState,
    status: Status,
}

impl SyncController {
    /// Probes local storage and resolves the store config.
    ///
    /// Starts in `cloud` mode when a config is present (nothing has failed
    /// yet), otherwise in `local` or `memory` depending on storage.
    pub fn new(
        inline: Option<RawStoreConfig>,
        local: LocalStore,
        remote: Box<dyn RemoteStore>,
    ) -> Self {
        let storage_available = local.detect_storage_support();
        let mut controller = Self {
            inline,
            local,
            remote,
            storage_available,
            state: SyncState::new(Mode::Memory),
            status: Status::new("Not loaded yet", Tone::Info),
        };
        controller.refresh_active_config();
        controller
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Last collection successfully read or written.
    pub fn entries(&self) -> &[Entry] {
        &self.state.cached_entries
    }

    pub fn storage_available(&self) -> bool {
        self.storage_available
    }

    pub fn local_store(&self) -> &LocalStore {
        &self.local
    }

    pub fn remote_backend(&self) -> &str {
        self.remote.backend_name()
    }

    /// Status line for the cached collection in the current mode.
    pub fn history_status(&self) -> Status {
        let message = mode_status_message(
            self.state.mode,
            &self.state.cached_entries,
            self.state.reference_timestamp(),
        );
        Status::new(message, self.mode_tone())
    }

    fn offline_mode(&self) -> Mode {
        if self.storage_available {
            Mode::Local
        } else {
            Mode::Memory
        }
    }

    fn mode_tone(&self) -> Tone {
        match self.state.mode {
            Mode::Cloud => Tone::Success,
            Mode::Local | Mode::Memory => fallback_tone(self.storage_available),
        }
    }

    /// Re-reads the store config; a config may have changed since the last call.
    pub fn refresh_active_config(&mut self) {
        let resolved = resolve_config(self.inline.as_ref(), &self.local);
        self.state.mode = if resolved.config.is_some() {
            Mode::Cloud
        } else {
            // No remote left to have failed
            self.state.cloud_error = None;
            self.offline_mode()
        };
        self.state.active_config = resolved.config;
        self.state.origin = resolved.origin;
    }

    /// Local entries, or the session cache when there is no storage medium.
    fn offline_snapshot(&self) -> LocalSnapshot {
        if self.storage_available {
            self.local.read_entries()
        } else {
            LocalSnapshot {
                entries: self.state.cached_entries.clone(),
                updated_at: self.state.cached_updated_at,
            }
        }
    }

    /// Best-effort copy of remote data into local storage.
    fn mirror_locally(&mut self, entries: &[Entry], updated_at: DateTime<Utc>) {
        if self.storage_available && self.local.write_entries(entries, updated_at) {
            self.state.last_local_save = Some(updated_at);
        }
    }

    /// Saves locally when possible and always replaces the cache.
    fn save_offline(&mut self, entries: &[Entry]) {
        let now = Utc::now();
        if self.storage_available && self.local.write_entries(entries, now) {
            self.state.last_local_save = Some(now);
        }
        self.state.cached_entries = entries.to_vec();
        self.state.cached_updated_at = Some(now);
    }

    /// Reads the diary without touching the sync state.
    ///
    /// With `prefer_cloud` and an active config the remote store is tried
    /// first; on failure the error is returned alongside the local data.
    pub async fn load_entries(&self, prefer_cloud: bool) -> LoadResult {
        let mut cloud_error = None;

        if let (true, Some(config)) = (prefer_cloud, self.state.active_config.as_ref()) {
            match self.remote.fetch_entries(config).await {
                Ok(snapshot) => {
                    return LoadResult {
                        entries: snapshot.entries,
                        updated_at: Some(snapshot.updated_at),
                        source: Source::Cloud,
                        cloud_error: None,
                    };
                }
                Err(e) => {
                    tracing::warn!("Cloud could not be loaded: {}", e);
                    cloud_error = Some(e);
                }
            }
        }

        let local = self.offline_snapshot();
        LoadResult {
            entries: local.entries,
            updated_at: local.updated_at,
            source: Source::Local,
            cloud_error,
        }
    }

    /// Loads the diary at session start.
    pub async fn start(&mut self) -> &Status {
        self.refresh().await
    }

    /// Re-resolves the config, reloads the diary and updates the mode.
    ///
    /// A remote failure does not abort the refresh: local data is used and
    /// the error becomes part of the status.
    pub async fn refresh(&mut self) -> &Status {
        self.refresh_active_config();
        let result = self.load_entries(true).await;

        match result.source {
            Source::Cloud => {
                self.state.mode = Mode::Cloud;
                self.state.last_remote_sync = result.updated_at;
                self.state.cloud_error = None;
                if let Some(updated_at) = result.updated_at {
                    self.mirror_locally(&result.entries, updated_at);
                }
            }
            Source::Local => {
                self.state.mode = self.offline_mode();
                self.state.last_local_save = result.updated_at;
                if result.cloud_error.is_some() {
                    self.state.cloud_error = result.cloud_error.clone();
                }
            }
        }
        tracing::info!(
            "Loaded {} entries from {} ({} mode)",
            result.entries.len(),
            result.source,
            self.state.mode
        );

        self.state.cached_entries = result.entries;
        self.state.cached_updated_at = result.updated_at;

        self.status = match &result.cloud_error {
            Some(e) => {
                let fallback = if self.storage_available {
                    format!("Cloud sync unreachable ({}). Offline data active.", e)
                } else {
                    format!("Cloud sync unreachable ({}). Temporary data active.", e)
                };
                let message = if self.state.cached_entries.is_empty() {
                    fallback
                } else {
                    format!(
                        "{} {}",
                        fallback,
                        build_history_summary(
                            &self.state.cached_entries,
                            self.state.reference_timestamp()
                        )
                    )
                };
                Status::new(message, fallback_tone(self.storage_available))
            }
            None => self.history_status(),
        };
        &self.status
    }

    /// Latest authoritative collection to base a change on.
    ///
    /// Reads the remote store when configured so that a change never starts
    /// from a stale cache; falls back to offline data on failure.
    async fn entries_for_write(&mut self) -> Vec<Entry> {
        self.refresh_active_config();

        let config = match self.state.active_config.clone() {
            Some(config) => config,
            None => {
                let snapshot = self.offline_snapshot();
                if self.storage_available {
                    self.state.last_local_save = snapshot.updated_at;
                }
                return snapshot.entries;
            }
        };

        match self.remote.fetch_entries(&config).await {
            Ok(snapshot) => {
                self.state.mode = Mode::Cloud;
                self.state.last_remote_sync = Some(snapshot.updated_at);
                self.state.cloud_error = None;
                self.mirror_locally(&snapshot.entries, snapshot.updated_at);
                snapshot.entries
            }
            Err(e) => {
                tracing::warn!("Fetching before write failed: {}", e);
                self.state.mode = self.offline_mode();
                let snapshot = self.offline_snapshot();
                if self.storage_available {
                    self.state.last_local_save = snapshot.updated_at;
                }
                let message = if self.storage_available {
                    format!("Cloud sync unreachable ({}). Changes will be saved offline.", e)
                } else {
                    format!(
                        "Cloud sync unreachable ({}). Changes can only be kept temporarily.",
                        e
                    )
                };
                self.status = Status::new(message, fallback_tone(self.storage_available));
                self.state.cloud_error = Some(e);
                snapshot.entries
            }
        }
    }

    /// Persists a whole collection.
    ///
    /// Pushes to the remote store when configured and mirrors the result
    /// locally. Without a config, or when the push fails, the normalized
    /// entries are saved locally (or only cached when storage is missing).
    pub async fn persist_entries(&mut self, entries: Vec<Entry>) -> Vec<Entry> {
        let normalized = sort_by_date(entries);

        let config = match self.state.active_config.clone() {
            Some(config) => config,
            None => {
                self.state.mode = self.offline_mode();
                self.save_offline(&normalized);
                self.status = self.history_status();
                return normalized;
            }
        };

        match self.remote.push_entries(&config, &normalized).await {
            Ok(snapshot) => {
                self.state.mode = Mode::Cloud;
                self.state.last_remote_sync = Some(snapshot.updated_at);
                self.state.cloud_error = None;
                self.mirror_locally(&snapshot.entries, snapshot.updated_at);
                self.state.cached_entries = snapshot.entries.clone();
                self.state.cached_updated_at = Some(snapshot.updated_at);
                self.status = self.history_status();
                snapshot.entries
            }
            Err(e) => {
                tracing::warn!("Saving to cloud failed: {}", e);
                self.state.mode = self.offline_mode();
                self.save_offline(&normalized);
                let message = if self.storage_available {
                    format!("Cloud sync failed ({}). Entry saved offline.", e)
                } else {
                    format!("Cloud sync failed ({}). Entry kept only temporarily.", e)
                };
                self.status = Status::new(message, fallback_tone(self.storage_available));
                self.state.cloud_error = Some(e);
                normalized
            }
        }
    }

    /// Adds an entry, replacing any existing entry for the same date.
    pub async fn save_entry(&mut self, entry: Entry) -> Result<Vec<Entry>, SyncError> {
        validate_date(&entry.date)?;

        let mut base = self.entries_for_write().await;
        base.retain(|existing| existing.date != entry.date);
        base.push(entry);

        Ok(self.persist_entries(base).await)
    }

    /// Removes the entry for `date`.
    ///
    /// The base collection is re-read first so a deleted entry is not
    /// resurrected from a stale cache.
    pub async fn delete_entry(&mut self, date: &str) -> DeleteOutcome {
        tracing::info!("Deleting entry from {} ({} mode)", date, self.state.mode);

        let latest = self.entries_for_write().await;
        let before = latest.len();
        let next: Vec<Entry> = latest.into_iter().filter(|e| e.date != date).collect();

        if next.len() == before {
            self.status = Status::new(format!("No entry from {} found.", date), Tone::Error);
            return DeleteOutcome::NotFound;
        }

        DeleteOutcome::Deleted(self.persist_entries(next).await)
    }
}
