use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Entry, StoreConfig};
use crate::remote::RemoteError;
use crate::resolver::ConfigOrigin;

/// Current persistence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Remote store configured and reachable
    Cloud,
    /// Falling back to local storage
    Local,
    /// No storage medium; entries only live for this session
    Memory,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Cloud => write!(f, "cloud"),
            Mode::Local => write!(f, "local"),
            Mode::Memory => write!(f, "memory"),
        }
    }
}

/// Where a loaded collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cloud,
    Local,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Cloud => write!(f, "cloud"),
            Source::Local => write!(f, "local"),
        }
    }
}

/// Working state of a [`SyncController`](super::SyncController).
#[derive(Debug, Clone)]
pub struct SyncState {
    pub active_config: Option<StoreConfig>,
    pub origin: Option<ConfigOrigin>,
    pub mode: Mode,
    pub last_remote_sync: Option<DateTime<Utc>>,
    pub last_local_save: Option<DateTime<Utc>>,
    /// Last collection successfully read or written
    pub cached_entries: Vec<Entry>,
    pub cached_updated_at: Option<DateTime<Utc>>,
    /// Most recent remote failure, cleared by the next remote success
    pub cloud_error: Option<RemoteError>,
}

impl SyncState {
    pub(crate) fn new(mode: Mode) -> Self {
        Self {
            active_config: None,
            origin: None,
            mode,
            last_remote_sync: None,
            last_local_save: None,
            cached_entries: Vec::new(),
            cached_updated_at: None,
            cloud_error: None,
        }
    }

    /// Timestamp matching the current mode, for display.
    pub fn reference_timestamp(&self) -> Option<DateTime<Utc>> {
        match self.mode {
            Mode::Cloud => self.last_remote_sync,
            Mode::Local | Mode::Memory => self.last_local_save,
        }
    }
}
