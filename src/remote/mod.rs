//! Remote JSON document store.
//!
//! The store keeps the whole diary as one document:
//! ```text
//! GET  {endpoint}/{bin_id}/latest  -> { "record": { "entries": [...] }, "metadata": {...} }
//! PUT  {endpoint}/{bin_id}         <- { "entries": [...], "updatedAt": "..." }
//! ```
//! Writes replace the document, so pushing the same entries twice leaves the
//! same stored state.

mod client;
mod error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Entry, StoreConfig};

pub use client::{JsonBinClient, DEFAULT_ENDPOINT};
pub use error::RemoteError;

/// Entries as returned by the remote store, with the store's modification time.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    pub entries: Vec<Entry>,
    pub updated_at: DateTime<Utc>,
}

/// A remote document store holding the diary.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Human-readable backend name (e.g., "jsonbin").
    fn backend_name(&self) -> &str;

    /// Reads the latest version of the document.
    async fn fetch_entries(&self, config: &StoreConfig) -> Result<RemoteSnapshot, RemoteError>;

    /// Replaces the document with `entries`.
    async fn push_entries(
        &self,
        config: &StoreConfig,
        entries: &[Entry],
    ) -> Result<RemoteSnapshot, RemoteError>;
}
