//! Cloud/local/memory synchronization of the diary.
//!
//! [`SyncController`] owns the sync state for a session and decides on every
//! operation whether the remote store, local storage or the in-session cache
//! holds the authoritative collection.

mod controller;
mod state;
mod status;

pub use controller::{DeleteOutcome, LoadResult, SyncController, SyncError};
pub use state::{Mode, Source, SyncState};
pub use status::{build_history_summary, mode_status_message, Status, Tone};
