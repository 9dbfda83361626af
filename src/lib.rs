//! Mood and symptom diary with cloud, local and in-memory persistence.

pub mod models;
pub mod remote;
pub mod resolver;
pub mod storage;
pub mod sync;

pub use models::{Entry, RawStoreConfig, StoreConfig};
pub use remote::{JsonBinClient, RemoteError, RemoteStore};
pub use storage::LocalStore;
pub use sync::{DeleteOutcome, Mode, Status, SyncController, Tone};
