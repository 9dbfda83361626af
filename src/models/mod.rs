mod entry;
mod store_config;
mod timestamp;

pub use entry::{normalize_entries, sort_by_date, Entry, MOOD_SCALE};
pub use store_config::{RawStoreConfig, StoreConfig};
pub use timestamp::{parse_timestamp, timestamp_from_value};
