use chrono::{DateTime, Utc};
use serde_json::Value;

/// Parses an RFC 3339 timestamp, returning `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Like [`parse_timestamp`] but for an arbitrary JSON value.
pub fn timestamp_from_value(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value.and_then(Value::as_str).and_then(parse_timestamp)
}
