//! Status lines shown to the user after each controller operation.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use super::state::Mode;
use crate::models::Entry;

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tone::Success => write!(f, "success"),
            Tone::Info => write!(f, "info"),
            Tone::Warning => write!(f, "warning"),
            Tone::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub message: String,
    pub tone: Tone,
}

impl Status {
    pub fn new(message: impl Into<String>, tone: Tone) -> Self {
        Self {
            message: message.into(),
            tone,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// One-line description of a collection, e.g.
/// `3 entries (2024-01-01 to 2024-01-03) · as of 03.01.24, 20:15`.
pub fn build_history_summary(entries: &[Entry], updated_at: Option<DateTime<Utc>>) -> String {
    let (first, last) = match (entries.first(), entries.last()) {
        (Some(first), Some(last)) => (first.date.as_str(), last.date.as_str()),
        _ => return "No entries yet".to_string(),
    };

    let range = if first.is_empty() || last.is_empty() {
        String::new()
    } else if first == last {
        first.to_string()
    } else {
        format!("{} to {}", first, last)
    };

    let count = match entries.len() {
        1 => "1 entry".to_string(),
        n => format!("{} entries", n),
    };
    let base = if range.is_empty() {
        count
    } else {
        format!("{} ({})", count, range)
    };

    match updated_at {
        Some(ts) => format!(
            "{} · as of {}",
            base,
            ts.with_timezone(&Local).format("%d.%m.%y, %H:%M")
        ),
        None => base,
    }
}

/// Status line describing the mode and the current collection.
pub fn mode_status_message(mode: Mode, entries: &[Entry], updated_at: Option<DateTime<Utc>>) -> String {
    let label = match mode {
        Mode::Cloud => "Cloud sync active",
        Mode::Local => "Offline mode",
        Mode::Memory => "Temporary mode",
    };
    if entries.is_empty() {
        format!("{}. No entries yet.", label)
    } else {
        format!("{} - {}", label, build_history_summary(entries, updated_at))
    }
}

/// Tone used when the controller is not in cloud mode.
pub(crate) fn fallback_tone(storage_available: bool) -> Tone {
    if storage_available {
        Tone::Warning
    } else {
        Tone::Error
    }
}
