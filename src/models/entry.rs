use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Mood labels from worst to best. A label's score is its 1-based position.
pub const MOOD_SCALE: [&str; 5] = [
    "😣 Herausfordernd",
    "☹️ Schwankend",
    "😐 Neutral",
    "🙂 Gut",
    "😊 Sehr gut",
];

/// One diary record for a single calendar date.
///
/// Serialized with the keys existing stores already hold (`datum`, `stimmung`,
/// ...). Deserialization goes through [`Entry::from`] on a raw JSON value, so
/// every entry read from anywhere is normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Entry {
    #[serde(rename = "datum")]
    pub date: String,
    #[serde(rename = "dosierung")]
    pub dosage: String,
    #[serde(rename = "stimmung")]
    pub mood: String,
    #[serde(rename = "konz")]
    pub concentration_legacy: String,
    #[serde(rename = "konz_morgen")]
    pub concentration_morning: String,
    #[serde(rename = "konz_nachmittag")]
    pub concentration_afternoon: String,
    #[serde(rename = "vorm")]
    pub overstimulation_morning: String,
    #[serde(rename = "abend")]
    pub overstimulation_evening: String,
    #[serde(rename = "hausaufgaben")]
    pub homework_load: String,
    #[serde(rename = "appetit")]
    pub appetite: String,
    #[serde(rename = "ausbr")]
    pub had_outburst: bool,
    #[serde(rename = "kopfweh")]
    pub had_headache: bool,
    #[serde(rename = "bauchweh")]
    pub had_stomachache: bool,
    #[serde(rename = "schwindel")]
    pub had_dizziness: bool,
    #[serde(rename = "auff")]
    pub notes: String,
}

impl Entry {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = mood.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Position of the mood on [`MOOD_SCALE`] (1 to 5), `None` for free text.
    pub fn mood_score(&self) -> Option<u8> {
        let mood = self.mood.trim();
        MOOD_SCALE
            .iter()
            .position(|label| *label == mood)
            .map(|i| i as u8 + 1)
    }

    /// Labels of the side effects recorded for this day.
    pub fn side_effects(&self) -> Vec<&'static str> {
        let mut effects = Vec::new();
        if self.had_outburst {
            effects.push("outburst");
        }
        if self.had_headache {
            effects.push("headache");
        }
        if self.had_stomachache {
            effects.push("stomachache");
        }
        if self.had_dizziness {
            effects.push("dizziness");
        }
        effects
    }
}

/// Looks up a field by its stored key, falling back to its camelCase alias.
/// Absent and `null` values both count as missing.
fn field<'a>(map: &'a Map<String, Value>, key: &str, alias: &str) -> Option<&'a Value> {
    map.get(key)
        .filter(|v| !v.is_null())
        .or_else(|| map.get(alias).filter(|v| !v.is_null()))
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => Some(String::new()),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        let empty = Map::new();
        let map = value.as_object().unwrap_or(&empty);
        let get = |key: &str, alias: &str| text(field(map, key, alias));

        let legacy = get("konz", "concentrationLegacy");
        let morning = get("konz_morgen", "concentrationMorning");
        let afternoon = get("konz_nachmittag", "concentrationAfternoon");

        Self {
            date: get("datum", "date").unwrap_or_default(),
            dosage: get("dosierung", "dosage").unwrap_or_default(),
            mood: get("stimmung", "mood").unwrap_or_default(),
            concentration_legacy: legacy
                .clone()
                .or_else(|| morning.clone())
                .or_else(|| afternoon.clone())
                .unwrap_or_default(),
            concentration_morning: morning.or_else(|| legacy.clone()).unwrap_or_default(),
            concentration_afternoon: afternoon.or(legacy).unwrap_or_default(),
            overstimulation_morning: get("vorm", "overstimulationMorning").unwrap_or_default(),
            overstimulation_evening: get("abend", "overstimulationEvening").unwrap_or_default(),
            homework_load: get("hausaufgaben", "homeworkLoad").unwrap_or_default(),
            appetite: get("appetit", "appetite").unwrap_or_default(),
            had_outburst: truthy(field(map, "ausbr", "hadOutburst")),
            had_headache: truthy(field(map, "kopfweh", "hadHeadache")),
            had_stomachache: truthy(field(map, "bauchweh", "hadStomachache")),
            had_dizziness: truthy(field(map, "schwindel", "hadDizziness")),
            notes: get("auff", "notes").unwrap_or_default(),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)?;
        if !self.mood.is_empty() {
            write!(f, "  {}", self.mood)?;
        }
        if !self.dosage.is_empty() {
            write!(f, "  [{}]", self.dosage)?;
        }
        let effects = self.side_effects();
        if !effects.is_empty() {
            write!(f, "  ({})", effects.join(", "))?;
        }
        Ok(())
    }
}

/// Normalizes raw JSON values into entries, then sorts them.
pub fn normalize_entries(values: Vec<Value>) -> Vec<Entry> {
    sort_by_date(values.into_iter().map(Entry::from).collect())
}

/// Returns the collection sorted ascending by date with one entry per date.
///
/// Entries without a date are dropped. When a date appears more than once the
/// entry that came last in the input wins.
pub fn sort_by_date(entries: Vec<Entry>) -> Vec<Entry> {
    let mut by_date: HashMap<String, Entry> = HashMap::new();
    for entry in entries {
        if entry.date.is_empty() {
            continue;
        }
        by_date.insert(entry.date.clone(), entry);
    }

    let mut sorted: Vec<Entry> = by_date.into_values().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));
    sorted
}
