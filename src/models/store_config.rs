use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Remote store configuration as found in a config file, an environment
/// or local storage. Nothing is validated yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStoreConfig {
    #[serde(default, alias = "bin_id", deserialize_with = "lenient_string")]
    pub bin_id: Option<String>,
    #[serde(default, alias = "master_key", deserialize_with = "lenient_string")]
    pub master_key: Option<String>,
    #[serde(default, alias = "access_key", deserialize_with = "lenient_string")]
    pub access_key: Option<String>,
}

/// Non-string values are kept as absent instead of failing the whole config.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// A usable remote store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub bin_id: String,
    pub master_key: String,
    pub access_key: String,
}

impl StoreConfig {
    pub fn new(bin_id: impl Into<String>) -> Self {
        Self {
            bin_id: bin_id.into(),
            master_key: String::new(),
            access_key: String::new(),
        }
    }

    pub fn with_master_key(mut self, key: impl Into<String>) -> Self {
        self.master_key = key.into();
        self
    }

    pub fn with_access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = key.into();
        self
    }

    /// Returns the master key with everything but the last four characters hidden.
    pub fn masked_master_key(&self) -> String {
        mask(&self.master_key)
    }

    pub fn masked_access_key(&self) -> String {
        mask(&self.access_key)
    }
}

fn mask(key: &str) -> String {
    let count = key.chars().count();
    if count == 0 {
        return "(none)".to_string();
    }
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

impl RawStoreConfig {
    /// Returns `None` unless a non-blank bin id is present. Everything is trimmed.
    pub fn normalize(&self) -> Option<StoreConfig> {
        let bin_id = self.bin_id.as_deref().map(str::trim).unwrap_or_default();
        if bin_id.is_empty() {
            return None;
        }
        let trimmed = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();

        Some(StoreConfig {
            bin_id: bin_id.to_string(),
            master_key: trimmed(&self.master_key),
            access_key: trimmed(&self.access_key),
        })
    }

    /// True when no field is set at all.
    pub fn is_empty(&self) -> bool {
        self.bin_id.is_none() && self.master_key.is_none() && self.access_key.is_none()
    }
}

impl From<&StoreConfig> for RawStoreConfig {
    fn from(config: &StoreConfig) -> Self {
        Self {
            bin_id: Some(config.bin_id.clone()),
            master_key: Some(config.master_key.clone()),
            access_key: Some(config.access_key.clone()),
        }
    }
}
