use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use mood_diary::remote::DEFAULT_ENDPOINT;
use mood_diary::{LocalStore, RawStoreConfig};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the local diary files
    pub data_dir: ConfigValue<PathBuf>,
    /// Base URL of the remote document store
    pub endpoint: ConfigValue<String>,
    /// Set to false to keep entries in memory only
    pub local_storage: ConfigValue<bool>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Inline store configuration; keys are never serialized
    #[serde(skip)]
    pub store: Option<RawStoreConfig>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    endpoint: Option<String>,
    local_storage: Option<bool>,
    store: Option<RawStoreConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut endpoint = ConfigValue::new(DEFAULT_ENDPOINT.to_string(), ConfigSource::Default);
        let mut local_storage = ConfigValue::new(true, ConfigSource::Default);
        let mut config_file = None;
        let mut store: Option<RawStoreConfig> = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Relative paths are relative to the config file
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(url) = file_config.endpoint {
                endpoint = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(enabled) = file_config.local_storage {
                local_storage = ConfigValue::new(enabled, ConfigSource::File);
            }
            store = file_config.store;
        }

        if let Ok(dir) = std::env::var("DIARY_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("DIARY_STORE_ENDPOINT") {
            endpoint = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(value) = std::env::var("DIARY_LOCAL_STORAGE") {
            let enabled = parse_flag(&value).ok_or(ConfigError::InvalidValue(
                "DIARY_LOCAL_STORAGE".to_string(),
                value,
            ))?;
            local_storage = ConfigValue::new(enabled, ConfigSource::Environment);
        }

        let env_store = RawStoreConfig {
            bin_id: std::env::var("DIARY_BIN_ID").ok(),
            master_key: std::env::var("DIARY_MASTER_KEY").ok(),
            access_key: std::env::var("DIARY_ACCESS_KEY").ok(),
        };
        if !env_store.is_empty() {
            let mut merged = store.unwrap_or_default();
            if env_store.bin_id.is_some() {
                merged.bin_id = env_store.bin_id;
            }
            if env_store.master_key.is_some() {
                merged.master_key = env_store.master_key;
            }
            if env_store.access_key.is_some() {
                merged.access_key = env_store.access_key;
            }
            store = Some(merged);
        }

        Ok(Self {
            data_dir,
            endpoint,
            local_storage,
            config_file,
            store,
        })
    }

    /// Local storage as configured; disabled when `local_storage` is false.
    pub fn local_store(&self) -> LocalStore {
        if self.local_storage.value {
            LocalStore::new(self.data_dir.value.clone())
        } else {
            LocalStore::disabled()
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/mood-diary/
    /// - macOS: ~/Library/Application Support/mood-diary/
    /// - Windows: %APPDATA%/mood-diary/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mood-diary")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/mood-diary/
    /// - macOS: ~/Library/Application Support/mood-diary/
    /// - Windows: %APPDATA%/mood-diary/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mood-diary")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
            ConfigError::InvalidValue(..) => None,
        }
    }
}
