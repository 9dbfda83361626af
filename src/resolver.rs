//! Picks the remote store configuration to use.

use serde::Serialize;

use crate::models::{RawStoreConfig, StoreConfig};
use crate::storage::LocalStore;

/// Where the active store configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    /// Set at deploy time (config file or environment)
    Inline,
    /// Saved earlier into local storage
    Stored,
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigOrigin::Inline => write!(f, "inline"),
            ConfigOrigin::Stored => write!(f, "stored"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    pub config: Option<StoreConfig>,
    pub origin: Option<ConfigOrigin>,
}

/// Returns the inline configuration if it is valid, otherwise the one saved in
/// local storage, otherwise nothing.
pub fn resolve_config(inline: Option<&RawStoreConfig>, local: &LocalStore) -> ResolvedConfig {
    if let Some(config) = inline.and_then(RawStoreConfig::normalize) {
        return ResolvedConfig {
            config: Some(config),
            origin: Some(ConfigOrigin::Inline),
        };
    }
    if let Some(config) = local.read_stored_config() {
        return ResolvedConfig {
            config: Some(config),
            origin: Some(ConfigOrigin::Stored),
        };
    }
    ResolvedConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn raw(bin_id: &str) -> RawStoreConfig {
        RawStoreConfig {
            bin_id: Some(bin_id.to_string()),
            master_key: Some("key".to_string()),
            access_key: None,
        }
    }

    #[test]
    fn test_inline_wins_over_stored() {
        let temp = TempDir::new().unwrap();
        let local = LocalStore::new(temp.path());
        assert!(local.write_stored_config(&StoreConfig::new("stored-bin")));

        let resolved = resolve_config(Some(&raw("inline-bin")), &local);
        assert_eq!(resolved.config.unwrap().bin_id, "inline-bin");
        assert_eq!(resolved.origin, Some(ConfigOrigin::Inline));
    }

    #[test]
    fn test_invalid_inline_falls_back_to_stored() {
        let temp = TempDir::new().unwrap();
        let local = LocalStore::new(temp.path());
        assert!(local.write_stored_config(&StoreConfig::new("stored-bin")));

        let resolved = resolve_config(Some(&raw("   ")), &local);
        assert_eq!(resolved.config.unwrap().bin_id, "stored-bin");
        assert_eq!(resolved.origin, Some(ConfigOrigin::Stored));
    }

    #[test]
    fn test_stored_config_ignored_when_storage_unsupported() {
        let temp = TempDir::new().unwrap();
        let local = LocalStore::new(temp.path());
        assert!(local.write_stored_config(&StoreConfig::new("stored-bin")));
        std::fs::create_dir(temp.path().join(".storage-probe")).unwrap();

        let resolved = resolve_config(None, &local);
        assert_eq!(resolved, ResolvedConfig::default());
    }

    #[test]
    fn test_nothing_configured() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve_config(None, &LocalStore::new(temp.path()));
        assert_eq!(resolved, ResolvedConfig::default());

        let resolved = resolve_config(None, &LocalStore::disabled());
        assert!(resolved.config.is_none());
        assert!(resolved.origin.is_none());
    }
}
