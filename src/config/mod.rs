// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::{DEFAULT_ROOT_DIR, DEFAULT_STALE_AFTER_SECS, DEFAULT_SYNC_WRITES};

/// Store configuration
///
/// ```yaml
/// root_dir: ${CACHE_HOME}/persister
/// sync_writes: true
/// stale_after_seconds: 3600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Storage root, created on first use (default: /var/cache/fs-persister)
    #[serde(default = "default_root_dir")]
    pub root_dir: String,

    /// fsync staged content and parent directories (default: true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// Age after which an entry reports as stale (default: 86400)
    #[serde(default = "default_stale_after_seconds")]
    pub stale_after_seconds: u64,
}

fn default_root_dir() -> String {
    DEFAULT_ROOT_DIR.to_string()
}

fn default_sync_writes() -> bool {
    DEFAULT_SYNC_WRITES
}

fn default_stale_after_seconds() -> u64 {
    DEFAULT_STALE_AFTER_SECS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            sync_writes: default_sync_writes(),
            stale_after_seconds: default_stale_after_seconds(),
        }
    }
}

impl StoreConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_seconds)
    }

    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        let config: StoreConfig = serde_yaml::from_str(&substituted).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.root_dir.trim().is_empty() {
            return Err("root_dir cannot be empty".to_string());
        }
        if self.root_dir.contains('\0') {
            return Err("root_dir cannot contain NUL bytes".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.root_dir, "/var/cache/fs-persister");
        assert!(config.sync_writes);
        assert_eq!(config.stale_after_seconds, 86400);
        assert_eq!(config.stale_after(), Duration::from_secs(86400));
    }

    #[test]
    fn test_can_parse_empty_yaml_with_defaults() {
        let config = StoreConfig::from_yaml_with_env("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_can_parse_full_config() {
        let yaml = r#"
root_dir: /tmp/store
sync_writes: false
stale_after_seconds: 60
"#;
        let config = StoreConfig::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.root_dir, "/tmp/store");
        assert!(!config.sync_writes);
        assert_eq!(config.stale_after_seconds, 60);
    }

    #[test]
    fn test_can_substitute_env_var_in_root_dir() {
        std::env::set_var("FS_PERSISTER_TEST_ROOT", "/tmp/from-env");
        let yaml = r#"
root_dir: ${FS_PERSISTER_TEST_ROOT}/store
"#;
        let config = StoreConfig::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.root_dir, "/tmp/from-env/store");
        std::env::remove_var("FS_PERSISTER_TEST_ROOT");
    }

    #[test]
    fn test_rejects_unset_env_var() {
        let yaml = r#"
root_dir: ${FS_PERSISTER_TEST_DEFINITELY_UNSET}
"#;
        let err = StoreConfig::from_yaml_with_env(yaml).unwrap_err();
        assert!(err.contains("FS_PERSISTER_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_rejects_empty_root_dir() {
        let err = StoreConfig::from_yaml_with_env("root_dir: ''").unwrap_err();
        assert!(err.contains("root_dir cannot be empty"));
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("store.yaml");
        std::fs::write(&path, "root_dir: /srv/cache\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.root_dir, "/srv/cache");
    }

    #[test]
    fn test_from_file_missing_is_error() {
        let err = StoreConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(err.contains("Failed to read config file"));
    }
}
