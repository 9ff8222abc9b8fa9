//! Daemon configuration
//!
//! Read from `--config <path>` or `~/.config/schemasync/config.yaml`. A
//! missing default file means built-in defaults.

use schemasync_engine::EngineConfig;
use schemasync_repo::RepositoryOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub repository: RepositoryOptions,
    pub kubernetes: KubernetesOptions,
    pub sync: EngineConfig,
    pub logging: LoggingOptions,
    /// Publish filesystem changes of the repository as update events
    pub watch: WatchOption,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubernetesOptions {
    /// Kubeconfig context; the current context when unset
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingOptions {
    pub level: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchOption(pub bool);

impl Default for WatchOption {
    fn default() -> Self {
        Self(true)
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::config_with_help(
                format!("cannot read {}: {}", path.display(), e),
                "pass an existing file with --config",
            )
        })?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| CliError::config(format!("{}: {}", path.display(), e)))?;
        config.engine_config().validate()?;
        Ok(config)
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::config("Could not determine config directory"))?;
        Ok(config_dir.join("schemasync").join("config.yaml"))
    }

    /// Engine settings; the repository's default branch takes precedence
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_branch: self.repository.default_branch.clone(),
            ..self.sync.clone()
        }
    }

    pub fn watch_enabled(&self) -> bool {
        self.watch.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.repository.default_branch, "master");
        assert_eq!(config.sync.worker_count, 3);
        assert_eq!(config.logging.level, "info");
        assert!(config.watch_enabled());
        assert_eq!(config.kubernetes.context, None);
    }

    #[test]
    fn test_load_full_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
repository:
  path: /srv/schemas
  defaultBranch: main
kubernetes:
  context: staging
sync:
  syncParallelism: 5
  workerCount: 2
  pollInterval: 500ms
logging:
  level: debug
watch: false
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.repository.path, PathBuf::from("/srv/schemas"));
        assert_eq!(config.kubernetes.context.as_deref(), Some("staging"));
        assert_eq!(config.logging.level, "debug");
        assert!(!config.watch_enabled());

        let engine = config.engine_config();
        assert_eq!(engine.default_branch, "main");
        assert_eq!(engine.sync_parallelism, 5);
        assert_eq!(engine.worker_count, 2);
        assert_eq!(engine.poll_interval, Duration::from_millis(500));
        assert_eq!(engine.idle_backoff, Duration::from_secs(1));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "sync:\n  workerCount: 0\n").unwrap();

        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.yaml"))).is_err());
    }
}
