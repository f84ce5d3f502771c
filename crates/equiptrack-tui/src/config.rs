//! Configuration file handling.
//!
//! Reads from `~/.config/equiptrack/equiptrack.toml`

use anyhow::{Context, Result};
use equiptrack_core::{BackendKind, MalformedPolicy, MaterialPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where records are persisted.
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// CSV file used by the file backend.
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    /// SQLite file used by the database backend.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Whether unreadable rows are skipped or abort the load.
    #[serde(default)]
    pub malformed_rows: MalformedPolicy,
    /// Renewal interval per material, read from the top-level
    /// `default_interval_months` and `[materials]` keys.
    #[serde(flatten)]
    pub policy: MaterialPolicy,
    /// Login pair checked before the record view opens.
    #[serde(default)]
    pub credentials: Credentials,
}

/// Fixed username/password pair for the login screen.
///
/// A plain comparison that only gates the UI; it protects nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "1234".to_string(),
        }
    }
}

impl Credentials {
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

fn default_backend() -> BackendKind {
    BackendKind::File
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("safety_data.csv")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("safety.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            csv_path: default_csv_path(),
            database_path: default_database_path(),
            malformed_rows: MalformedPolicy::default(),
            policy: MaterialPolicy::default(),
            credentials: Credentials::default(),
        }
    }
}

impl Config {
    /// Load configuration from the config file.
    ///
    /// If `custom_path` is provided, load from that path.
    /// Otherwise, load from the default XDG config location.
    /// Creates a default config file if it doesn't exist (only for default path).
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self> {
        let is_custom = custom_path.is_some();
        let config_path = match custom_path {
            Some(path) => path,
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            if !is_custom {
                let config = Config::default();
                config.save_to(&config_path)?;
                tracing::info!("Created default config at {}", config_path.display());
                return Ok(config);
            } else {
                anyhow::bail!("Config file not found: {}", config_path.display());
            }
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        tracing::info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Get the path to the config file.
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("equiptrack").join("equiptrack.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_file_gets_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("equiptrack.toml");
        std::fs::write(
            &path,
            r#"
backend = "database"
malformed_rows = "fail"

default_interval_months = 3

[materials]
"Hard Hat" = 4
Gloves = 2

[credentials]
username = "chief"
password = "s3cret"
"#,
        )
        .unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.backend, BackendKind::Database);
        assert_eq!(config.malformed_rows, MalformedPolicy::Fail);
        assert_eq!(config.csv_path, PathBuf::from("safety_data.csv"));
        assert_eq!(config.policy.interval_months("Hard Hat"), 4);
        assert_eq!(config.policy.interval_months("Gloves"), 2);
        assert_eq!(config.policy.interval_months("Safety Shoes"), 7);
        assert_eq!(config.policy.interval_months("Eye Wear"), 1);
        assert_eq!(config.policy.interval_months("Unknown"), 3);
        assert!(config.credentials.authenticate("chief", "s3cret"));
        assert!(!config.credentials.authenticate("admin", "1234"));
    }

    #[test]
    fn policy_keys_live_at_the_top_level() {
        let config: Config = toml::from_str("default_interval_months = 9").unwrap();
        assert_eq!(config.policy.interval_months("Gloves"), 9);
        assert_eq!(
            config.policy,
            MaterialPolicy {
                default_interval_months: 9,
                ..MaterialPolicy::default()
            }
        );

        let written = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(written.contains("default_interval_months = 6"));
        assert!(written.contains("[materials]"));
        assert!(!written.contains("[policy"));
    }

    #[test]
    fn missing_custom_path_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(Config::load(Some(dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("equiptrack.toml");
        Config::default().save_to(&path).unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.policy, MaterialPolicy::default());
        assert!(config.credentials.authenticate("admin", "1234"));
    }
}
