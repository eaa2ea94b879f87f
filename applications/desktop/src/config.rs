//! Host configuration
//!
//! Read from an optional TOML file, then overridden by `CADENCE_`-prefixed
//! environment variables (`CADENCE_DATABASE_URL`, `CADENCE_MUSIC_FOLDERS`
//! as a comma-separated list, `CADENCE_LOG_FILTER`).

use crate::error::{DesktopError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

/// Log filter used when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "cadence=info,cadence_playback=info,cadence_storage=info";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Folders scanned by `cadence scan` when no path is given
    #[serde(default)]
    pub music_folders: Vec<PathBuf>,

    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_database_url() -> String {
    "sqlite://cadence.db".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            music_folders: Vec::new(),
            log_filter: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = ::config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(DesktopError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(::config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(::config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            ::config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("music_folders")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Parse configuration from TOML text, without the environment layer
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = ::config::Config::builder()
            .add_source(::config::File::from_str(text, ::config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.database_url.starts_with("sqlite:") {
            return Err(DesktopError::Config(format!(
                "database_url must be a sqlite URL, got {:?}",
                self.database_url
            )));
        }

        if let Some(filter) = &self.log_filter {
            if filter.trim().is_empty() {
                return Err(DesktopError::Config("log_filter must not be empty".to_string()));
            }
        }

        if let Some(folder) = self.music_folders.iter().find(|f| f.as_os_str().is_empty()) {
            return Err(DesktopError::Config(format!(
                "music_folders contains an empty path: {:?}",
                folder
            )));
        }

        Ok(())
    }

    /// Log filter to use when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_toml() {
        let config = AppConfig::from_toml(
            r#"
            database_url = "sqlite:///var/lib/cadence/library.db"
            music_folders = ["/music", "/mnt/nas/music"]
            log_filter = "cadence=debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_url, "sqlite:///var/lib/cadence/library.db");
        assert_eq!(
            config.music_folders,
            vec![PathBuf::from("/music"), PathBuf::from("/mnt/nas/music")]
        );
        assert_eq!(config.log_filter(), "cadence=debug");
    }

    #[test]
    fn rejects_non_sqlite_database() {
        let config = AppConfig {
            database_url: "postgres://localhost/cadence".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(DesktopError::Config(_))));
    }

    #[test]
    fn rejects_blank_log_filter() {
        let config = AppConfig {
            log_filter: Some("  ".to_string()),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/definitely/missing/cadence.toml")));
        assert!(matches!(result, Err(DesktopError::Config(_))));
    }

    #[test]
    fn loads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "music_folders = [\"/srv/music\"]\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.music_folders, vec![PathBuf::from("/srv/music")]);
    }
}
