use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::navigation::ReadingDirection;

const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "mangaview";

/// Startup configuration. Read once; the viewer never writes it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reading_direction: ReadingDirection,

    pub log_level: String,

    pub log_file: PathBuf,

    /// Directory the extraction workspace is created in (system temp dir if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_parent: Option<PathBuf>,

    /// How long transient notifications stay on screen, in milliseconds
    pub notification_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reading_direction: ReadingDirection::default(),
            log_level: "info".to_string(),
            log_file: PathBuf::from("mangaview.log"),
            workspace_parent: None,
            notification_ms: 3000,
        }
    }
}

impl Settings {
    /// Parsed log level, `Info` when the configured value is not a level name
    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from `explicit` or the default location.
///
/// A missing file yields defaults; an unreadable or malformed one is an error
/// the caller is expected to log before falling back to defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok(Settings::default()),
        },
    };
    if !path.exists() {
        return Ok(Settings::default());
    }
    load_settings_from_path(&path)
}

pub fn load_settings_from_path(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str::<Settings>(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "reading_direction: right_to_left\nlog_level: debug\n").unwrap();

        let settings = load_settings(Some(&path)).unwrap();

        assert_eq!(settings.reading_direction, ReadingDirection::RightToLeft);
        assert_eq!(settings.log_level_filter(), LevelFilter::Debug);
        assert_eq!(settings.notification_ms, 3000);
        assert_eq!(settings.log_file, PathBuf::from("mangaview.log"));
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "reading_direction: [upside_down\n").unwrap();

        let err = load_settings(Some(&path)).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let settings = Settings {
            log_level: "chatty".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.log_level_filter(), LevelFilter::Info);
    }

    #[test]
    fn workspace_parent_is_optional() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "workspace_parent: /var/tmp/mangaview\nnotification_ms: 500\n").unwrap();

        let settings = load_settings(Some(&path)).unwrap();

        assert_eq!(
            settings.workspace_parent,
            Some(PathBuf::from("/var/tmp/mangaview"))
        );
        assert_eq!(settings.notification_duration(), Duration::from_millis(500));
    }
}
