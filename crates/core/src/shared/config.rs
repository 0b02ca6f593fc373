use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_MATCH_TOLERANCE, FAREWELL_TEMPLATE, FRAME_WAIT_MS,
    GREETING_TEMPLATE, MAX_INTERVIEW_WAIT_MS, MAX_LISTEN_MS, PROMPT_TEXT, ROSTER_FILE_NAME,
    TICK_INTERVAL_MS, TRACKER_IOU_THRESHOLD, TRACKER_MAX_LOST,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for one robot's control loop and its recognition engine.
///
/// Every field has a default, so a partial JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub tick_interval_ms: u64,
    pub frame_wait_ms: u64,
    pub tracker_max_lost: usize,
    pub tracker_iou_threshold: f64,
    /// Euclidean; matched against squared distances as its square.
    pub match_tolerance: f64,
    /// `None` waits for an answer until the subject leaves.
    pub max_listen_ms: Option<u64>,
    /// `None` lets an unresolved face wait for an interview indefinitely.
    pub max_interview_wait_ms: Option<u64>,
    pub prompt_text: String,
    pub greeting_template: String,
    pub farewell_template: String,
    pub greet_known: bool,
    pub farewell_known: bool,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            frame_wait_ms: FRAME_WAIT_MS,
            tracker_max_lost: TRACKER_MAX_LOST,
            tracker_iou_threshold: TRACKER_IOU_THRESHOLD,
            match_tolerance: DEFAULT_MATCH_TOLERANCE,
            max_listen_ms: Some(MAX_LISTEN_MS),
            max_interview_wait_ms: Some(MAX_INTERVIEW_WAIT_MS),
            prompt_text: PROMPT_TEXT.to_string(),
            greeting_template: GREETING_TEMPLATE.to_string(),
            farewell_template: FAREWELL_TEMPLATE.to_string(),
            greet_known: true,
            farewell_known: true,
        }
    }
}

impl RobotConfig {
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME))
    }

    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join(CONFIG_FILE_NAME))
    }

    pub fn default_roster_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join(ROSTER_FILE_NAME))
    }

    /// Loads from the user config directory, falling back to defaults when
    /// the file is absent or unreadable.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                log::warn!("{e}; using default settings");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker_max_lost == 0 {
            return Err(ConfigError::Invalid("tracker_max_lost must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.tracker_iou_threshold) {
            return Err(ConfigError::Invalid(
                "tracker_iou_threshold must be within 0.0-1.0".into(),
            ));
        }
        if !self.match_tolerance.is_finite() || self.match_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "match_tolerance must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn frame_wait(&self) -> Duration {
        Duration::from_millis(self.frame_wait_ms)
    }

    pub fn max_listen(&self) -> Option<Duration> {
        self.max_listen_ms.map(Duration::from_millis)
    }

    pub fn max_interview_wait(&self) -> Option<Duration> {
        self.max_interview_wait_ms.map(Duration::from_millis)
    }

    pub fn greeting_for(&self, name: &str) -> String {
        self.greeting_template.replace("{name}", name)
    }

    pub fn farewell_for(&self, name: &str) -> String {
        self.farewell_template.replace("{name}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RobotConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(10));
        assert_eq!(config.frame_wait(), Duration::from_millis(100));
        assert_eq!(config.tracker_max_lost, 3);
        assert_eq!(config.max_listen(), Some(Duration::from_secs(10)));
        assert_eq!(config.prompt_text, "Who are you?");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RobotConfig =
            serde_json::from_str(r#"{ "match_tolerance": 0.4, "greet_known": false }"#).unwrap();
        assert_eq!(config.match_tolerance, 0.4);
        assert!(!config.greet_known);
        assert_eq!(config.tracker_max_lost, TRACKER_MAX_LOST);
    }

    #[test]
    fn test_null_disables_listen_timeout() {
        let config: RobotConfig = serde_json::from_str(r#"{ "max_listen_ms": null }"#).unwrap();
        assert_eq!(config.max_listen(), None);
    }

    #[test]
    fn test_templates() {
        let config = RobotConfig::default();
        assert_eq!(config.greeting_for("Sam"), "Hello, Sam!");
        assert_eq!(config.farewell_for("Sam"), "Goodbye, Sam!");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let config = RobotConfig {
            max_interview_wait_ms: None,
            ..RobotConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(RobotConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "tracker_max_lost": 0 }"#).unwrap();
        assert!(matches!(
            RobotConfig::load_from(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RobotConfig::load_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
