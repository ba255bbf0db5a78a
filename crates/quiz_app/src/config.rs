use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use quiz_client::ApiSettings;
use quiz_logging::{quiz_debug, quiz_info};
use serde::{Deserialize, Serialize};

/// Read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "lecture_quiz.ron";
pub const API_URL_ENV: &str = "LECTURE_QUIZ_API_URL";

/// Optional settings file. Every field falls back to the client defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub upload_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub retry_backoff_ms: Option<u64>,
    pub max_poll_secs: Option<u64>,
    pub max_transient_failures: Option<u32>,
}

impl AppConfig {
    /// Loads `explicit` (which must exist) or the default file if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    quiz_debug!("No {} found; using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = ron::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        quiz_info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Builds client settings. The API url is taken from `cli_url`, then
    /// `env_url`, then the file, then the default.
    pub fn api_settings(&self, env_url: Option<String>, cli_url: Option<String>) -> ApiSettings {
        let defaults = ApiSettings::default();
        let api_base_url = cli_url
            .or(env_url)
            .or_else(|| self.api_url.clone())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.api_base_url.clone());

        ApiSettings {
            api_base_url,
            request_timeout: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            upload_timeout: self
                .upload_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.upload_timeout),
            poll_interval: self
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            retry_backoff: self
                .retry_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
            max_poll_duration: self.max_poll_secs.map(Duration::from_secs),
            max_transient_failures: self.max_transient_failures,
            ..defaults
        }
    }

    /// `cli_dir`, then the file, then `./output`.
    pub fn output_dir(&self, cli_dir: Option<PathBuf>) -> PathBuf {
        cli_dir
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("output"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_fields_use_defaults() {
        let config: AppConfig = ron::from_str("(api_url: Some(\"http://backend:5000\"))").unwrap();
        let settings = config.api_settings(None, None);

        assert_eq!(settings.api_base_url, "http://backend:5000");
        assert_eq!(settings.poll_interval, Duration::from_millis(2000));
        assert_eq!(settings.retry_backoff, Duration::from_millis(1000));
        assert_eq!(settings.max_poll_duration, None);
        assert_eq!(settings.max_transient_failures, None);
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let config = AppConfig {
            api_url: Some("http://file:1".to_string()),
            ..AppConfig::default()
        };

        let from_cli = config.api_settings(
            Some("http://env:2".to_string()),
            Some("http://cli:3".to_string()),
        );
        assert_eq!(from_cli.api_base_url, "http://cli:3");

        let from_env = config.api_settings(Some("http://env:2".to_string()), None);
        assert_eq!(from_env.api_base_url, "http://env:2");

        assert_eq!(config.api_settings(None, None).api_base_url, "http://file:1");
        assert_eq!(
            AppConfig::default().api_settings(None, None).api_base_url,
            "http://localhost:5000"
        );
    }

    #[test]
    fn bounds_and_intervals_come_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("quiz.ron");
        fs::write(
            &path,
            "(poll_interval_ms: Some(500), max_poll_secs: Some(900), max_transient_failures: Some(4), output_dir: Some(\"exports\"))",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        let settings = config.api_settings(None, None);
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.max_poll_duration, Some(Duration::from_secs(900)));
        assert_eq!(settings.max_transient_failures, Some(4));
        assert_eq!(config.output_dir(None), PathBuf::from("exports"));
        assert_eq!(
            config.output_dir(Some(PathBuf::from("elsewhere"))),
            PathBuf::from("elsewhere")
        );
    }

    #[test]
    fn explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&temp.path().join("absent.ron"))).is_err());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.ron");
        fs::write(&path, "(api_url: 42)").unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }
}
