//! Layered configuration: periscope.toml → environment → CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! api_url = "https://platform.example.dev"
//! api_token = "pst_..."
//!
//! [poll]
//! deploy_active_secs = 2
//! deploy_settled_secs = 5
//! chat_secs = 3
//! stage_secs = 5
//! ```

use crate::errors::ConfigError;
use crate::poll::PollPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_API_URL: &str = "PERISCOPE_API_URL";
pub const ENV_API_TOKEN: &str = "PERISCOPE_API_TOKEN";

/// On-disk configuration, all fields optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub poll: PollSettings,
}

/// Poll cadence overrides, in whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    #[serde(default)]
    pub deploy_active_secs: Option<u64>,
    #[serde(default)]
    pub deploy_settled_secs: Option<u64>,
    #[serde(default)]
    pub chat_secs: Option<u64>,
    #[serde(default)]
    pub stage_secs: Option<u64>,
}

impl PollSettings {
    /// Apply overrides on top of the default policy.
    pub fn to_policy(&self) -> PollPolicy {
        let defaults = PollPolicy::default();
        PollPolicy {
            deploy_active: self
                .deploy_active_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.deploy_active),
            deploy_settled: self
                .deploy_settled_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.deploy_settled),
            chat: self
                .chat_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.chat),
            stage: self
                .stage_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.stage),
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub policy: PollPolicy,
}

impl Config {
    /// Load configuration with CLI > environment > file precedence.
    ///
    /// An explicit `--config` path must exist; the default path is only
    /// read when present.
    pub fn load(config_path: Option<&Path>, cli_api_url: Option<String>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = match config_path {
            Some(path) => FileConfig::load(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => FileConfig::load(&path)?,
                _ => FileConfig::default(),
            },
        };

        Self::resolve(file, cli_api_url)
    }

    fn resolve(file: FileConfig, cli_api_url: Option<String>) -> Result<Self, ConfigError> {
        let api_url = cli_api_url
            .or_else(|| std::env::var(ENV_API_URL).ok().filter(|v| !v.is_empty()))
            .or(file.api_url)
            .ok_or(ConfigError::MissingApiUrl)?;

        let api_token = std::env::var(ENV_API_TOKEN)
            .ok()
            .filter(|v| !v.is_empty())
            .or(file.api_token);

        Ok(Self {
            api_url,
            api_token,
            policy: file.poll.to_policy(),
        })
    }
}

/// `~/.config/periscope/periscope.toml` (platform equivalent).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("periscope").join("periscope.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_config_parses_full_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("periscope.toml");
        fs::write(
            &path,
            r#"
api_url = "https://platform.example.dev"
api_token = "pst_abc"

[poll]
deploy_active_secs = 1
stage_secs = 10
"#,
        )
        .unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.api_url.as_deref(), Some("https://platform.example.dev"));
        assert_eq!(config.api_token.as_deref(), Some("pst_abc"));

        let policy = config.poll.to_policy();
        assert_eq!(policy.deploy_active, Duration::from_secs(1));
        assert_eq!(policy.stage, Duration::from_secs(10));
        // Unset fields keep their defaults.
        assert_eq!(policy.deploy_settled, Duration::from_secs(5));
        assert_eq!(policy.chat, Duration::from_secs(3));
    }

    #[test]
    fn test_file_config_load_missing_file() {
        let result = FileConfig::load(Path::new("/nonexistent/periscope.toml"));
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }

    #[test]
    fn test_file_config_load_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("periscope.toml");
        fs::write(&path, "api_url = [not toml").unwrap();

        let result = FileConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
    }

    #[test]
    fn test_cli_url_wins_over_file() {
        let file = FileConfig {
            api_url: Some("https://from-file.example".to_string()),
            ..FileConfig::default()
        };
        let config =
            Config::resolve(file, Some("https://from-cli.example".to_string())).unwrap();
        assert_eq!(config.api_url, "https://from-cli.example");
    }

    #[test]
    fn test_missing_api_url_is_an_error() {
        let result = Config::resolve(FileConfig::default(), None);
        assert!(matches!(result, Err(ConfigError::MissingApiUrl)));
    }

    #[test]
    fn test_empty_poll_settings_use_default_policy() {
        assert_eq!(PollSettings::default().to_policy(), PollPolicy::default());
    }
}
