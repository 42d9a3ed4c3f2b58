//! PlayerWatch Configuration
//!
//! This module defines the configuration structures with proper defaults
//! using derive macros and serde attributes for cleaner code.

use crate::error::PlayerWatchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default status endpoint; `{server}` is replaced by the server code
pub const DEFAULT_ENDPOINT_TEMPLATE: &str =
    "https://servers-frontend.fivem.net/api/servers/single/{server}";
/// Placeholder substituted in the endpoint template
pub const SERVER_PLACEHOLDER: &str = "{server}";
/// Default status fetch timeout (seconds)
pub const DEFAULT_FETCH_TIMEOUT: u64 = 10;
/// Default staleness threshold for `lastSeen` (seconds)
pub const DEFAULT_STALENESS_THRESHOLD: i64 = 300;
/// Default notification send timeout (seconds)
pub const DEFAULT_SEND_TIMEOUT: u64 = 15;
/// Default poll interval (seconds)
pub const DEFAULT_POLL_INTERVAL: u64 = 20;
/// Upper bound for the staleness threshold (one year)
pub const MAX_STALENESS_THRESHOLD: i64 = 365 * 24 * 60 * 60;
/// Upper bound for the poll interval (one day)
pub const MAX_POLL_INTERVAL: u64 = 24 * 60 * 60;

/// Environment variable holding the bot token
pub const ENV_BOT_TOKEN: &str = "DISCORD_BOT_TOKEN";
/// Environment variable overriding `server.code`
pub const ENV_SERVER_CODE: &str = "PLAYERWATCH_SERVER_CODE";
/// Environment variable overriding `discord.channel_id`
pub const ENV_CHANNEL_ID: &str = "PLAYERWATCH_CHANNEL_ID";

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

// ============================================================================
// Main Config
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Monitored game server
    #[serde(default)]
    pub server: ServerConfig,
    /// Notification channel
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Poll loop settings
    #[serde(default)]
    pub poller: PollerConfig,
}

// ============================================================================
// Server Config
// ============================================================================

/// Status source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server identifier (e.g. a FiveM join code)
    #[serde(default)]
    pub code: String,
    /// Status endpoint, containing a `{server}` placeholder
    #[serde(default = "ServerConfig::default_endpoint_template")]
    pub endpoint_template: String,
    /// HTTP timeout for one status fetch
    #[serde(default = "ServerConfig::default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
    /// Maximum age of `lastSeen` for the server to count as online
    #[serde(default = "ServerConfig::default_staleness_threshold")]
    pub staleness_threshold_seconds: i64,
}

impl ServerConfig {
    fn default_endpoint_template() -> String {
        DEFAULT_ENDPOINT_TEMPLATE.to_string()
    }
    fn default_fetch_timeout() -> u64 {
        DEFAULT_FETCH_TIMEOUT
    }
    fn default_staleness_threshold() -> i64 {
        DEFAULT_STALENESS_THRESHOLD
    }

    /// Status URL with the server code substituted
    pub fn endpoint_url(&self) -> String {
        self.endpoint_template
            .replace(SERVER_PLACEHOLDER, &urlencoding::encode(&self.code))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            code: String::new(),
            endpoint_template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
            fetch_timeout_seconds: DEFAULT_FETCH_TIMEOUT,
            staleness_threshold_seconds: DEFAULT_STALENESS_THRESHOLD,
        }
    }
}

// ============================================================================
// Discord Config
// ============================================================================

/// Notification channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token (optional, can be loaded from env)
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Target channel (snowflake or `<#id>` mention)
    #[serde(default)]
    pub channel_id: String,
    /// Upper bound on a single notification send
    #[serde(default = "DiscordConfig::default_send_timeout")]
    pub send_timeout_seconds: u64,
    /// How notifications are rendered
    #[serde(default)]
    pub style: NotifyStyle,
}

/// Notification rendering mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifyStyle {
    /// Rich embed with colored sections
    #[default]
    Embed,
    /// Plain text, for channels where the bot cannot post embeds
    Text,
}

impl DiscordConfig {
    fn default_send_timeout() -> u64 {
        DEFAULT_SEND_TIMEOUT
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_seconds)
    }

    /// Token, if one is configured and non-blank
    pub fn token(&self) -> Option<&str> {
        self.bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel_id: String::new(),
            send_timeout_seconds: DEFAULT_SEND_TIMEOUT,
            style: NotifyStyle::Embed,
        }
    }
}

// ============================================================================
// Poller Config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Fixed delay between polls
    #[serde(default = "PollerConfig::default_interval")]
    pub interval_seconds: u64,
}

impl PollerConfig {
    fn default_interval() -> u64 {
        DEFAULT_POLL_INTERVAL
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_POLL_INTERVAL,
        }
    }
}

// ============================================================================
// Config Loading and Validation
// ============================================================================

/// Configuration loader with validation
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file or default locations, then apply env overrides.
    /// Without an explicit path and without a file in the default locations,
    /// configuration comes from defaults and the environment alone.
    pub fn load(path: Option<&str>) -> Result<Config, PlayerWatchError> {
        let config_path = Self::resolve_config_path(path)?;
        Self::load_from(config_path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build a config from an optional file plus an env lookup
    pub fn load_from<F>(file: Option<&Path>, lookup: F) -> Result<Config, PlayerWatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file {
            Some(path) => Self::load_file(path)?,
            None => {
                tracing::info!("No config file found, using defaults and environment");
                Config::default()
            }
        };
        config.apply_env_overrides(lookup);
        Ok(config)
    }

    /// Parse a single config file without touching the environment
    pub fn load_file(path: &Path) -> Result<Config, PlayerWatchError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlayerWatchError::config_parse_error(format!("Failed to read: {}", e)))?;
        let config: Config = serde_yml::from_str(&content)
            .map_err(|e| PlayerWatchError::config_parse_error(format!("Failed to parse: {}", e)))?;
        Ok(config)
    }

    /// Resolve configuration file path
    fn resolve_config_path(path: Option<&str>) -> Result<Option<PathBuf>, PlayerWatchError> {
        if let Some(p) = path {
            let explicit = PathBuf::from(p);
            if !explicit.exists() {
                return Err(PlayerWatchError::config_not_found(p));
            }
            return Ok(Some(explicit));
        }

        let default_paths = [
            home_dir().join(".playerwatch/config.yaml"),
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("playerwatch.yaml"),
            PathBuf::from("./playerwatch.yaml"),
        ];

        Ok(default_paths.into_iter().find(|p| p.exists()))
    }
}

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the settings needed to fetch server status
    pub fn validate_source(config: &Config) -> Result<(), PlayerWatchError> {
        if config.server.code.trim().is_empty() {
            return Err(PlayerWatchError::config_invalid(
                "server.code",
                "Server code cannot be empty",
            ));
        }

        if !config.server.endpoint_template.contains(SERVER_PLACEHOLDER) {
            return Err(PlayerWatchError::config_invalid(
                "server.endpoint_template",
                format!("Template must contain the {} placeholder", SERVER_PLACEHOLDER),
            ));
        }

        if config.server.fetch_timeout_seconds == 0 {
            return Err(PlayerWatchError::config_invalid(
                "server.fetch_timeout_seconds",
                "Fetch timeout must be greater than zero",
            ));
        }

        let threshold = config.server.staleness_threshold_seconds;
        if !(0..=MAX_STALENESS_THRESHOLD).contains(&threshold) {
            return Err(PlayerWatchError::config_invalid(
                "server.staleness_threshold_seconds",
                format!(
                    "Threshold {} must be between 0 and {}",
                    threshold, MAX_STALENESS_THRESHOLD
                ),
            ));
        }

        Ok(())
    }

    /// Validate everything the long-running poller needs
    pub fn validate(config: &Config) -> Result<(), PlayerWatchError> {
        Self::validate_source(config)?;

        if config.discord.token().is_none() {
            return Err(PlayerWatchError::config_invalid(
                "discord.bot_token",
                format!("Bot token is not set (config or {})", ENV_BOT_TOKEN),
            ));
        }

        if config.discord.channel_id.trim().is_empty() {
            return Err(PlayerWatchError::config_invalid(
                "discord.channel_id",
                "Channel id cannot be empty",
            ));
        }

        if !(1..=MAX_POLL_INTERVAL).contains(&config.poller.interval_seconds) {
            return Err(PlayerWatchError::config_invalid(
                "poller.interval_seconds",
                format!("Poll interval must be between 1 and {}", MAX_POLL_INTERVAL),
            ));
        }

        if config.discord.send_timeout_seconds == 0 {
            return Err(PlayerWatchError::config_invalid(
                "discord.send_timeout_seconds",
                "Send timeout must be greater than zero",
            ));
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration (see [`ConfigLoader::load`])
    pub fn load(path: &Option<String>) -> Result<Self, PlayerWatchError> {
        ConfigLoader::load(path.as_deref())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), PlayerWatchError> {
        let content = serde_yml::to_string(self).map_err(|e| {
            PlayerWatchError::config_parse_error(format!("Serialization failed: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fill unset values from the environment. Non-empty env values win over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(code) = lookup(ENV_SERVER_CODE) {
            self.server.code = code;
        }
        if let Some(channel) = lookup(ENV_CHANNEL_ID) {
            self.discord.channel_id = channel;
        }
        if let Some(token) = lookup(ENV_BOT_TOKEN) {
            self.discord.bot_token = Some(token);
        }
    }

    /// SET / NOT SET summary of the required settings. Never includes the token.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        fn state(set: bool) -> String {
            (if set { "SET" } else { "NOT SET" }).to_string()
        }

        vec![
            ("server.code", state(!self.server.code.trim().is_empty())),
            ("discord.bot_token", state(self.discord.token().is_some())),
            (
                "discord.channel_id",
                state(!self.discord.channel_id.trim().is_empty()),
            ),
            ("poller.interval_seconds", self.poller.interval_seconds.to_string()),
            (
                "server.staleness_threshold_seconds",
                self.server.staleness_threshold_seconds.to_string(),
            ),
        ]
    }

    /// Generate a sample configuration
    pub fn sample() -> Self {
        Config {
            server: ServerConfig {
                code: "abc123".to_string(),
                ..ServerConfig::default()
            },
            discord: DiscordConfig {
                bot_token: None,
                channel_id: "123456789012345678".to_string(),
                send_timeout_seconds: DEFAULT_SEND_TIMEOUT,
                style: NotifyStyle::Embed,
            },
            poller: PollerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> Config {
        let mut config = Config::sample();
        config.discord.bot_token = Some("token".to_string());
        config
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = serde_yml::from_str("server:\n  code: xyz\n").expect("parse");
        assert_eq!(config.server.code, "xyz");
        assert_eq!(config.server.endpoint_template, DEFAULT_ENDPOINT_TEMPLATE);
        assert_eq!(config.server.fetch_timeout_seconds, 10);
        assert_eq!(config.server.staleness_threshold_seconds, 300);
        assert_eq!(config.poller.interval_seconds, 20);
        assert_eq!(config.discord.send_timeout_seconds, 15);
        assert!(config.discord.bot_token.is_none());
    }

    #[test]
    fn endpoint_url_substitutes_and_encodes_code() {
        let mut server = ServerConfig::default();
        server.code = "ab c".to_string();
        assert_eq!(
            server.endpoint_url(),
            "https://servers-frontend.fivem.net/api/servers/single/ab%20c"
        );
    }

    #[test]
    fn validate_accepts_sample_with_token() {
        assert!(ConfigValidator::validate(&valid_config()).is_ok());
    }

    #[test]
    fn validate_rejects_missing_token() {
        let config = Config::sample();
        assert!(ConfigValidator::validate_source(&config).is_ok());
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let mut config = valid_config();
        config.server.code = "  ".to_string();
        assert!(ConfigValidator::validate(&config).is_err());

        let mut config = valid_config();
        config.discord.channel_id = String::new();
        assert!(ConfigValidator::validate(&config).is_err());

        let mut config = valid_config();
        config.poller.interval_seconds = 0;
        assert!(ConfigValidator::validate(&config).is_err());

        let mut config = valid_config();
        config.server.endpoint_template = "https://example.com/status".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_SERVER_CODE, "fromenv"),
            (ENV_BOT_TOKEN, "secret"),
            (ENV_CHANNEL_ID, ""),
        ]);
        let mut config = Config::sample();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.code, "fromenv");
        assert_eq!(config.discord.token(), Some("secret"));
        // blank env values are ignored
        assert_eq!(config.discord.channel_id, "123456789012345678");
    }

    #[test]
    fn environment_alone_is_a_complete_config() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_SERVER_CODE, "abc123"),
            (ENV_CHANNEL_ID, "123456789012345678"),
            (ENV_BOT_TOKEN, "secret"),
        ]);
        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert!(ConfigValidator::validate(&config).is_ok());

        let loaded = ConfigLoader::load_from(None, |key| env.get(key).map(|v| v.to_string()))
            .expect("load without file");
        assert_eq!(loaded.server.code, "abc123");
        assert!(ConfigValidator::validate(&loaded).is_ok());
    }

    #[test]
    fn explicit_missing_path_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.yaml");
        let result = ConfigLoader::load(missing.to_str());
        assert!(matches!(
            result,
            Err(PlayerWatchError::Domain(crate::error::DomainError::ConfigNotFound { .. }))
        ));
    }

    #[test]
    fn staleness_threshold_must_be_in_range() {
        let mut config = valid_config();
        config.server.staleness_threshold_seconds = -1;
        assert!(ConfigValidator::validate_source(&config).is_err());

        config.server.staleness_threshold_seconds = i64::MAX;
        assert!(ConfigValidator::validate_source(&config).is_err());

        config.server.staleness_threshold_seconds = MAX_STALENESS_THRESHOLD;
        assert!(ConfigValidator::validate_source(&config).is_ok());

        config.server.staleness_threshold_seconds = 0;
        assert!(ConfigValidator::validate_source(&config).is_ok());
    }

    #[test]
    fn poll_interval_has_upper_bound() {
        let mut config = valid_config();
        config.poller.interval_seconds = u64::MAX;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn style_parses_lowercase() {
        let config: Config =
            serde_yml::from_str("discord:\n  style: text\n").expect("parse");
        assert_eq!(config.discord.style, NotifyStyle::Text);
        assert_eq!(Config::default().discord.style, NotifyStyle::Embed);
    }

    #[test]
    fn summary_never_contains_token() {
        let config = valid_config();
        let summary = config.summary();
        assert!(summary.iter().all(|(_, v)| !v.contains("token")));
        assert!(summary.contains(&("discord.bot_token", "SET".to_string())));
    }

    #[test]
    fn save_then_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("playerwatch.yaml");
        let config = Config::sample();
        config.save(&path).expect("save");

        let loaded = ConfigLoader::load_file(&path).expect("load");
        assert_eq!(loaded.server.code, config.server.code);
        assert_eq!(loaded.discord.channel_id, config.discord.channel_id);
        assert_eq!(loaded.poller.interval_seconds, config.poller.interval_seconds);
    }

    #[test]
    fn load_file_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "server: [not, a, map").expect("write");
        assert!(ConfigLoader::load_file(&path).is_err());
    }
}
