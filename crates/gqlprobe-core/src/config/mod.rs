//! Configuration management for gqlprobe.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `gqlprobe.toml` file
//! 3. User config `~/.config/gqlprobe/config.toml`
//! 4. Built-in defaults (lowest priority)
//!
//! Command line flags are applied on top by the CLI.
//!
//! Environment overrides: `GQLPROBE_TARGET_URL`, `GQLPROBE_HEADERS`
//! (newline-separated `key:value` pairs), `GQLPROBE_TIMEOUT_SECS`,
//! `GQLPROBE_IGNORE` (comma-separated), `GQLPROBE_POLLING_ENABLED`,
//! `GQLPROBE_POLLING_INTERVAL` and `GQLPROBE_PORT`. A value that does not
//! parse is an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

use crate::synth::TimePolicy;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid header '{0}', expected 'key:value'")]
    InvalidHeader(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The GraphQL endpoint under test.
    pub target: TargetConfig,

    /// Crawl behaviour.
    pub crawl: CrawlConfig,

    /// Introspection depth and retry bounds.
    pub introspection: IntrospectionConfig,

    /// Placeholder value generation.
    pub synthesis: SynthesisConfig,

    /// Background schema reloading.
    pub polling: PollingConfig,

    /// Control server.
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./gqlprobe.toml` (project local)
    /// 2. `~/.config/gqlprobe/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(PROJECT_CONFIG_FILE).exists() {
            return Self::from_file(PROJECT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("GQLPROBE_TARGET_URL") {
            self.target.url = Some(url);
        }
        if let Ok(headers) = std::env::var("GQLPROBE_HEADERS") {
            for header in headers
                .split(HEADERS_ENV_SEPARATOR)
                .filter(|h| !h.trim().is_empty())
            {
                let (key, value) = parse_header(header)?;
                self.target.headers.insert(key, value);
            }
        }
        if let Some(secs) = env_parse("GQLPROBE_TIMEOUT_SECS")? {
            self.target.timeout_secs = secs;
        }

        if let Ok(ignore) = std::env::var("GQLPROBE_IGNORE") {
            self.crawl.ignore = split_list(&ignore);
        }

        if let Some(enabled) = env_parse("GQLPROBE_POLLING_ENABLED")? {
            self.polling.enabled = enabled;
        }
        if let Some(interval) = env_parse("GQLPROBE_POLLING_INTERVAL")? {
            self.polling.interval_minutes = interval;
        }

        if let Some(port) = env_parse("GQLPROBE_PORT")? {
            self.server.port = port;
        }

        Ok(())
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.target.url {
            reqwest::Url::parse(url)
                .map_err(|e| ConfigError::Invalid(format!("target url '{}': {}", url, e)))?;
        }

        if self.polling.enabled && self.polling.interval_minutes < 1 {
            return Err(ConfigError::Invalid(
                "polling interval must be at least 1 minute".to_string(),
            ));
        }

        if self.target.timeout_secs < 1 {
            return Err(ConfigError::Invalid(
                "target.timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.introspection.max_attempts < 1 {
            return Err(ConfigError::Invalid(
                "introspection.max_attempts must be at least 1".to_string(),
            ));
        }

        self.synthesis.time_policy()?;

        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Parses a `key:value` header. The value may itself contain `:`.
pub fn parse_header(header: &str) -> Result<(String, String), ConfigError> {
    let (key, value) = header
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidHeader(header.to_string()))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::InvalidHeader(header.to_string()));
    }

    Ok((key.to_string(), value.trim().to_string()))
}

/// Reads and parses an environment variable. Unset is `None`, an
/// unparsable value is an error.
fn env_parse<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("{}={:?}: {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Target endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// GraphQL endpoint URL. Required before any crawl.
    pub url: Option<String>,

    /// Static headers sent with every request.
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: None,
            headers: BTreeMap::new(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl TargetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Crawl configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Query and mutation names that are not tested.
    pub ignore: Vec<String>,

    /// Abort the crawl when a field cannot be synthesized or compiled.
    /// When false the field is recorded as skipped and the crawl continues.
    pub strict: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            strict: DEFAULT_STRICT,
        }
    }
}

/// Introspection configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrospectionConfig {
    /// `ofType` nesting depth of the first query.
    pub initial_depth: usize,

    /// Maximum queries per type before giving up.
    pub max_attempts: usize,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            initial_depth: DEFAULT_INTROSPECTION_DEPTH,
            max_attempts: DEFAULT_MAX_INTROSPECTION_ATTEMPTS,
        }
    }
}

/// Synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Value for the `Time` scalar: `"now"` or an RFC 3339 timestamp.
    pub time_value: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            time_value: DEFAULT_TIME_VALUE.to_string(),
        }
    }
}

impl SynthesisConfig {
    /// Parses `time_value`.
    pub fn time_policy(&self) -> Result<TimePolicy, ConfigError> {
        self.time_value
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("synthesis.time_value: {}", e)))
    }
}

/// Schema polling configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub enabled: bool,

    /// Minutes between reloads.
    pub interval_minutes: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: DEFAULT_POLLING_INTERVAL_MINUTES,
        }
    }
}

/// Control server configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.introspection.initial_depth, DEFAULT_INTROSPECTION_DEPTH);
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
        assert!(config.target.url.is_none());
        assert!(config.crawl.strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let mut config = Config::default();
        assert_eq!(config.target.timeout(), Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));

        config.target.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_to_toml() {
        let toml_str = Config::default_config_string();
        assert!(toml_str.contains("[crawl]"));
        assert!(toml_str.contains("[introspection]"));
        assert!(toml_str.contains("[polling]"));
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[target]
url = "http://localhost:4000/graphql"

[target.headers]
Authorization = "Bearer abc"

[crawl]
ignore = ["health"]

[polling]
enabled = true
interval_minutes = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.target.url.as_deref(), Some("http://localhost:4000/graphql"));
        assert_eq!(config.target.headers["Authorization"], "Bearer abc");
        assert_eq!(config.crawl.ignore, vec!["health"]);
        assert!(config.polling.enabled);
        assert_eq!(config.polling.interval_minutes, 5);
        assert_eq!(config.synthesis.time_value, DEFAULT_TIME_VALUE);
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Authorization: Bearer abc").unwrap(),
            ("Authorization".to_string(), "Bearer abc".to_string())
        );
        assert_eq!(
            parse_header("x-url:http://a").unwrap(),
            ("x-url".to_string(), "http://a".to_string())
        );
        assert!(matches!(parse_header("broken"), Err(ConfigError::InvalidHeader(_))));
        assert!(matches!(parse_header(":value"), Err(ConfigError::InvalidHeader(_))));
    }

    #[test]
    fn test_validate_rejects_zero_polling_interval() {
        let mut config = Config::default();
        config.polling.enabled = true;
        config.polling.interval_minutes = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.target.url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_time_value() {
        let mut config = Config::default();
        config.synthesis.time_value = "yesterday".to_string();
        assert!(config.validate().is_err());

        config.synthesis.time_value = "2019-01-01T00:00:00Z".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
    }
}
