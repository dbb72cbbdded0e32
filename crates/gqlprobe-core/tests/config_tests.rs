use std::io::Write;

use gqlprobe_core::config::{
    DEFAULT_INTROSPECTION_DEPTH, DEFAULT_MAX_INTROSPECTION_ATTEMPTS,
    DEFAULT_POLLING_INTERVAL_MINUTES, DEFAULT_SERVER_PORT,
};
use gqlprobe_core::{Config, ConfigError, TimePolicy};

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.introspection.initial_depth, DEFAULT_INTROSPECTION_DEPTH);
    assert_eq!(config.introspection.max_attempts, DEFAULT_MAX_INTROSPECTION_ATTEMPTS);
    assert_eq!(config.polling.interval_minutes, DEFAULT_POLLING_INTERVAL_MINUTES);
    assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
    assert!(!config.polling.enabled);
}

#[test]
fn test_default_config_string_round_trips() {
    let toml_str = Config::default_config_string();
    assert!(toml_str.contains("[crawl]"));
    assert!(toml_str.contains("[synthesis]"));
    assert!(toml_str.contains("[server]"));

    let parsed: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(parsed.server.port, DEFAULT_SERVER_PORT);
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[target]
url = "http://localhost:4000/graphql"

[target.headers]
"x-api-key" = "abc:def"

[crawl]
ignore = ["health", "version"]
strict = false

[introspection]
initial_depth = 2

[synthesis]
time_value = "2019-01-01T00:00:00Z"

[server]
port = 9090
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.target.headers["x-api-key"], "abc:def");
    assert_eq!(config.crawl.ignore, vec!["health", "version"]);
    assert!(!config.crawl.strict);
    assert_eq!(config.introspection.initial_depth, 2);
    assert_eq!(config.introspection.max_attempts, DEFAULT_MAX_INTROSPECTION_ATTEMPTS);
    assert_eq!(config.server.port, 9090);
    assert!(matches!(config.synthesis.time_policy().unwrap(), TimePolicy::Fixed(_)));
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(dir.path().join("missing.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError(_))));
}

#[test]
fn test_from_malformed_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[crawl\nignore = ").unwrap();

    let result = Config::from_file(file.path());
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}
