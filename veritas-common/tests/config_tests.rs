//! Integration tests for configuration resolution and graceful degradation
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate VERITAS_CONFIG are marked with #[serial].

use serial_test::serial;
use std::env;
use std::io::Write;
use veritas_common::config::{TomlConfig, CONFIG_ENV_VAR, DEFAULT_BIND_ADDRESS};
use veritas_common::Error;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
#[serial]
fn test_env_config_file_is_loaded() {
    let file = write_config(
        r#"
[logging]
level = "debug"

[search]
endpoint = "http://localhost:9200/search"
max_sources = 3

[validators]
image = "http://localhost:8000/validate/image"

[sessions]
ttl_secs = 120
"#,
    );
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = TomlConfig::load(None).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.search.endpoint.as_deref(), Some("http://localhost:9200/search"));
    assert_eq!(config.search.max_sources, 3);
    assert_eq!(
        config.validators.image.as_deref(),
        Some("http://localhost:8000/validate/image")
    );
    assert!(config.validators.text.is_none());
    assert_eq!(config.sessions.ttl_secs, 120);
    assert_eq!(config.bind_address(), DEFAULT_BIND_ADDRESS);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_path_overrides_env() {
    let env_file = write_config("bind_address = \"127.0.0.1:1111\"\n");
    let cli_file = write_config("bind_address = \"127.0.0.1:2222\"\n");
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let config = TomlConfig::load(Some(cli_file.path())).unwrap();
    assert_eq!(config.bind_address(), "127.0.0.1:2222");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_error() {
    env::remove_var(CONFIG_ENV_VAR);

    let result = TomlConfig::load(Some(std::path::Path::new("/nonexistent/veritas.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_empty_file_yields_defaults() {
    let file = write_config("");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = TomlConfig::load(None).unwrap();
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.requests_per_second, 5);
    assert_eq!(config.fetch.max_chars, 3000);

    env::remove_var(CONFIG_ENV_VAR);
}
