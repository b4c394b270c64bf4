//! Loading configuration from files on disk.

use accord_config::{ConfigError, ConfigLoader, LogFormat};
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

fn file_with(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file() {
    let file = file_with(
        ".toml",
        r#"
            [client]
            base_url = "https://api.example.com/v2"
            connect_timeout_ms = 2500

            [client.default_headers]
            x-tenant = "acme"

            [logging]
            level = "info,accord_transport=debug"
            format = "pretty"
        "#,
    );

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.client.base_url, "https://api.example.com/v2");
    assert_eq!(config.client.connect_timeout_ms, 2500);
    assert_eq!(config.client.default_headers["x-tenant"], "acme");
    assert_eq!(config.client.request_id_header, "x-request-id");
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_json_file() {
    let file = file_with(".json", r#"{"logging": {"enabled": false}}"#);

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert!(!config.logging.enabled);
    assert_eq!(config.client.base_url, "http://localhost:8080");
}

#[test]
fn test_invalid_base_url_fails_load() {
    let file = file_with(".toml", "[client]\nbase_url = \"api.example.com\"\n");

    let err = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "client.base_url"));
}

#[test]
fn test_unsupported_extension() {
    let file = file_with(".yaml", "client: {}\n");
    assert!(matches!(
        ConfigLoader::new().with_file(file.path()),
        Err(ConfigError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_dotenv_file_feeds_env_overrides() {
    let file = file_with(
        ".env",
        "ACCORD_LOADING_TEST__CLIENT__BASE_URL=https://dotenv.example.com\n\
         ACCORD_LOADING_TEST__LOGGING__LEVEL=warn\n",
    );

    let config = ConfigLoader::new()
        .with_dotenv_file(file.path())
        .unwrap()
        .with_env_prefix("ACCORD_LOADING_TEST")
        .load()
        .unwrap();

    assert_eq!(config.client.base_url, "https://dotenv.example.com");
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_missing_dotenv_file() {
    assert!(matches!(
        ConfigLoader::new().with_dotenv_file("/nonexistent/.env"),
        Err(ConfigError::Dotenv(_))
    ));
}
