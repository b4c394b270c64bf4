//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use crate::{AccordConfig, ConfigError, LogFormat};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON) or string
/// 3. `.env` file, loaded into the process environment
/// 4. Environment variables under the configured prefix
///
/// # Example
///
/// ```no_run
/// use accord_config::ConfigLoader;
///
/// # fn main() -> Result<(), accord_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("accord.toml")?
///     .with_dotenv()?
///     .with_env_prefix("ACCORD")
///     .load()?;
///
/// println!("calling {}", config.client.base_url);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: AccordConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = AccordConfig::default();
        self
    }

    /// Start with the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = AccordConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = AccordConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`. Sections the
    /// file omits take their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, cannot be read, has
    /// an unsupported extension, or fails to parse (including unknown fields).
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::missing(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::unreadable(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `format` (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unsupported or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use accord_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [client]
    ///     base_url = "https://api.example.com"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.client.base_url, "https://api.example.com");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Load `.env` from the current directory or its parents, if present.
    ///
    /// Variables already set in the environment are not overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if a `.env` file exists but is
    /// malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Load a specific `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if the file is missing or malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref()).map_err(|e| ConfigError::Dotenv(e.to_string()))?;
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`. With prefix
    /// `ACCORD`:
    /// - `ACCORD__CLIENT__BASE_URL=https://api.example.com`
    /// - `ACCORD__CLIENT__DEFAULT_HEADERS__X_TENANT=acme` sets `x-tenant`
    /// - `ACCORD__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> Result<AccordConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(self) -> AccordConfig {
        self.config
    }

    fn apply_env_overrides(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut matching: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(key, _)| key.starts_with(&marker))
            .collect();
        matching.sort();

        for (key, value) in matching {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_override(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let client = &mut self.config.client;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["CLIENT", "BASE_URL"] => client.base_url = value.to_string(),
            ["CLIENT", "USER_AGENT"] => client.user_agent = value.to_string(),
            ["CLIENT", "REQUEST_ID_HEADER"] => client.request_id_header = value.to_lowercase(),
            ["CLIENT", "CONNECT_TIMEOUT_MS"] => {
                client.connect_timeout_ms = value
                    .parse()
                    .map_err(|_| ConfigError::env_override(key, "expected integer"))?;
            }
            ["CLIENT", "DEFAULT_HEADERS", name] => {
                let header = name.to_lowercase().replace('_', "-");
                if value.is_empty() {
                    client.default_headers.remove(&header);
                } else {
                    client.default_headers.insert(header, value.to_string());
                }
            }

            ["LOGGING", "ENABLED"] => {
                logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_override(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_override(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<AccordConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().with_defaults().load().unwrap();
        assert_eq!(config, AccordConfig::default());
    }

    #[test]
    fn test_loader_with_development() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"client": {"base_url": "https://api.test", "default_headers": {"x-tenant": "acme"}}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.client.base_url, "https://api.test");
        assert_eq!(config.client.default_headers["x-tenant"], "acme");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let toml = r#"
            [client]
            base_url = "https://api.test"
            retries = 3
        "#;
        let err = ConfigLoader::new().with_string(toml, "toml").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let err = ConfigLoader::new().with_string("a: 1", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(f) if f == "yaml"));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ConfigLoader::new().with_file("/nonexistent/accord.toml"),
            Err(ConfigError::Missing { .. })
        ));
        assert!(ConfigLoader::new()
            .with_optional_file("/nonexistent/accord.toml")
            .is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_overrides(
                "TEST",
                vars(&[
                    ("TEST__CLIENT__BASE_URL", "https://env.test"),
                    ("TEST__CLIENT__DEFAULT_HEADERS__X_TENANT", "acme"),
                    ("TEST__LOGGING__FORMAT", "pretty"),
                    ("TEST__LOGGING__ENABLED", "off"),
                    ("TESTING__CLIENT__BASE_URL", "https://ignored.test"),
                    ("OTHER__CLIENT__BASE_URL", "https://ignored.test"),
                ]),
            )
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.client.base_url, "https://env.test");
        assert_eq!(config.client.default_headers["x-tenant"], "acme");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_env_override_parse_errors() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_var("TEST__CLIENT__CONNECT_TIMEOUT_MS", "soon", "TEST")
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvOverride { .. }));

        assert!(loader
            .apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST")
            .is_err());
    }

    #[test]
    fn test_unknown_env_keys_are_ignored() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__CLIENT__RETRIES", "3", "TEST")
            .unwrap();
        assert_eq!(loader.load_unvalidated(), AccordConfig::default());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
