//! Typed configuration for Accord clients.
//!
//! - TOML and JSON configuration files
//! - `.env` files via `dotenvy`
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use accord_config::ConfigLoader;
//!
//! # fn main() -> Result<(), accord_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("accord.toml")?
//!     .with_env_prefix("ACCORD")
//!     .load()?;
//!
//! println!("calling {}", config.client.base_url);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [client]
//! base_url = "https://api.example.com"
//! user_agent = "my-app/1.0"
//! request_id_header = "x-request-id"
//! connect_timeout_ms = 5000
//!
//! [client.default_headers]
//! x-tenant = "acme"
//!
//! [logging]
//! enabled = true
//! level = "info,accord_transport=debug"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `ACCORD__CLIENT__BASE_URL=https://staging.example.com`
//! - `ACCORD__CLIENT__DEFAULT_HEADERS__X_TENANT=acme`
//! - `ACCORD__LOGGING__FORMAT=pretty`

#![doc(html_root_url = "https://docs.rs/accord-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::AccordConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ClientConfig, LogFormat, LoggingConfig};
