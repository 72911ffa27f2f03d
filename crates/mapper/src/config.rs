//! Mapper configuration via `keyline.toml`
//!
//! Every key is optional; a missing key takes its default. A default file
//! with comments can be written next to an application with
//! [`MapperConfig::write_default_if_missing`].

use crate::ddl::KeyspaceOptions;
use crate::retry::RetryConfig;
use keyline_model::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name looked up by applications.
pub const CONFIG_FILE_NAME: &str = "keyline.toml";

/// Mapper configuration loaded from `keyline.toml`.
///
/// # Example
///
/// ```toml
/// keyspace = "events"
/// timeout_ms = 10000
///
/// [retry]
/// max_retries = 5
///
/// [keyspace_options]
/// durable_writes = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapperConfig {
    /// Keyspace applied to table schemas that declare none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyspace: Option<String>,
    /// Default execute timeout in milliseconds (default: 30000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Backoff for [`RetryingClient`](crate::RetryingClient)
    #[serde(default)]
    pub retry: RetryConfig,
    /// Options for `CREATE KEYSPACE`
    #[serde(default)]
    pub keyspace_options: KeyspaceOptions,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            keyspace: None,
            timeout_ms: default_timeout_ms(),
            retry: RetryConfig::default(),
            keyspace_options: KeyspaceOptions::default(),
        }
    }
}

impl MapperConfig {
    /// Default execute timeout; zero means none
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# keyline mapper configuration
#
# Keyspace for tables that do not declare one.
# keyspace = "my_keyspace"

# Default request timeout in milliseconds (0 = driver default).
timeout_ms = 30000

# Backoff used when a store client is wrapped in RetryingClient.
[retry]
max_retries = 3
base_delay_ms = 10
max_delay_ms = 100

# CREATE KEYSPACE options.
[keyspace_options]
replication = "{'class': 'SimpleStrategy', 'replication_factor': '1'}"
durable_writes = true
if_not_exists = false
"#
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
