//! Repository configuration via `entitystore.toml`
//!
//! A single TOML file next to the application's data. On first use a
//! commented default can be written with
//! [`EntityStoreConfig::write_default_if_missing`]; edit the file and
//! reopen the repository to change settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use entitystore_core::ValidationPolicy;

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "entitystore.toml";

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("config file '{path}': {source}")]
    Io {
        /// Offending path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this config
    #[error("failed to parse config file '{path}': {reason}")]
    Parse {
        /// Offending path
        path: String,
        /// Parser message
        reason: String,
    },

    /// A key holds an unsupported value
    #[error("invalid value for '{key}': {reason}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// What was wrong
        reason: String,
    },

    /// The config could not be serialized
    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

/// Logging section of the config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (default: `"warn"`)
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

/// Repository configuration loaded from `entitystore.toml`.
///
/// # Example
///
/// ```toml
/// # "strict" (default) or "permissive"
/// creation_policy = "strict"
///
/// # Upper bound on fetch results; omit for unbounded
/// # max_fetch_limit = 1000
///
/// [logging]
/// filter = "warn"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityStoreConfig {
    /// Creation policy: `"strict"` or `"permissive"`.
    #[serde(default = "default_creation_policy")]
    pub creation_policy: String,
    /// Upper bound applied to fetch requests issued through a repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fetch_limit: Option<usize>,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_creation_policy() -> String {
    "strict".to_string()
}

impl Default for EntityStoreConfig {
    fn default() -> Self {
        Self {
            creation_policy: default_creation_policy(),
            max_fetch_limit: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl EntityStoreConfig {
    /// Parse the creation policy string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"strict"` or `"permissive"`.
    pub fn validation_policy(&self) -> ConfigResult<ValidationPolicy> {
        match self.creation_policy.as_str() {
            "strict" => Ok(ValidationPolicy::Strict),
            "permissive" => Ok(ValidationPolicy::Permissive),
            other => Err(ConfigError::Invalid {
                key: "creation_policy",
                reason: format!("'{}', expected \"strict\" or \"permissive\"", other),
            }),
        }
    }

    /// Check every value, not just the ones read lazily.
    ///
    /// # Errors
    ///
    /// Returns the first invalid key.
    pub fn validate(&self) -> ConfigResult<()> {
        self.validation_policy()?;
        if self.max_fetch_limit == Some(0) {
            return Err(ConfigError::Invalid {
                key: "max_fetch_limit",
                reason: "must be at least 1; omit it for unbounded fetches".to_string(),
            });
        }
        EnvFilter::try_new(&self.logging.filter).map_err(|e| ConfigError::Invalid {
            key: "logging.filter",
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Entitystore configuration
#
# Creation policy: "strict" (default) or "permissive"
#   "strict"     = creation payloads must supply every non-optional property
#   "permissive" = absent properties are stored as null
creation_policy = "strict"

# Upper bound on the number of resources a fetch may return.
# A request limit of 0 (unbounded) is replaced by this cap.
# max_fetch_limit = 1000

[logging]
# Filter directive used when RUST_LOG is unset
filter = "warn"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if any
    /// value is invalid.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: EntityStoreConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        // Validate eagerly so bad values fail at load time
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> ConfigResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
