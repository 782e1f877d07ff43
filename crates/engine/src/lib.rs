//! Engine layer for entitystore
//!
//! Ties the core, the codec and a store together for applications:
//! - EntityStoreConfig: settings loaded from `entitystore.toml`
//! - Repository: JSON in, JSON out, over any Store
//! - logging: subscriber initialisation for binaries and test suites

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod logging;
pub mod repository;

pub use config::{
    ConfigError, ConfigResult, EntityStoreConfig, LoggingConfig, CONFIG_FILE_NAME,
};
pub use repository::Repository;
