// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurograph-config
//!
//! Configuration loading for neurograph simulations.
//!
//! Settings are read from `neurograph.toml` and can be overridden by
//! environment variables and then by command-line arguments:
//!
//! 1. TOML file (`NEUROGRAPH_CONFIG_PATH`, the working directory, or a parent)
//! 2. Environment variables (`NEUROGRAPH_DT`, `NEUROGRAPH_EXEC_ORDER`, ...)
//! 3. CLI arguments (`key=value` map, highest priority)
//!
//! ```no_run
//! use neurograph_config::load_config;
//!
//! let config = load_config(None, None).expect("configuration");
//! println!("dt = {}", config.simulation.dt);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod types;
pub mod validation;

#[cfg(feature = "std")]
pub mod loader;

pub use types::*;
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    load_config_or_default, CONFIG_FILE_NAME, CONFIG_PATH_ENV,
};

use thiserror::Error;

/// Errors raised while locating, parsing or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(feature = "std")]
impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
