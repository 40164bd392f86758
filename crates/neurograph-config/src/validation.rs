// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every violation is collected so a single run reports all of them.

use std::fmt;

use crate::{ConfigError, ConfigResult, NeurographConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    InvalidValue { field: String, reason: String },
    MissingRequired { field: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValidationError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigValidationError::MissingRequired { field } => {
                write!(f, "Missing required field: '{}'", field)
            }
        }
    }
}

/// Validate a loaded configuration
pub fn validate_config(config: &NeurographConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();
    let sim = &config.simulation;

    if !(sim.dt.is_finite() && sim.dt > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.dt".to_string(),
            reason: format!("must be positive and finite, got {}", sim.dt),
        });
    }
    if !(sim.potential_bound.is_finite() && sim.potential_bound > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.potential_bound".to_string(),
            reason: format!("must be positive and finite, got {}", sim.potential_bound),
        });
    }

    let log = &config.logging;
    if log.level.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "logging.level".to_string(),
        });
    } else if !LOG_LEVELS.contains(&log.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("'{}' is not one of {}", log.level, LOG_LEVELS.join(", ")),
        });
    }
    if log.file_logging && log.log_dir.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "logging.log_dir".to_string(),
        });
    }

    if errors.is_empty() {
        return Ok(());
    }

    let details = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        details
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&NeurographConfig::default()).is_ok());
    }

    #[test]
    fn test_all_violations_are_reported() {
        let mut config = NeurographConfig::default();
        config.simulation.dt = 0.0;
        config.simulation.potential_bound = f32::INFINITY;
        config.logging.level = "verbose".to_string();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("simulation.dt"));
        assert!(message.contains("simulation.potential_bound"));
        assert!(message.contains("logging.level"));
    }

    #[test]
    fn test_file_logging_needs_directory() {
        let mut config = NeurographConfig::default();
        config.logging.file_logging = true;
        config.logging.log_dir = Default::default();
        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("logging.log_dir"));
    }
}
